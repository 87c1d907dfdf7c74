use crate::artifact::Artifact;
use crate::exclusion::Exclusion;

/// Maven-style dependency scope. Free-form in the source POM but validated
/// against this finite set on parse.
///
/// Declaration order doubles as the narrowest-wins precedence used by the
/// graph transformer's scope selector: `Compile < Runtime < Provided < Test
/// < System`, so [`Ord::min`] over a conflict group's scopes always yields
/// the correct narrowest-wins result without a separate lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    Compile,
    Runtime,
    Provided,
    Test,
    System,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Provided => "provided",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "compile" => Some(Scope::Compile),
            "provided" => Some(Scope::Provided),
            "runtime" => Some(Scope::Runtime),
            "test" => Some(Scope::Test),
            "system" => Some(Scope::System),
            "" => Some(Scope::Compile),
            _ => None,
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Compile
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An [`Artifact`] plus scope, optionality, and exclusions. Immutable; every
/// `with_*` method returns a new value rather than mutating in place, matching
/// the graph's requirement that Dependencies be freely shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub artifact: Artifact,
    pub scope: Scope,
    pub optional: bool,
    pub exclusions: Vec<Exclusion>,
}

impl Dependency {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            scope: Scope::Compile,
            optional: false,
            exclusions: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_exclusions(mut self, exclusions: Vec<Exclusion>) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifact = artifact;
        self
    }

    /// Whether `candidate` is excluded by any of this dependency's exclusions.
    pub fn excludes(&self, candidate: &Artifact) -> bool {
        self.exclusions.iter().any(|e| e.matches(candidate))
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.artifact, self.scope)?;
        if self.optional {
            write!(f, " optional")?;
        }
        Ok(())
    }
}
