use std::collections::BTreeMap;
use std::path::PathBuf;

/// A resolvable coordinate: `(groupId, artifactId, classifier, extension)`
/// identity plus a concrete `version`.
///
/// `base_version` differs from `version` only for timestamped snapshots
/// (e.g. `version = "1.0-20240102.030405-6"`, `base_version = "1.0-SNAPSHOT"`).
/// Equality and hashing are on identity + version; [`Artifact::versionless_id`]
/// omits version for conflict grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: String,
    pub extension: String,
    pub version: String,
    pub base_version: String,
    pub properties: BTreeMap<String, String>,
    pub local_path: Option<PathBuf>,
}

impl Artifact {
    /// Build an artifact with the default `jar` extension and no classifier.
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            classifier: String::new(),
            extension: "jar".to_string(),
            base_version: version.clone(),
            version,
            properties: BTreeMap::new(),
            local_path: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.base_version = version.clone();
        self.version = version;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_local_path(mut self, path: PathBuf) -> Self {
        self.local_path = Some(path);
        self
    }

    /// Whether this is a snapshot artifact (`baseVersion` ends in `-SNAPSHOT`
    /// or `version` carries a timestamped snapshot suffix).
    pub fn is_snapshot(&self) -> bool {
        self.base_version.ends_with("-SNAPSHOT") || self.version != self.base_version
    }

    /// Identity without version, used to group conflicting candidates.
    pub fn versionless_id(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.group_id, self.artifact_id, self.extension, self.classifier
        )
    }

    /// Full coordinate string including version, Maven `G:A:E:C:V` order
    /// collapsed to the common `group:artifact:version` form when classifier
    /// and extension are default.
    pub fn coordinate(&self) -> String {
        if self.classifier.is_empty() && self.extension == "jar" {
            format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
        } else {
            format!(
                "{}:{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.extension, self.classifier, self.version
            )
        }
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.coordinate())
    }
}
