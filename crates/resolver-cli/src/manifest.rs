//! `Resolver.toml` manifest format: a minimal stand-in for a real build
//! manifest's dependency section, just enough to drive `collect` ->
//! transform -> `resolve` end to end for manual testing.
//!
//! Grounded on `kargo-core::config::GlobalConfig`'s `#[serde(default)]`
//! TOML-struct style, scaled down to the handful of fields a demo needs
//! instead of a real build manifest's full surface.

use std::path::Path;

use serde::Deserialize;

use resolver_model::artifact::Artifact;
use resolver_model::dependency::{Dependency, Scope};
use resolver_model::repository::RemoteRepository;
use resolver_util::errors::{ErrorKind, ResolverError};

#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub package: PackageSection,
    #[serde(default)]
    pub dependencies: Vec<ManifestDependency>,
    #[serde(default)]
    pub dependency_management: Vec<ManifestDependency>,
    #[serde(default)]
    pub repositories: Vec<ManifestRepository>,
}

#[derive(Debug, Deserialize)]
pub struct PackageSection {
    pub group: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct ManifestDependency {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Deserialize)]
pub struct ManifestRepository {
    pub id: String,
    pub url: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ResolverError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            ResolverError::kinded(ErrorKind::DescriptorInvalid, format!("failed to parse manifest {}: {e}", path.display()))
        })
    }

    pub fn root_artifact(&self) -> Artifact {
        Artifact::new(&self.package.group, &self.package.name, &self.package.version)
    }

    pub fn direct_dependencies(&self) -> Vec<Dependency> {
        self.dependencies.iter().map(ManifestDependency::to_dependency).collect()
    }

    pub fn managed_dependencies(&self) -> Vec<Dependency> {
        self.dependency_management.iter().map(ManifestDependency::to_dependency).collect()
    }

    pub fn repositories(&self) -> Vec<RemoteRepository> {
        if self.repositories.is_empty() {
            return vec![RemoteRepository::maven_central()];
        }
        self.repositories
            .iter()
            .map(|r| RemoteRepository::new(r.id.clone(), r.url.clone()))
            .collect()
    }
}

impl ManifestDependency {
    fn to_dependency(&self) -> Dependency {
        let scope = self.scope.as_deref().and_then(Scope::parse).unwrap_or_default();
        Dependency::new(Artifact::new(&self.group, &self.name, &self.version))
            .with_scope(scope)
            .with_optional(self.optional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_manifest() {
        let toml = r#"
            [package]
            group = "org.example"
            name = "demo"
            version = "1.0"

            [[dependencies]]
            group = "org.other"
            name = "lib"
            version = "2.0"
        "#;
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), toml).unwrap();

        let manifest = Manifest::load(tmp.path()).unwrap();
        assert_eq!(manifest.root_artifact().coordinate(), "org.example:demo:1.0");
        assert_eq!(manifest.direct_dependencies().len(), 1);
        assert_eq!(manifest.repositories().len(), 1);
    }

    #[test]
    fn missing_manifest_reports_io_error() {
        let result = Manifest::load(Path::new("/nonexistent/Resolver.toml"));
        assert!(result.is_err());
    }
}
