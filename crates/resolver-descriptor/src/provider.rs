//! The `DescriptorProvider` implementation: POM fetch, parent inheritance,
//! BOM import expansion, relocation, and `maven-metadata.xml`-backed version
//! range expansion. Holds no HTTP client of its own — all bytes come through
//! an injected `Arc<dyn Transport>`, so this crate never depends on
//! `resolver-transport` (that dependency would run the other way).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use resolver_model::collaborators::{
    ArtifactDescriptor, DescriptorProvider, Relocation, Transport, VersionCandidate,
    VersionRangeResult,
};
use resolver_model::{Artifact, Dependency, Exclusion, RemoteRepository, Scope};
use resolver_util::errors::{ErrorKind, ResolverError};

use crate::metadata::{parse_metadata, parse_snapshot_metadata};
use crate::pom::{parse_pom, Pom, PomDependency};
use crate::urls::{metadata_url, pom_url, snapshot_metadata_url};
use crate::version::VersionRange;

const MAX_PARENT_DEPTH: u32 = 12;

/// Descriptor provider backed by the standard Maven 2 repository layout.
pub struct MavenDescriptorProvider {
    transport: Arc<dyn Transport>,
}

impl MavenDescriptorProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, ResolverError> {
        let tmp = NamedTempFile::new().map_err(ResolverError::from)?;
        let response = self.transport.get(url, tmp.path(), 0).await?;
        String::from_utf8(response.bytes).map_err(|e| {
            ResolverError::kinded(ErrorKind::DescriptorInvalid, format!("{url} is not valid UTF-8: {e}"))
        })
    }

    async fn fetch_pom(&self, repo: &RemoteRepository, artifact: &Artifact) -> Result<Pom, ResolverError> {
        let url = pom_url(repo, &artifact.group_id, &artifact.artifact_id, &artifact.version);
        let xml = self.fetch_text(&url).await?;
        let mut pom = parse_pom(&xml).map_err(|e| {
            ResolverError::kinded(ErrorKind::DescriptorInvalid, format!("{url}: {e}"))
        })?;

        let mut depth = 0;
        let mut current = pom.clone();
        while let Some(parent_ref) = current.parent.clone() {
            depth += 1;
            if depth > MAX_PARENT_DEPTH {
                warn!(group_id = %artifact.group_id, "parent POM chain exceeded depth cap, stopping inheritance");
                break;
            }
            let parent_artifact = Artifact::new(&parent_ref.group_id, &parent_ref.artifact_id, &parent_ref.version);
            let parent_pom = match self.fetch_pom_flat(repo, &parent_artifact).await {
                Ok(p) => p,
                Err(e) => {
                    debug!(%e, "parent POM fetch failed, stopping inheritance chain");
                    break;
                }
            };
            pom.apply_parent(&parent_pom);
            current = parent_pom;
        }

        pom.resolve_properties();

        let bom_refs: Vec<(String, String, String)> = pom
            .bom_imports()
            .iter()
            .map(|d| (d.group_id.clone(), d.artifact_id.clone(), d.version.clone().unwrap_or_default()))
            .collect();
        for (group_id, artifact_id, version) in bom_refs {
            if version.is_empty() {
                continue;
            }
            let bom_artifact = Artifact::new(&group_id, &artifact_id, &version).with_extension("pom");
            if let Ok(bom_pom) = self.fetch_pom_flat(repo, &bom_artifact).await {
                pom.import_bom(&bom_pom);
            }
        }

        Ok(pom)
    }

    /// Fetch and parse a POM without walking its own parent chain (used for
    /// parent/BOM lookups, where one level of recursion is enough — a parent's
    /// parent is picked up on the next loop iteration in `fetch_pom`).
    async fn fetch_pom_flat(&self, repo: &RemoteRepository, artifact: &Artifact) -> Result<Pom, ResolverError> {
        let url = pom_url(repo, &artifact.group_id, &artifact.artifact_id, &artifact.version);
        let xml = self.fetch_text(&url).await?;
        parse_pom(&xml).map_err(|e| ResolverError::kinded(ErrorKind::DescriptorInvalid, format!("{url}: {e}")))
    }

    fn to_model_dependency(pom: &Pom, dep: &PomDependency) -> Dependency {
        let version = dep.version.clone().unwrap_or_default();
        let mut artifact = Artifact::new(pom.interpolate(&dep.group_id), pom.interpolate(&dep.artifact_id), pom.interpolate(&version));
        if let Some(ref c) = dep.classifier {
            artifact = artifact.with_classifier(pom.interpolate(c));
        }
        if let Some(ref t) = dep.type_ {
            artifact = artifact.with_extension(pom.interpolate(t));
        }
        let scope = dep
            .scope
            .as_deref()
            .and_then(Scope::parse)
            .unwrap_or_default();
        let exclusions = dep
            .exclusions
            .iter()
            .map(|e| Exclusion::new(e.group_id.clone(), e.artifact_id.clone().unwrap_or_else(|| "*".to_string())))
            .collect();
        Dependency::new(artifact)
            .with_scope(scope)
            .with_optional(dep.optional)
            .with_exclusions(exclusions)
    }
}

#[async_trait]
impl DescriptorProvider for MavenDescriptorProvider {
    fn has_no_descriptor(&self, artifact: &Artifact) -> bool {
        artifact.extension != "jar" && artifact.extension != "pom" && artifact.extension != "aar"
    }

    async fn resolve_version_range(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<VersionRangeResult, ResolverError> {
        let range = VersionRange::parse(&artifact.version);
        let mut versions = Vec::new();

        for repo in repositories {
            let url = metadata_url(repo, &artifact.group_id, &artifact.artifact_id);
            let xml = match self.fetch_text(&url).await {
                Ok(xml) => xml,
                Err(_) => continue,
            };
            let meta = match parse_metadata(&xml) {
                Ok(m) => m,
                Err(_) => continue,
            };
            for v in meta.versions {
                let include = match &range {
                    Some(r) => r.contains(&crate::version::MavenVersion::parse(&v)),
                    None => v == artifact.version,
                };
                if include {
                    versions.push(VersionCandidate {
                        version: v,
                        repository: Some(repo.clone()),
                    });
                }
            }
        }

        versions.sort_by(|a, b| {
            crate::version::MavenVersion::parse(&b.version).cmp(&crate::version::MavenVersion::parse(&a.version))
        });

        Ok(VersionRangeResult { versions })
    }

    async fn describe(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<ArtifactDescriptor, ResolverError> {
        if self.has_no_descriptor(artifact) {
            return Ok(ArtifactDescriptor::empty(artifact.clone()));
        }

        let mut last_error = None;
        for repo in repositories {
            let resolved_artifact = if artifact.is_snapshot() {
                self.resolve_snapshot_coordinate(repo, artifact).await.unwrap_or_else(|| artifact.clone())
            } else {
                artifact.clone()
            };

            match self.fetch_pom(repo, &resolved_artifact).await {
                Ok(pom) => {
                    return Ok(self.descriptor_from_pom(&resolved_artifact, &pom, repo));
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ResolverError::kinded(
                ErrorKind::NotFound,
                format!("no repository served a descriptor for {artifact}"),
            )
        }))
    }
}

impl MavenDescriptorProvider {
    async fn resolve_snapshot_coordinate(&self, repo: &RemoteRepository, artifact: &Artifact) -> Option<Artifact> {
        let url = snapshot_metadata_url(repo, &artifact.group_id, &artifact.artifact_id, &artifact.version);
        let xml = self.fetch_text(&url).await.ok()?;
        let meta = parse_snapshot_metadata(&xml).ok()?;
        let base = meta.snapshot_base(&artifact.artifact_id)?;
        let timestamped_version = base.strip_prefix(&format!("{}-", artifact.artifact_id))?.to_string();
        Some(artifact.clone().with_version(timestamped_version))
    }

    fn descriptor_from_pom(&self, artifact: &Artifact, pom: &Pom, source_repo: &RemoteRepository) -> ArtifactDescriptor {
        let dependencies: Vec<Dependency> = pom
            .dependencies
            .iter()
            .filter(|d| d.scope.as_deref() != Some("import"))
            .map(|d| Self::to_model_dependency(pom, d))
            .collect();

        let managed_dependencies: Vec<Dependency> = pom
            .dependency_management
            .iter()
            .filter(|d| d.scope.as_deref() != Some("import"))
            .map(|d| Self::to_model_dependency(pom, d))
            .collect();

        let relocations = pom
            .relocation
            .as_ref()
            .map(|reloc| {
                let target = Artifact::new(
                    reloc.group_id.clone().unwrap_or_else(|| artifact.group_id.clone()),
                    reloc.artifact_id.clone().unwrap_or_else(|| artifact.artifact_id.clone()),
                    reloc.version.clone().unwrap_or_else(|| artifact.version.clone()),
                );
                vec![Relocation {
                    target,
                    message: reloc.message.clone(),
                }]
            })
            .unwrap_or_default();

        let repositories = pom
            .repositories
            .iter()
            .map(|r| RemoteRepository::new(r.id.clone(), r.url.clone()))
            .collect();

        let mut properties: BTreeMap<String, String> = BTreeMap::new();
        properties.extend(pom.properties.clone());

        ArtifactDescriptor {
            artifact: artifact.clone(),
            dependencies,
            managed_dependencies,
            relocations,
            repositories,
            properties,
            source_repository: Some(source_repo.id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_model::collaborators::TransportResponse;
    use std::path::Path;
    use std::sync::Mutex;

    struct FakeTransport {
        responses: Mutex<BTreeMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn peek(&self, url: &str) -> Result<bool, ResolverError> {
            Ok(self.responses.lock().unwrap().contains_key(url))
        }

        async fn get(&self, url: &str, _data_path: &Path, _resume_offset: u64) -> Result<TransportResponse, ResolverError> {
            self.responses
                .lock()
                .unwrap()
                .get(url)
                .map(|bytes| TransportResponse {
                    bytes: bytes.clone(),
                    ..Default::default()
                })
                .ok_or_else(|| ResolverError::kinded(ErrorKind::NotFound, url.to_string()))
        }

        async fn put(&self, _url: &str, _path: &Path) -> Result<(), ResolverError> {
            Ok(())
        }
    }

    fn pom_response(xml: &str) -> Vec<u8> {
        xml.as_bytes().to_vec()
    }

    #[tokio::test]
    async fn describes_simple_pom_dependencies() {
        let repo = RemoteRepository::maven_central();
        let artifact = Artifact::new("org.example", "lib", "1.0.0");
        let url = pom_url(&repo, "org.example", "lib", "1.0.0");

        let mut responses = BTreeMap::new();
        responses.insert(
            url,
            pom_response(
                r#"<project>
                    <groupId>org.example</groupId>
                    <artifactId>lib</artifactId>
                    <version>1.0.0</version>
                    <dependencies>
                        <dependency>
                            <groupId>com.google.guava</groupId>
                            <artifactId>guava</artifactId>
                            <version>32.0.0-jre</version>
                        </dependency>
                    </dependencies>
                </project>"#,
            ),
        );

        let transport = Arc::new(FakeTransport {
            responses: Mutex::new(responses),
        });
        let provider = MavenDescriptorProvider::new(transport);

        let descriptor = provider.describe(&artifact, &[repo]).await.unwrap();
        assert_eq!(descriptor.dependencies.len(), 1);
        assert_eq!(descriptor.dependencies[0].artifact.artifact_id, "guava");
    }

    #[tokio::test]
    async fn relocation_is_surfaced() {
        let repo = RemoteRepository::maven_central();
        let artifact = Artifact::new("org.example", "old-name", "1.0.0");
        let url = pom_url(&repo, "org.example", "old-name", "1.0.0");

        let mut responses = BTreeMap::new();
        responses.insert(
            url,
            pom_response(
                r#"<project>
                    <groupId>org.example</groupId>
                    <artifactId>old-name</artifactId>
                    <version>1.0.0</version>
                    <distributionManagement>
                        <relocation>
                            <artifactId>new-name</artifactId>
                        </relocation>
                    </distributionManagement>
                </project>"#,
            ),
        );

        let transport = Arc::new(FakeTransport {
            responses: Mutex::new(responses),
        });
        let provider = MavenDescriptorProvider::new(transport);

        let descriptor = provider.describe(&artifact, &[repo]).await.unwrap();
        assert_eq!(descriptor.relocations.len(), 1);
        assert_eq!(descriptor.relocations[0].target.artifact_id, "new-name");
    }

    #[test]
    fn has_no_descriptor_for_non_jar_non_pom() {
        let transport = Arc::new(FakeTransport {
            responses: Mutex::new(BTreeMap::new()),
        });
        let provider = MavenDescriptorProvider::new(transport);
        let artifact = Artifact::new("org.example", "lib", "1.0.0").with_extension("asc");
        assert!(provider.has_no_descriptor(&artifact));
    }
}
