//! Trait contracts for the descriptor and transport collaborators.
//!
//! Living here rather than in `resolver-descriptor`/`resolver-transport`
//! directly avoids a dependency cycle: `resolver-core` depends on both
//! concrete crates, and both concrete crates implement traits owned by this
//! one. A fake in-memory `DescriptorProvider` used by `resolver-core`'s
//! integration tests implements the same trait with no network code at all.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;

use crate::artifact::Artifact;
use crate::dependency::Dependency;
use crate::repository::RemoteRepository;
use resolver_util::errors::ResolverError;

/// One candidate version produced by range expansion, tagged with the
/// repository it was listed in.
#[derive(Debug, Clone)]
pub struct VersionCandidate {
    pub version: String,
    pub repository: Option<RemoteRepository>,
}

/// Result of expanding a version range or a single version constraint.
/// `versions` is returned in the order the collector should try them
/// (newest-first, per the skipper-maximizing rule).
#[derive(Debug, Clone, Default)]
pub struct VersionRangeResult {
    pub versions: Vec<VersionCandidate>,
}

/// A relocation hop: the original artifact was replaced by `target`,
/// optionally with an explanatory message (as Maven POMs carry in
/// `<relocation><message>`).
#[derive(Debug, Clone)]
pub struct Relocation {
    pub target: Artifact,
    pub message: Option<String>,
}

/// Everything the descriptor collaborator knows about one artifact version:
/// its (possibly relocated) identity, its declared and managed dependencies,
/// and the repositories it points consumers at.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDescriptor {
    pub artifact: Artifact,
    pub dependencies: Vec<Dependency>,
    pub managed_dependencies: Vec<Dependency>,
    pub relocations: Vec<Relocation>,
    pub repositories: Vec<RemoteRepository>,
    pub properties: BTreeMap<String, String>,
    /// The repository the descriptor itself was read from, if remote.
    pub source_repository: Option<String>,
}

impl ArtifactDescriptor {
    /// An empty descriptor for artifacts with no metadata to read (the
    /// "has-no-descriptor" short-circuit).
    pub fn empty(artifact: Artifact) -> Self {
        Self {
            artifact,
            ..Default::default()
        }
    }
}

/// Resolves version ranges and artifact descriptors (POM parsing, BOM
/// imports, relocation). Implemented by `resolver-descriptor`'s Maven
/// provider and by fakes in tests.
#[async_trait]
pub trait DescriptorProvider: Send + Sync {
    /// Whether `artifact` is known to carry no descriptor (by
    /// extension/classifier policy) and so can skip I/O entirely.
    fn has_no_descriptor(&self, artifact: &Artifact) -> bool {
        let _ = artifact;
        false
    }

    async fn resolve_version_range(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<VersionRangeResult, ResolverError>;

    async fn describe(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<ArtifactDescriptor, ResolverError>;
}

/// Raw bytes plus whatever headers the transport surfaced (used for
/// checksum verification and snapshot mtime propagation).
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
    pub headers: BTreeMap<String, String>,
    /// Checksums the server advertised out of band (e.g. a
    /// `X-Checksum-Sha1` header), distinct from sidecar `.sha1` files which
    /// the caller fetches separately.
    pub checksums: BTreeMap<String, String>,
}

impl TransportResponse {
    pub fn last_modified(&self) -> Option<&str> {
        self.headers.get("last-modified").map(String::as_str)
    }
}

/// Fetches and pushes bytes over HTTP(S). Implemented by
/// `resolver-transport`'s `reqwest`-backed client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Lightweight existence check (HTTP HEAD or equivalent).
    async fn peek(&self, url: &str) -> Result<bool, ResolverError>;

    /// Download `url`, optionally resuming from `resume_offset` bytes, and
    /// persist the body to `data_path`.
    async fn get(
        &self,
        url: &str,
        data_path: &Path,
        resume_offset: u64,
    ) -> Result<TransportResponse, ResolverError>;

    async fn put(&self, url: &str, path: &Path) -> Result<(), ResolverError>;
}

/// Runs after the `ArtifactResolver`'s aggregate result set is assembled
/// (checksum validation, signature verification). Implemented by
/// `resolver-transport`'s checksum post-processor; a signature
/// post-processor is not shipped (no GPG dependency in the teacher or
/// pack), but the trait is the documented extension point for one.
#[async_trait]
pub trait ArtifactResolverPostProcessor: Send + Sync {
    /// Validate `data` for the artifact that was just downloaded from
    /// `source_url`. Returning `Err` fails that artifact's resolution.
    async fn process(&self, source_url: &str, data: &[u8]) -> Result<(), ResolverError>;
}
