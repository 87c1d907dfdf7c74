//! On-disk resolver configuration, loaded the way
//! `kargo_core::config::GlobalConfig` loads `~/.kargo/config.toml`: read if
//! present, fall back to defaults otherwise.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use resolver_util::errors::{ErrorKind, ResolverError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictResolverVerbosity {
    None,
    Standard,
    Full,
}

impl Default for ConflictResolverVerbosity {
    fn default() -> Self {
        ConflictResolverVerbosity::None
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionSelectorStrategy {
    Nearest,
    Highest,
}

impl Default for VersionSelectorStrategy {
    fn default() -> Self {
        VersionSelectorStrategy::Nearest
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameMapperKind {
    Static,
    Gav,
    Discriminating,
    File,
}

impl Default for NameMapperKind {
    fn default() -> Self {
        NameMapperKind::Gav
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockFactoryKind {
    LocalRwlock,
    LocalSemaphore,
    File,
}

impl Default for LockFactoryKind {
    fn default() -> Self {
        LockFactoryKind::LocalRwlock
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HttpVersion {
    Http11,
    Http2,
}

impl Default for HttpVersion {
    fn default() -> Self {
        HttpVersion::Http11
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpsSecurityMode {
    Default,
    Insecure,
}

impl Default for HttpsSecurityMode {
    fn default() -> Self {
        HttpsSecurityMode::Default
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CollectorConfig {
    pub bf_skipper: bool,
    pub bf_threads: u32,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            bf_skipper: true,
            bf_threads: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DependencyManagerConfig {
    pub verbose: bool,
}

/// How strictly the transformer enforces version convergence across a
/// conflict group, checked once version selection has picked a winner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConvergencePolicy {
    /// No convergence enforcement; disagreeing versions are only reported.
    None,
    /// Abort if a conflict group has more than one requested version.
    VersionConvergence,
    /// Abort only if a conflict group's requested versions span more than
    /// one major version component.
    MajorVersionConvergence,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        ConvergencePolicy::None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConflictResolverConfig {
    pub verbose: ConflictResolverVerbosity,
    pub convergence: ConvergencePolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VersionSelectorConfig {
    pub strategy: VersionSelectorStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncContextConfig {
    pub named_time_secs: u64,
    pub named_exclusive_time_secs: u64,
    pub named_retry: u32,
    pub named_retry_wait_ms: u64,
    pub name_mapper: NameMapperKind,
    pub factory: LockFactoryKind,
}

impl Default for SyncContextConfig {
    fn default() -> Self {
        Self {
            named_time_secs: 300,
            named_exclusive_time_secs: 5,
            named_retry: 1,
            named_retry_wait_ms: 200,
            name_mapper: NameMapperKind::default(),
            factory: LockFactoryKind::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArtifactResolverConfig {
    pub snapshot_normalization: bool,
    pub simple_lrm_interop: bool,
    /// `always|never|daily|interval:N` (N in minutes), governing when a
    /// cached artifact is re-checked against its remote repository.
    pub update_policy: String,
}

impl Default for ArtifactResolverConfig {
    fn default() -> Self {
        Self {
            snapshot_normalization: true,
            simple_lrm_interop: false,
            update_policy: "daily".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransportConfig {
    pub http_max_concurrent_requests: u32,
    pub http_version: HttpVersion,
    pub expect_continue: bool,
    pub https_security_mode: HttpsSecurityMode,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            http_max_concurrent_requests: 5,
            http_version: HttpVersion::default(),
            expect_continue: false,
            https_security_mode: HttpsSecurityMode::default(),
        }
    }
}

/// Full resolver configuration, loadable from a TOML file. Every field has a
/// documented default so an absent file (or absent table) behaves exactly as
/// the defaults describe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolverConfig {
    pub collector: CollectorConfig,
    pub dependency_manager: DependencyManagerConfig,
    pub conflict_resolver: ConflictResolverConfig,
    pub version_selector: VersionSelectorConfig,
    pub sync_context: SyncContextConfig,
    pub artifact_resolver: ArtifactResolverConfig,
    pub transport: TransportConfig,
}

impl ResolverConfig {
    /// Load from `path`, or return defaults if it doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ResolverError> {
        if path.is_file() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                ResolverError::kinded(
                    ErrorKind::DescriptorInvalid,
                    format!("failed to parse resolver config {}: {e}", path.display()),
                )
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Default path, `~/.resolver/config.toml`, mirroring the teacher's
    /// `~/.kargo/config.toml` convention.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join(".resolver").join("config.toml")
    }
}
