use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    ArtifactResolverConfig, CollectorConfig, ConflictResolverConfig, DependencyManagerConfig,
    ResolverConfig, SyncContextConfig, TransportConfig, VersionSelectorConfig,
};

/// Typed accessor over a [`ResolverConfig`] plus the per-invocation state
/// (local repository root, request context prefix) that isn't itself
/// persisted configuration. Cheap to clone: the config is held behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct Session {
    config: Arc<ResolverConfig>,
    pub local_repository_path: PathBuf,
    pub offline: bool,
}

impl Session {
    pub fn new(config: ResolverConfig, local_repository_path: PathBuf) -> Self {
        Self {
            config: Arc::new(config),
            local_repository_path,
            offline: false,
        }
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn collector(&self) -> &CollectorConfig {
        &self.config.collector
    }

    pub fn dependency_manager(&self) -> &DependencyManagerConfig {
        &self.config.dependency_manager
    }

    pub fn conflict_resolver(&self) -> &ConflictResolverConfig {
        &self.config.conflict_resolver
    }

    pub fn version_selector(&self) -> &VersionSelectorConfig {
        &self.config.version_selector
    }

    pub fn sync_context(&self) -> &SyncContextConfig {
        &self.config.sync_context
    }

    pub fn artifact_resolver(&self) -> &ArtifactResolverConfig {
        &self.config.artifact_resolver
    }

    pub fn transport(&self) -> &TransportConfig {
        &self.config.transport
    }

    pub fn named_lock_shared_timeout(&self) -> Duration {
        Duration::from_secs(self.config.sync_context.named_time_secs)
    }

    pub fn named_lock_exclusive_timeout(&self) -> Duration {
        Duration::from_secs(self.config.sync_context.named_exclusive_time_secs)
    }

    pub fn named_lock_retry_wait(&self) -> Duration {
        Duration::from_millis(self.config.sync_context.named_retry_wait_ms)
    }
}

/// Per-request prefix threaded through resolution so downstream consumers
/// can distinguish, e.g., a `"project/compile"` path from
/// `"project/test"`. Built by the context refiner transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext(pub String);

impl RequestContext {
    pub fn project() -> Self {
        Self("project".to_string())
    }

    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}/{}", self.0, segment))
    }
}

impl std::fmt::Display for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_exposes_documented_defaults() {
        let session = Session::new(ResolverConfig::default(), PathBuf::from("/tmp/repo"));
        assert_eq!(session.named_lock_shared_timeout(), Duration::from_secs(300));
        assert_eq!(session.named_lock_exclusive_timeout(), Duration::from_secs(5));
        assert!(!session.offline);
    }

    #[test]
    fn offline_builder_sets_flag() {
        let session = Session::new(ResolverConfig::default(), PathBuf::from("/tmp/repo")).offline(true);
        assert!(session.offline);
    }

    #[test]
    fn request_context_nests_with_slash() {
        let ctx = RequestContext::project().child("compile");
        assert_eq!(ctx.to_string(), "project/compile");
    }
}
