//! Shared, worker-pool-bounded descriptor fetching.
//!
//! Not a teacher port — the teacher's `fetch_pom_from_repos` ran inline per
//! `JoinSet` task in `kargo_resolver::resolver::resolve` with no
//! deduplication beyond the level-local `pom_cache`. spec.md's
//! `DescriptorResolver` asks for two things the teacher didn't have: a
//! fixed-size worker pool bounding total concurrent descriptor fetches
//! (`collector.bfThreads`, default 5), and one-shot sharing so two branches
//! of the tree that reach the same artifact at the same time fetch it once
//! between them rather than racing two downloads.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell, Semaphore};

use resolver_model::artifact::Artifact;
use resolver_model::collaborators::{ArtifactDescriptor, DescriptorProvider};
use resolver_model::repository::RemoteRepository;
use resolver_util::errors::{ErrorKind, ResolverError};

/// Wraps a [`DescriptorProvider`] with a bounded worker pool and one-shot
/// sharing of in-flight fetches, keyed by coordinate.
pub struct DescriptorResolver {
    provider: Arc<dyn DescriptorProvider>,
    semaphore: Arc<Semaphore>,
    inflight: Mutex<HashMap<String, Arc<OnceCell<Result<ArtifactDescriptor, String>>>>>,
}

impl DescriptorResolver {
    pub fn new(provider: Arc<dyn DescriptorProvider>, worker_threads: u32) -> Self {
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(worker_threads.max(1) as usize)),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `artifact`'s descriptor, sharing the fetch with any other
    /// caller currently resolving the same coordinate.
    pub async fn describe(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<ArtifactDescriptor, ResolverError> {
        if self.provider.has_no_descriptor(artifact) {
            return Ok(ArtifactDescriptor::empty(artifact.clone()));
        }

        let key = artifact.coordinate();
        let cell = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let result = cell
            .get_or_init(|| async {
                let _permit = self.semaphore.acquire().await;
                self.provider
                    .describe(artifact, repositories)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;

        result.clone().map_err(|message| {
            ResolverError::kinded(ErrorKind::DescriptorInvalid, format!("{artifact}: {message}"))
        })
    }

    /// Expand a version range/constraint to candidate versions. Not shared
    /// across callers — range results are cheap to refetch and rarely
    /// requested twice for the same artifact in one collection run.
    pub async fn resolve_version_range(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<resolver_model::collaborators::VersionRangeResult, ResolverError> {
        let _permit = self.semaphore.acquire().await;
        self.provider.resolve_version_range(artifact, repositories).await
    }
}
