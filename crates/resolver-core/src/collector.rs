//! Breadth-first dependency collection.
//!
//! Grounded on `kargo_resolver::resolver::resolve`'s BFS queue (level
//! draining, `exclusions` carried per queue entry, `propagate_scope`), with
//! the nearest-wins conflict shortcut removed — that belongs to the
//! `transform` pipeline now, not the collector, per spec.md §4.4's
//! stage split. What the collector keeps from the teacher: one flat queue,
//! processed breadth-first so nearer occurrences are always discovered
//! before farther ones, which is what makes "nearest" meaningful later.
//!
//! Three behaviors the teacher's version didn't need: cycle detection (the
//! teacher's Kotlin dependency graphs don't self-reference), relocation
//! re-entry (no relocated-artifact concept in a Kotlin build tool), and a
//! scope-sensitive skip cache (see the Open Questions decision recorded in
//! `DESIGN.md`).

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use resolver_model::artifact::Artifact;
use resolver_model::collaborators::{ArtifactDescriptor, DescriptorProvider};
use resolver_model::config::CollectorConfig;
use resolver_model::dependency::{Dependency, Scope};
use resolver_model::graph::{Annotation, DependencyGraph, ManagedBits, NodeId, PremanagedDependency};
use resolver_model::repository::RemoteRepository;
use resolver_model::session::Session;
use resolver_util::errors::ResolverError;

use crate::dependency_manager::DependencyManager;
use crate::descriptor_resolver::DescriptorResolver;

const MAX_RELOCATION_HOPS: u32 = 8;

/// Input to a single collection run: the build's own direct dependencies,
/// the repositories to search, and any root-level `dependencyManagement`
/// overrides (depth 0, always applies per `DependencyManager::apply`).
pub struct CollectRequest {
    pub root_artifact: Artifact,
    pub direct_dependencies: Vec<Dependency>,
    pub repositories: Vec<RemoteRepository>,
    pub managed_dependencies: Vec<Dependency>,
}

struct QueueEntry {
    parent: NodeId,
    dependency: Dependency,
    depth: usize,
    ancestor_ids: Vec<(String, NodeId)>,
    manager: DependencyManager,
    repositories: Vec<RemoteRepository>,
    managed_bits: ManagedBits,
    premanaged: PremanagedDependency,
}

/// Whether a version string is a Maven range (`[1,2)`, `(,1.0]`, `[1.0,)`)
/// rather than a single pinned version. Bracket/parenthesis detection only
/// — the actual range grammar lives in the descriptor provider, which is
/// the one that has to parse and match it against remote metadata.
fn is_version_range(version: &str) -> bool {
    version.starts_with('[') || version.starts_with('(')
}

/// Scope propagation table. Grounded on the teacher's `propagate_scope`,
/// generalized from ad hoc Kotlin scopes (`ksp`, `kapt`) to the finite
/// Maven [`Scope`] set.
fn propagate_scope(parent: Scope, child: Scope) -> Scope {
    use Scope::*;
    match (parent, child) {
        (_, Test) | (Test, _) => Test,
        (_, System) | (System, _) => System,
        (_, Provided) | (Provided, _) => Provided,
        (Compile, Compile) => Compile,
        (Compile, Runtime) => Runtime,
        (Runtime, Compile) => Runtime,
        (Runtime, Runtime) => Runtime,
    }
}

pub struct Collector {
    descriptors: DescriptorResolver,
    config: CollectorConfig,
}

impl Collector {
    pub fn new(provider: Arc<dyn DescriptorProvider>, config: CollectorConfig) -> Self {
        Self {
            descriptors: DescriptorResolver::new(provider, config.bf_threads),
            config,
        }
    }

    /// Build from a [`Session`]'s own `CollectorConfig`, the entry point
    /// every real (non-test) caller should use.
    pub fn from_session(provider: Arc<dyn DescriptorProvider>, session: &Session) -> Self {
        Self::new(provider, session.collector().clone())
    }

    pub async fn collect(&self, request: CollectRequest) -> Result<DependencyGraph, ResolverError> {
        let mut graph = DependencyGraph::new();
        let root = graph.root();
        let base_manager = DependencyManager::new().derive(0, &request.managed_dependencies);
        let root_id = request.root_artifact.versionless_id();

        let mut queue: VecDeque<QueueEntry> = VecDeque::new();
        for dep in request.direct_dependencies {
            queue.push_back(QueueEntry {
                parent: root,
                dependency: dep,
                depth: 1,
                ancestor_ids: vec![(root_id.clone(), root)],
                manager: base_manager.clone(),
                repositories: request.repositories.clone(),
                managed_bits: ManagedBits::NONE,
                premanaged: PremanagedDependency::default(),
            });
        }

        // Skipper: once an (identity, derived scope) pair has been fully
        // expanded, later occurrences reuse the cached child list instead of
        // re-fetching and re-walking its descriptor. Keyed on scope too (see
        // DESIGN.md's Open Questions decision 1) so a `test`-only subtree
        // doesn't suppress the same artifact's `compile`-scoped expansion
        // reached through another path.
        let mut skipper: HashSet<(String, Scope)> = HashSet::new();

        while let Some(entry) = queue.pop_front() {
            let dep = entry.dependency;
            let versionless = dep.artifact.versionless_id();

            // Cycle check: scan ancestors newest-first for the same
            // (groupId, artifactId, extension, classifier) identity. The
            // node itself is never created — only a back-reference from its
            // parent to the ancestor it would have re-entered.
            if let Some((_, ancestor_node)) = entry
                .ancestor_ids
                .iter()
                .rev()
                .find(|(id, _)| id == &versionless)
            {
                graph.add_back_ref(entry.parent, *ancestor_node);
                continue;
            }

            // Range dependencies (`[1,2)`, `(,1.0]`, …) are expanded against
            // the configured repositories before relocation/descriptor
            // resolution ever sees a concrete version. Candidates come back
            // newest-first; the collector always takes the newest — if a
            // sibling path pins an older member of the range, version
            // selection (not the collector) is what reconciles the two.
            let dep = if is_version_range(&dep.artifact.version) {
                let range_result = self
                    .descriptors
                    .resolve_version_range(&dep.artifact, &entry.repositories)
                    .await?;
                match range_result.versions.first() {
                    Some(candidate) => dep.with_artifact(dep.artifact.clone().with_version(candidate.version.clone())),
                    None => {
                        let node = graph.add_child(entry.parent, dep.clone());
                        graph.node_mut(node).annotate(
                            "descriptor.error",
                            Annotation::Text(format!("{}: no version in range matched", dep.artifact)),
                        );
                        continue;
                    }
                }
            } else {
                dep
            };

            let (resolved_artifact, descriptor) = self
                .resolve_with_relocation(&dep.artifact, &entry.repositories)
                .await?;
            let dep = dep.with_artifact(resolved_artifact);

            let skip_key = (versionless.clone(), dep.scope);
            let cache_key = format!("{}:{}", dep.artifact.coordinate(), dep.scope);

            if self.config.bf_skipper && skipper.contains(&skip_key) {
                if let Some(cached) = graph.cached_children(&cache_key).cloned() {
                    let node = graph.add_child(entry.parent, dep);
                    graph.reuse_children(node, &cached);
                    continue;
                }
            }

            let node = graph.add_child(entry.parent, dep.clone());
            {
                let graph_node = graph.node_mut(node);
                graph_node.managed_bits = entry.managed_bits;
                graph_node.premanaged = entry.premanaged;
            }
            if let Some(message) = descriptor
                .relocations
                .first()
                .and_then(|r| r.message.clone())
            {
                graph.node_mut(node).annotate("relocation.message", Annotation::Text(message));
            }

            skipper.insert(skip_key);

            let mut child_ancestor_ids = entry.ancestor_ids.clone();
            child_ancestor_ids.push((versionless, node));

            let child_manager = if descriptor.managed_dependencies.is_empty() {
                entry.manager.clone()
            } else {
                entry.manager.derive(entry.depth, &descriptor.managed_dependencies)
            };

            let mut child_repositories = entry.repositories.clone();
            for repo in &descriptor.repositories {
                if !child_repositories.iter().any(|r| r.id == repo.id) {
                    child_repositories.push(repo.clone());
                }
            }

            let mut children_nodes = Vec::new();
            for child_dep in &descriptor.dependencies {
                if child_dep.optional || dep.excludes(&child_dep.artifact) {
                    continue;
                }
                if matches!(child_dep.scope, Scope::Test | Scope::Provided | Scope::System) {
                    continue;
                }

                let (managed_dep, bits, premanaged) =
                    child_manager.apply(child_dep.clone(), entry.depth + 1);
                let mut managed_dep = managed_dep.with_scope(propagate_scope(dep.scope, managed_dep.scope));

                let mut merged_exclusions = dep.exclusions.clone();
                merged_exclusions.extend(managed_dep.exclusions.clone());
                managed_dep = managed_dep.with_exclusions(merged_exclusions);

                children_nodes.push((managed_dep, bits, premanaged));
            }

            for (managed_dep, bits, premanaged) in children_nodes {
                queue.push_back(QueueEntry {
                    parent: node,
                    dependency: managed_dep,
                    depth: entry.depth + 1,
                    ancestor_ids: child_ancestor_ids.clone(),
                    manager: child_manager.clone(),
                    repositories: child_repositories.clone(),
                    managed_bits: bits,
                    premanaged,
                });
            }

            graph.cache_children(cache_key, graph.node(node).children.clone());
        }

        Ok(graph)
    }

    /// Resolve `artifact`'s descriptor, following a bounded chain of
    /// relocations (Maven's `distributionManagement/relocation`) until a
    /// non-relocated descriptor is found.
    async fn resolve_with_relocation(
        &self,
        artifact: &Artifact,
        repositories: &[RemoteRepository],
    ) -> Result<(Artifact, ArtifactDescriptor), ResolverError> {
        let mut current = artifact.clone();
        for _ in 0..MAX_RELOCATION_HOPS {
            let descriptor = self.descriptors.describe(&current, repositories).await?;
            match descriptor.relocations.first() {
                Some(relocation) => current = relocation.target.clone(),
                None => return Ok((current, descriptor)),
            }
        }
        Err(ResolverError::kinded(
            resolver_util::errors::ErrorKind::DescriptorInvalid,
            format!("{artifact}: relocation chain exceeded {MAX_RELOCATION_HOPS} hops"),
        ))
    }
}
