//! End-to-end collect -> transform scenarios against an in-memory
//! `DescriptorProvider`, no network involved.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use resolver_core::transform::GraphTransformer;
use resolver_core::{CollectRequest, Collector};
use resolver_model::artifact::Artifact;
use resolver_model::collaborators::{ArtifactDescriptor, DescriptorProvider, VersionCandidate, VersionRangeResult};
use resolver_model::config::{ConflictResolverConfig, VersionSelectorConfig};
use resolver_model::dependency::{Dependency, Scope};
use resolver_model::repository::RemoteRepository;
use resolver_util::errors::ResolverError;

struct FakeProvider {
    descriptors: BTreeMap<String, ArtifactDescriptor>,
    ranges: BTreeMap<String, Vec<&'static str>>,
}

#[async_trait]
impl DescriptorProvider for FakeProvider {
    async fn resolve_version_range(
        &self,
        artifact: &Artifact,
        _repositories: &[RemoteRepository],
    ) -> Result<VersionRangeResult, ResolverError> {
        let key = format!("{}:{}", artifact.group_id, artifact.artifact_id);
        let versions = self
            .ranges
            .get(&key)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|v| VersionCandidate {
                version: v.to_string(),
                repository: None,
            })
            .collect();
        Ok(VersionRangeResult { versions })
    }

    async fn describe(
        &self,
        artifact: &Artifact,
        _repositories: &[RemoteRepository],
    ) -> Result<ArtifactDescriptor, ResolverError> {
        Ok(self
            .descriptors
            .get(&artifact.coordinate())
            .cloned()
            .unwrap_or_else(|| ArtifactDescriptor::empty(artifact.clone())))
    }
}

fn dep(group: &str, artifact: &str, version: &str) -> Dependency {
    Dependency::new(Artifact::new(group, artifact, version))
}

fn descriptor(artifact: Artifact, deps: &[Dependency]) -> ArtifactDescriptor {
    let mut d = ArtifactDescriptor::empty(artifact);
    d.dependencies = deps.to_vec();
    d
}

fn transform(graph: &mut resolver_model::graph::DependencyGraph) -> resolver_core::transform::ConvergenceReport {
    GraphTransformer::new(VersionSelectorConfig::default(), ConflictResolverConfig::default())
        .transform(graph)
        .expect("default convergence policy never aborts")
}

/// Scenario 1: `a:1 -> [b:compile, c:compile]`, `b:1 -> c:compile`. Expected
/// graph `a -> {b, c}`, `b -> {c}`; `c`'s conflict group resolves to a
/// single winner at scope `compile`.
#[tokio::test]
async fn scenario_1_shared_transitive_dependency_converges_to_one_winner() {
    let mut descriptors = BTreeMap::new();
    descriptors.insert(
        "org.example:b:1".to_string(),
        descriptor(Artifact::new("org.example", "b", "1"), &[dep("org.example", "c", "1")]),
    );

    let provider = Arc::new(FakeProvider {
        descriptors,
        ranges: BTreeMap::new(),
    });
    let collector = Collector::new(provider, Default::default());

    let mut graph = collector
        .collect(CollectRequest {
            root_artifact: Artifact::new("org.example", "root", "1.0"),
            direct_dependencies: vec![dep("org.example", "b", "1"), dep("org.example", "c", "1")],
            repositories: vec![],
            managed_dependencies: vec![],
        })
        .await
        .unwrap();

    let report = transform(&mut graph);
    assert!(report.is_empty(), "single version per identity should never report a convergence conflict");

    let root = graph.root();
    assert_eq!(graph.node(root).children.len(), 2, "a should keep exactly one b and one c");

    let c_id = graph
        .node(root)
        .children
        .iter()
        .find(|&&id| graph.node(id).dependency.as_ref().unwrap().artifact.artifact_id == "c")
        .copied()
        .unwrap();
    assert_eq!(graph.node(c_id).dependency.as_ref().unwrap().scope, Scope::Compile);
}

/// Scenario 2: version range `x:[1,2)` against remote `[1, 1.5, 1.9]`; with
/// nothing else requesting `x`, the provider's newest-first candidate order
/// decides the winner outright.
#[tokio::test]
async fn scenario_2_range_dependency_is_expanded_to_its_newest_candidate() {
    let mut ranges = BTreeMap::new();
    ranges.insert("org.example:x".to_string(), vec!["1.9", "1.5", "1"]);

    let provider = Arc::new(FakeProvider {
        descriptors: BTreeMap::new(),
        ranges,
    });
    let collector = Collector::new(provider, Default::default());

    let mut graph = collector
        .collect(CollectRequest {
            root_artifact: Artifact::new("org.example", "root", "1.0"),
            direct_dependencies: vec![dep("org.example", "x", "[1,2)")],
            repositories: vec![],
            managed_dependencies: vec![],
        })
        .await
        .unwrap();

    transform(&mut graph);

    let root = graph.root();
    assert_eq!(graph.node(root).children.len(), 1);
    let x = graph.node(graph.node(root).children[0]).dependency.as_ref().unwrap();
    assert_eq!(x.artifact.version, "1.9");
}

/// Scenario 2, continued: a second path pins `x:1.5` directly. Under
/// "nearest" the direct (depth-1) occurrence beats the range-expanded one
/// reached through `y` (depth 2), so the winner is `1.5`.
#[tokio::test]
async fn scenario_2_a_nearer_pinned_version_outranks_the_range_winner() {
    let mut ranges = BTreeMap::new();
    ranges.insert("org.example:x".to_string(), vec!["1.9", "1.5", "1"]);
    let mut descriptors = BTreeMap::new();
    descriptors.insert(
        "org.example:y:1".to_string(),
        descriptor(Artifact::new("org.example", "y", "1"), &[dep("org.example", "x", "[1,2)")]),
    );

    let provider = Arc::new(FakeProvider { descriptors, ranges });
    let collector = Collector::new(provider, Default::default());

    let mut graph = collector
        .collect(CollectRequest {
            root_artifact: Artifact::new("org.example", "root", "1.0"),
            direct_dependencies: vec![dep("org.example", "y", "1"), dep("org.example", "x", "1.5")],
            repositories: vec![],
            managed_dependencies: vec![],
        })
        .await
        .unwrap();

    transform(&mut graph);

    let root = graph.root();
    let x = graph
        .node(root)
        .children
        .iter()
        .find_map(|&id| {
            let d = graph.node(id).dependency.as_ref()?;
            (d.artifact.artifact_id == "x").then(|| d.clone())
        })
        .expect("x should survive conflict resolution as a direct child");
    assert_eq!(x.artifact.version, "1.5");
}

/// Scenario 4: `a -> b -> a`. `b`'s would-be child `a` is recorded as a
/// back-reference to the root instead of a second node.
#[tokio::test]
async fn scenario_4_cycle_back_references_the_ancestor_instead_of_re_expanding_it() {
    let mut descriptors = BTreeMap::new();
    descriptors.insert(
        "org.example:b:1".to_string(),
        descriptor(Artifact::new("org.example", "b", "1"), &[dep("org.example", "root", "1.0")]),
    );

    let provider = Arc::new(FakeProvider {
        descriptors,
        ranges: BTreeMap::new(),
    });
    let collector = Collector::new(provider, Default::default());

    let graph = collector
        .collect(CollectRequest {
            root_artifact: Artifact::new("org.example", "root", "1.0"),
            direct_dependencies: vec![dep("org.example", "b", "1")],
            repositories: vec![],
            managed_dependencies: vec![],
        })
        .await
        .unwrap();

    let root = graph.root();
    assert_eq!(graph.node(root).children.len(), 1, "a should have exactly one child, b");
    let b = graph.node(root).children[0];
    assert!(graph.node(b).children.is_empty(), "b's cyclic child a is never materialized as a node");
    assert_eq!(graph.node(b).back_refs, vec![root], "b records a back-reference to the root instead");
}
