//! Picks one winning node per conflict group, either nearest-wins (default)
//! or highest-wins, per `VersionSelectorConfig::strategy`.
//!
//! Grounded on the teacher's inline depth comparison in
//! `kargo_resolver::resolver::resolve` (`if *existing_depth <= entry.depth`),
//! generalized into its own stage with a second strategy. The
//! highest-version comparison here is a lightweight numeric/qualifier split,
//! not the full `MavenVersion` ordering `resolver-descriptor` uses for range
//! matching — pulling that crate in here would create the dependency cycle
//! `resolver-descriptor` -> `resolver-core` already avoids by taking
//! collaborators as trait objects (see `resolver-model::collaborators`), so
//! the transformer settles for a comparison good enough to rank already
//! valid, already-selected candidate versions against each other.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use resolver_model::config::VersionSelectorStrategy;
use resolver_model::graph::{Annotation, DependencyGraph, NodeId};

use super::conflict_marker::ConflictGroups;

pub type Winners = BTreeMap<String, NodeId>;

pub fn select(graph: &mut DependencyGraph, groups: &ConflictGroups, strategy: VersionSelectorStrategy) -> Winners {
    let depths: BTreeMap<NodeId, usize> = graph.walk(graph.root()).into_iter().collect();
    let mut winners = Winners::new();

    for (key, members) in groups {
        let winner = match strategy {
            VersionSelectorStrategy::Nearest => *members
                .iter()
                .min_by_key(|id| depths.get(id).copied().unwrap_or(usize::MAX))
                .expect("conflict group is never empty"),
            VersionSelectorStrategy::Highest => *members
                .iter()
                .max_by(|a, b| compare_versions(version_of(graph, **a), version_of(graph, **b)))
                .expect("conflict group is never empty"),
        };
        winners.insert(key.clone(), winner);
        for &id in members {
            graph.node_mut(id).annotate("winner", Annotation::Node(winner));
        }
    }

    winners
}

fn version_of(graph: &DependencyGraph, id: NodeId) -> &str {
    graph
        .node(id)
        .dependency
        .as_ref()
        .map(|d| d.artifact.version.as_str())
        .unwrap_or("")
}

/// Numeric-segment-aware comparison: splits on `.` and `-`, compares
/// segments numerically when both sides parse as numbers, lexically
/// otherwise. Not qualifier-aware (no alpha/beta/rc ordering) — sufficient
/// for ranking concrete, already-resolved versions against each other.
fn compare_versions(a: &str, b: &str) -> Ordering {
    let sa = split_segments(a);
    let sb = split_segments(b);
    for (x, y) in sa.iter().zip(sb.iter()) {
        let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
            (Ok(nx), Ok(ny)) => nx.cmp(&ny),
            _ => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    sa.len().cmp(&sb.len())
}

fn split_segments(v: &str) -> Vec<&str> {
    v.split(|c| c == '.' || c == '-').collect()
}
