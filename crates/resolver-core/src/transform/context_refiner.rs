//! Final pipeline stage: removes conflict losers from the tree in standard
//! mode, or leaves them in place (annotated) in verbose mode so a caller can
//! still report what was pruned and why.
//!
//! Grounded on spec.md §6's "conflict resolver verbosity" knob
//! (`NONE`/`STANDARD`/`FULL`) and `DependencyGraph::prune`, which exists
//! specifically for this stage to call.

use resolver_model::config::ConflictResolverVerbosity;
use resolver_model::graph::{Annotation, DependencyGraph, NodeId};

use super::conflict_marker::ConflictGroups;
use super::version_selector::Winners;

/// Parent of every non-root node, computed once so losers can be pruned
/// from the right parent's child list.
fn parents_of(graph: &DependencyGraph) -> std::collections::BTreeMap<NodeId, NodeId> {
    let mut parents = std::collections::BTreeMap::new();
    for id in graph.node_ids() {
        for &child in &graph.node(id).children.clone() {
            parents.insert(child, id);
        }
    }
    parents
}

pub fn refine(
    graph: &mut DependencyGraph,
    groups: &ConflictGroups,
    winners: &Winners,
    verbosity: &ConflictResolverVerbosity,
) {
    let parents = parents_of(graph);

    for (key, members) in groups {
        let Some(&winner) = winners.get(key) else {
            continue;
        };
        for &id in members {
            if id == winner {
                continue;
            }
            match verbosity {
                ConflictResolverVerbosity::None => {
                    if let Some(&parent) = parents.get(&id) {
                        graph.prune(parent, id);
                    }
                }
                ConflictResolverVerbosity::Standard | ConflictResolverVerbosity::Full => {
                    graph
                        .node_mut(id)
                        .annotate("conflict.pruned", Annotation::Bool(true));
                }
            }
        }
    }
}
