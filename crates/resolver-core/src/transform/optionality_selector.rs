//! Optionality resolution across a conflict group: if any path reached the
//! artifact non-optionally, the winner is non-optional, even if the path
//! that happened to win version selection marked it optional.
//!
//! Grounded on the teacher's blanket `if dep.optional { continue }` filter
//! in `kargo_resolver::resolver::resolve`, which only ever looked at a
//! single path's flag. Maven's own resolver instead asks "was this artifact
//! ever required non-optionally by some path", which needs the whole group,
//! not just the winner's own occurrence.

use resolver_model::graph::DependencyGraph;

use super::conflict_marker::ConflictGroups;
use super::version_selector::Winners;

pub fn select(graph: &mut DependencyGraph, groups: &ConflictGroups, winners: &Winners) {
    for (key, members) in groups {
        let Some(&winner) = winners.get(key) else {
            continue;
        };
        let any_required = members
            .iter()
            .filter_map(|id| graph.node(*id).dependency.as_ref().map(|d| !d.optional))
            .any(|required| required);
        if any_required {
            if let Some(dep) = graph.node_mut(winner).dependency.as_mut() {
                dep.optional = false;
            }
        }
    }
}
