//! Records each node's scope-derivation context for verbose reporting.
//!
//! The collector already propagates scope along each discovery path (see
//! `collector::propagate_scope`), so by the time the transformer runs every
//! node already carries its effective scope; this stage's only job is to
//! snapshot that value before `scope_selector` possibly narrows the winner
//! further, so a verbose run can report "derived as runtime, narrowed to
//! compile" rather than just the final answer.

use resolver_model::graph::{Annotation, DependencyGraph};

use super::conflict_marker::ConflictGroups;

pub fn derive(graph: &mut DependencyGraph, groups: &ConflictGroups) {
    for members in groups.values() {
        for &id in members {
            if let Some(scope) = graph.node(id).dependency.as_ref().map(|d| d.scope.as_str().to_string()) {
                graph
                    .node_mut(id)
                    .annotate("scope.derivation.context", Annotation::Text(scope));
            }
        }
    }
}
