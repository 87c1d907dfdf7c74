//! Narrowest-wins scope selection across a conflict group.
//!
//! If the same artifact is reached at `compile` scope through one path and
//! `test` scope through another, the surviving winner node's scope becomes
//! `compile` — the narrowest scope any path required — so a single
//! artifact is never excluded from a classpath it's genuinely needed on.
//! `Scope`'s declaration order doubles as this precedence (see
//! `resolver_model::dependency::Scope`), so selection is a plain `min`.

use resolver_model::graph::DependencyGraph;

use super::conflict_marker::ConflictGroups;
use super::version_selector::Winners;

pub fn select(graph: &mut DependencyGraph, groups: &ConflictGroups, winners: &Winners) {
    for (key, members) in groups {
        let Some(&winner) = winners.get(key) else {
            continue;
        };
        let narrowest = members
            .iter()
            .filter_map(|id| graph.node(*id).dependency.as_ref().map(|d| d.scope))
            .min();
        if let Some(scope) = narrowest {
            if let Some(dep) = graph.node_mut(winner).dependency.as_mut() {
                dep.scope = scope;
            }
        }
    }
}
