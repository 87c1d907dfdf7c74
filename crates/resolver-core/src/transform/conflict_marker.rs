//! First transformer stage: group every collected node by its versionless
//! identity and annotate each with its group key.
//!
//! Grounded on the teacher's `kargo_resolver::conflict::ConflictReport`,
//! which only recorded the *outcome* of a conflict inline during
//! resolution. spec.md's pipeline split means the grouping itself now has
//! to be a standalone, inspectable stage the later stages (version
//! selection, convergence, scope narrowing) all share.

use std::collections::BTreeMap;

use resolver_model::graph::{Annotation, DependencyGraph, NodeId};

/// `versionless_id -> every node sharing that identity`, in discovery order.
pub type ConflictGroups = BTreeMap<String, Vec<NodeId>>;

pub fn mark(graph: &mut DependencyGraph) -> ConflictGroups {
    let mut groups: ConflictGroups = BTreeMap::new();
    let root = graph.root();
    for id in graph.node_ids() {
        if id == root {
            continue;
        }
        if let Some(versionless) = graph.node(id).versionless_id() {
            groups.entry(versionless).or_default().push(id);
        }
    }
    for (key, members) in &groups {
        for &id in members {
            graph.node_mut(id).annotate("conflict.id", Annotation::Text(key.clone()));
        }
    }
    groups
}
