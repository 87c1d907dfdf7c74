//! Dependency graph arena.
//!
//! The graph owns its nodes in a flat `Vec`, addressed by [`NodeId`], rather
//! than through an external graph library: cycles are recorded as
//! back-references on the node that would otherwise create them, never as a
//! second owning edge, so there is nothing for a graph crate's traversal to
//! get stuck on.

use std::collections::BTreeMap;

use crate::dependency::Dependency;

/// Index into a [`DependencyGraph`]'s node arena. `0` is always the
/// synthetic root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Which facets of a [`DependencyNode`] were overridden by the dependency
/// manager, recorded so premanaged values can be reported in verbose mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManagedBits(u8);

impl ManagedBits {
    pub const VERSION: ManagedBits = ManagedBits(1 << 0);
    pub const SCOPE: ManagedBits = ManagedBits(1 << 1);
    pub const OPTIONAL: ManagedBits = ManagedBits(1 << 2);
    pub const EXCLUSIONS: ManagedBits = ManagedBits(1 << 3);
    pub const PROPERTIES: ManagedBits = ManagedBits(1 << 4);
    pub const NONE: ManagedBits = ManagedBits(0);

    pub fn contains(&self, flag: ManagedBits) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn insert(&mut self, flag: ManagedBits) {
        self.0 |= flag.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for ManagedBits {
    type Output = ManagedBits;
    fn bitor(self, rhs: ManagedBits) -> ManagedBits {
        ManagedBits(self.0 | rhs.0)
    }
}

/// Pre-management snapshot of a dependency's facets, captured when verbose
/// mode is on so the original (pre-manager) values can be reported alongside
/// the applied ones.
#[derive(Debug, Clone, Default)]
pub struct PremanagedDependency {
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<bool>,
}

/// An annotation value attached to a node by a graph transformer
/// (`conflict.id`, `winner`, `scope.derivation.context`, …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Text(String),
    Node(NodeId),
    Bool(bool),
}

impl Annotation {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Annotation::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeId> {
        match self {
            Annotation::Node(n) => Some(*n),
            _ => None,
        }
    }
}

/// A vertex in the dependency graph. The synthetic root has `dependency ==
/// None`; every other node owns a [`Dependency`].
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub dependency: Option<Dependency>,
    pub children: Vec<NodeId>,
    pub managed_bits: ManagedBits,
    pub premanaged: PremanagedDependency,
    pub data: BTreeMap<String, Annotation>,
    pub repositories: Vec<String>,
    /// Nodes that would have created a cycle pointing back to this one;
    /// recorded instead of a second owning edge so the child list stays a
    /// DAG.
    pub back_refs: Vec<NodeId>,
}

impl DependencyNode {
    fn root() -> Self {
        Self {
            dependency: None,
            children: Vec::new(),
            managed_bits: ManagedBits::NONE,
            premanaged: PremanagedDependency::default(),
            data: BTreeMap::new(),
            repositories: Vec::new(),
            back_refs: Vec::new(),
        }
    }

    fn for_dependency(dependency: Dependency) -> Self {
        Self {
            dependency: Some(dependency),
            children: Vec::new(),
            managed_bits: ManagedBits::NONE,
            premanaged: PremanagedDependency::default(),
            data: BTreeMap::new(),
            repositories: Vec::new(),
            back_refs: Vec::new(),
        }
    }

    /// Versionless id of this node's dependency, or `None` for the root.
    pub fn versionless_id(&self) -> Option<String> {
        self.dependency.as_ref().map(|d| d.artifact.versionless_id())
    }

    pub fn annotate(&mut self, key: impl Into<String>, value: Annotation) {
        self.data.insert(key.into(), value);
    }

    pub fn annotation(&self, key: &str) -> Option<&Annotation> {
        self.data.get(key)
    }
}

/// The dependency graph: a flat node arena plus a parallel intern table for
/// deduplicating identical sub-trees discovered via different paths.
///
/// Node 0 is always the synthetic root.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<DependencyNode>,
    /// `(artifact coordinate, repo-set digest, derived-rule digest) ->
    /// already-built child list`, the cache keyed in the collector's
    /// "skipper present" branch.
    child_list_cache: BTreeMap<String, Vec<NodeId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![DependencyNode::root()],
            child_list_cache: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &DependencyNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut DependencyNode {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// All node ids in insertion order, including the root.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Append a new node for `dependency`, attach it as a child of `parent`,
    /// and return its id.
    pub fn add_child(&mut self, parent: NodeId, dependency: Dependency) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DependencyNode::for_dependency(dependency));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Record `from -> to` as a cycle back-reference rather than an owning
    /// child edge.
    pub fn add_back_ref(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from.0].back_refs.push(to);
    }

    /// Look up a previously cached child list for a `(artifact, repos,
    /// derived rules)` key.
    pub fn cached_children(&self, key: &str) -> Option<&Vec<NodeId>> {
        self.child_list_cache.get(key)
    }

    pub fn cache_children(&mut self, key: String, children: Vec<NodeId>) {
        self.child_list_cache.insert(key, children);
    }

    /// Reuse an already-built child list by re-parenting it under `parent`
    /// (shared ownership of the same sub-graph, per the collector's "present"
    /// branch).
    pub fn reuse_children(&mut self, parent: NodeId, children: &[NodeId]) {
        self.nodes[parent.0].children.extend_from_slice(children);
    }

    /// Remove `node` from the tree (used when conflict resolution prunes a
    /// loser in standard, non-verbose mode). Leaves a hole in the arena;
    /// other ids remain valid.
    pub fn prune(&mut self, parent: NodeId, node: NodeId) {
        self.nodes[parent.0].children.retain(|&c| c != node);
    }

    /// Depth-first pre-order walk starting at `start`, yielding `(id, depth)`.
    /// Does not follow `back_refs`.
    pub fn walk(&self, start: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(start, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Parent chain from the root down to (but excluding) `target`, in
    /// root-to-target order. Used by the collector's cycle check, which then
    /// scans it newest-first.
    pub fn parent_chain(&self, target: NodeId) -> Vec<NodeId> {
        fn find(graph: &DependencyGraph, current: NodeId, target: NodeId, path: &mut Vec<NodeId>) -> bool {
            if current == target {
                return true;
            }
            for &child in &graph.node(current).children {
                path.push(current);
                if find(graph, child, target, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        find(self, self.root(), target, &mut path);
        path
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;

    fn dep(group: &str, artifact: &str, version: &str) -> Dependency {
        Dependency::new(Artifact::new(group, artifact, version))
    }

    #[test]
    fn new_graph_has_only_root() {
        let g = DependencyGraph::new();
        assert_eq!(g.len(), 1);
        assert!(g.is_empty());
    }

    #[test]
    fn add_child_attaches_to_parent() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let child = g.add_child(root, dep("org.example", "lib", "1.0"));
        assert_eq!(g.node(root).children, vec![child]);
        assert!(!g.is_empty());
    }

    #[test]
    fn managed_bits_tracks_multiple_flags() {
        let mut bits = ManagedBits::NONE;
        bits.insert(ManagedBits::VERSION);
        bits.insert(ManagedBits::SCOPE);
        assert!(bits.contains(ManagedBits::VERSION));
        assert!(bits.contains(ManagedBits::SCOPE));
        assert!(!bits.contains(ManagedBits::OPTIONAL));
    }

    #[test]
    fn back_ref_does_not_create_owning_edge() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let a = g.add_child(root, dep("org.example", "a", "1.0"));
        let b = g.add_child(a, dep("org.example", "b", "1.0"));
        g.add_back_ref(b, a);
        assert_eq!(g.node(a).children, vec![b]);
        assert!(g.node(b).children.is_empty());
        assert_eq!(g.node(b).back_refs, vec![a]);
    }

    #[test]
    fn parent_chain_is_root_to_target_order() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let a = g.add_child(root, dep("org.example", "a", "1.0"));
        let b = g.add_child(a, dep("org.example", "b", "1.0"));
        assert_eq!(g.parent_chain(b), vec![root, a]);
    }

    #[test]
    fn prune_removes_from_parent_children() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let a = g.add_child(root, dep("org.example", "a", "1.0"));
        g.prune(root, a);
        assert!(g.node(root).children.is_empty());
    }
}
