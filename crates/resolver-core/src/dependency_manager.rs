//! Depth-tagged dependency management: facet overrides (version, scope,
//! optionality, exclusions) declared in a `dependencyManagement` section at
//! one depth in the tree, applied to matching dependencies discovered
//! deeper in the tree.
//!
//! Grounded on the teacher's `kargo_resolver::resolver::resolve`, which
//! looked up `pom.managed_version(group, artifact)` inline with no notion of
//! depth at all (managed versions always won, unconditionally). spec.md
//! generalizes this to full facet management with a depth bound, so the
//! inline lookup becomes its own accumulating structure.

use std::collections::BTreeMap;

use resolver_model::dependency::{Dependency, Scope};
use resolver_model::exclusion::Exclusion;
use resolver_model::graph::{ManagedBits, PremanagedDependency};

#[derive(Debug, Clone, Default)]
struct ManagementFacets {
    version: Option<String>,
    scope: Option<Scope>,
    optional: Option<bool>,
    exclusions: Vec<Exclusion>,
}

#[derive(Debug, Clone)]
struct ManagedEntry {
    facets: ManagementFacets,
    declared_depth: usize,
}

/// An immutable, depth-tagged map of `groupId:artifactId:extension:classifier
/// -> overrides`. Each `derive` call returns a new manager rather than
/// mutating in place, so sibling subtrees that saw different
/// `dependencyManagement` sections don't leak into each other.
///
/// Parameterized by two depth bounds, rather than a hierarchy of "Classic" /
/// "Transitive" / "Aggressive" manager types: `derive_until` is the depth
/// beyond which `derive` stops folding in new declarations at all, and
/// `apply_from` is how many levels below a declaration's own depth `apply`
/// starts honoring it. [`DependencyManager::classic`], [`Self::transitive`]
/// and [`Self::aggressive`] are just named parameter presets.
#[derive(Debug, Clone)]
pub struct DependencyManager {
    entries: BTreeMap<String, ManagedEntry>,
    derive_until: Option<u32>,
    apply_from: u32,
}

impl Default for DependencyManager {
    fn default() -> Self {
        Self::classic()
    }
}

impl DependencyManager {
    /// Alias for [`Self::classic`], Maven's own default management reach.
    pub fn new() -> Self {
        Self::classic()
    }

    /// Classic Maven: management only folds in down to depth 2, and only
    /// reaches dependencies at least two levels below where it was declared.
    pub const fn classic() -> Self {
        Self {
            entries: BTreeMap::new(),
            derive_until: Some(2),
            apply_from: 2,
        }
    }

    /// Management keeps accumulating at every depth, but still only applies
    /// two levels below its declaration.
    pub const fn transitive() -> Self {
        Self {
            entries: BTreeMap::new(),
            derive_until: None,
            apply_from: 2,
        }
    }

    /// Management keeps accumulating at every depth and applies starting at
    /// the declaring node's own depth.
    pub const fn aggressive() -> Self {
        Self {
            entries: BTreeMap::new(),
            derive_until: None,
            apply_from: 0,
        }
    }

    /// Fold in managed dependencies declared at `depth` (the depth of the
    /// node whose POM carried the `dependencyManagement` section). Entries
    /// already present win over new ones at the same key — the nearest
    /// enclosing `dependencyManagement` declaration always takes precedence,
    /// mirroring Maven's own "nearest management wins" rule. A no-op once
    /// `depth` exceeds `derive_until`.
    pub fn derive(&self, depth: usize, managed: &[Dependency]) -> Self {
        if let Some(until) = self.derive_until {
            if depth > until as usize {
                return self.clone();
            }
        }
        let mut next = self.clone();
        for dep in managed {
            let key = dep.artifact.versionless_id();
            next.entries.entry(key).or_insert_with(|| ManagedEntry {
                facets: ManagementFacets {
                    version: if dep.artifact.version.is_empty() {
                        None
                    } else {
                        Some(dep.artifact.version.clone())
                    },
                    scope: Some(dep.scope),
                    optional: Some(dep.optional),
                    exclusions: dep.exclusions.clone(),
                },
                declared_depth: depth,
            });
        }
        next
    }

    /// Apply any matching override to `dependency`, discovered at
    /// `node_depth`. A `dependencyManagement` entry only reaches
    /// dependencies at least `apply_from` levels below the node that
    /// declared it — under the classic preset that means it never overrides
    /// a direct child's own explicit declaration at the same level, matching
    /// Maven's own management semantics — except an entry declared at depth
    /// 0 (the build root's own management section), which always applies
    /// regardless of how deep the match is found.
    ///
    /// Returns the (possibly rewritten) dependency, the bits that were
    /// overridden, and the pre-management snapshot for verbose reporting.
    pub fn apply(&self, dependency: Dependency, node_depth: usize) -> (Dependency, ManagedBits, PremanagedDependency) {
        let key = dependency.artifact.versionless_id();
        let Some(entry) = self.entries.get(&key) else {
            return (dependency, ManagedBits::NONE, PremanagedDependency::default());
        };
        if entry.declared_depth != 0 && node_depth < entry.declared_depth + self.apply_from as usize {
            return (dependency, ManagedBits::NONE, PremanagedDependency::default());
        }

        let mut bits = ManagedBits::NONE;
        let mut pre = PremanagedDependency::default();
        let mut dep = dependency;

        if let Some(version) = &entry.facets.version {
            if dep.artifact.version.is_empty() || &dep.artifact.version != version {
                pre.version = Some(dep.artifact.version.clone());
                dep.artifact = dep.artifact.with_version(version.clone());
                bits.insert(ManagedBits::VERSION);
            }
        }
        if let Some(scope) = entry.facets.scope {
            if dep.scope != scope {
                pre.scope = Some(dep.scope.as_str().to_string());
                dep.scope = scope;
                bits.insert(ManagedBits::SCOPE);
            }
        }
        if let Some(optional) = entry.facets.optional {
            if dep.optional != optional {
                pre.optional = Some(dep.optional);
                dep.optional = optional;
                bits.insert(ManagedBits::OPTIONAL);
            }
        }
        if !entry.facets.exclusions.is_empty() {
            let mut merged = dep.exclusions.clone();
            for excl in &entry.facets.exclusions {
                if !merged.contains(excl) {
                    merged.push(excl.clone());
                }
            }
            if merged.len() != dep.exclusions.len() {
                dep.exclusions = merged;
                bits.insert(ManagedBits::EXCLUSIONS);
            }
        }

        (dep, bits, pre)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolver_model::artifact::Artifact;

    fn dep(version: &str) -> Dependency {
        Dependency::new(Artifact::new("org.example", "lib", version))
    }

    #[test]
    fn unmanaged_dependency_is_untouched() {
        let mgr = DependencyManager::new();
        let (out, bits, _) = mgr.apply(dep("1.0"), 3);
        assert_eq!(out.artifact.version, "1.0");
        assert!(bits.is_empty());
    }

    #[test]
    fn root_level_management_always_applies() {
        let mgr = DependencyManager::new().derive(0, &[dep("2.0")]);
        let (out, bits, pre) = mgr.apply(dep("1.0"), 1);
        assert_eq!(out.artifact.version, "2.0");
        assert!(bits.contains(ManagedBits::VERSION));
        assert_eq!(pre.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn management_does_not_override_the_immediate_child() {
        let mgr = DependencyManager::new().derive(2, &[dep("2.0")]);
        let (out, bits, _) = mgr.apply(dep("1.0"), 3);
        assert_eq!(out.artifact.version, "1.0");
        assert!(bits.is_empty());
    }

    #[test]
    fn management_reaches_two_levels_deeper() {
        let mgr = DependencyManager::new().derive(2, &[dep("2.0")]);
        let (out, bits, _) = mgr.apply(dep("1.0"), 4);
        assert_eq!(out.artifact.version, "2.0");
        assert!(bits.contains(ManagedBits::VERSION));
    }

    #[test]
    fn first_declared_management_wins_on_derive() {
        let mgr = DependencyManager::new()
            .derive(0, &[dep("2.0")])
            .derive(0, &[dep("3.0")]);
        let (out, _, _) = mgr.apply(dep("1.0"), 5);
        assert_eq!(out.artifact.version, "2.0");
    }

    #[test]
    fn scope_and_exclusions_are_managed_independently() {
        let managed = Dependency::new(Artifact::new("org.example", "lib", ""))
            .with_scope(Scope::Provided)
            .with_exclusions(vec![Exclusion::new("org.bad", "evil")]);
        let mgr = DependencyManager::new().derive(0, &[managed]);
        let (out, bits, _) = mgr.apply(dep("1.0"), 1);
        assert_eq!(out.artifact.version, "1.0");
        assert_eq!(out.scope, Scope::Provided);
        assert_eq!(out.exclusions.len(), 1);
        assert!(!bits.contains(ManagedBits::VERSION));
        assert!(bits.contains(ManagedBits::SCOPE));
        assert!(bits.contains(ManagedBits::EXCLUSIONS));
    }

    #[test]
    fn classic_derive_is_a_no_op_past_depth_two() {
        let mgr = DependencyManager::classic().derive(3, &[dep("2.0")]);
        let (out, bits, _) = mgr.apply(dep("1.0"), 10);
        assert_eq!(out.artifact.version, "1.0");
        assert!(bits.is_empty());
    }

    #[test]
    fn transitive_keeps_deriving_past_depth_two_but_still_applies_two_levels_deep() {
        let mgr = DependencyManager::transitive().derive(5, &[dep("2.0")]);
        let (out, bits, _) = mgr.apply(dep("1.0"), 6);
        assert_eq!(out.artifact.version, "1.0", "apply_from=2 still holds at depth 6 from a depth-5 declaration");
        assert!(bits.is_empty());

        let (out, bits, _) = mgr.apply(dep("1.0"), 7);
        assert_eq!(out.artifact.version, "2.0");
        assert!(bits.contains(ManagedBits::VERSION));
    }

    #[test]
    fn aggressive_applies_starting_at_the_declaring_depth() {
        let mgr = DependencyManager::aggressive().derive(5, &[dep("2.0")]);
        let (out, bits, _) = mgr.apply(dep("1.0"), 5);
        assert_eq!(out.artifact.version, "2.0");
        assert!(bits.contains(ManagedBits::VERSION));
    }
}
