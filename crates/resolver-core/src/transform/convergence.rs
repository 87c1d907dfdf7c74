//! Reports conflict groups whose members disagree on version, after a
//! winner has already been picked.
//!
//! Grounded on `kargo_resolver::conflict::ConflictReport`/`VersionConflict`
//! almost verbatim (`Display` impl, `is_empty`/`len`) — the teacher recorded
//! these inline during its single-pass BFS; the transformer pipeline
//! computes the same report as its own stage instead, now that version
//! selection and convergence checking are split apart.

use std::fmt;

use resolver_model::config::ConvergencePolicy;
use resolver_model::graph::{DependencyGraph, NodeId};
use resolver_util::errors::{ErrorKind, ResolverError};

use super::conflict_marker::ConflictGroups;
use super::version_selector::Winners;

#[derive(Debug, Clone)]
pub struct ConvergenceConflict {
    pub versionless_id: String,
    pub requested_versions: Vec<String>,
    pub selected_version: String,
}

#[derive(Debug, Default)]
pub struct ConvergenceReport {
    pub conflicts: Vec<ConvergenceConflict>,
}

impl ConvergenceReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConvergenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(
                f,
                "  {} requested {:?}, resolved to {}",
                c.versionless_id, c.requested_versions, c.selected_version
            )?;
        }
        Ok(())
    }
}

pub fn check(
    graph: &DependencyGraph,
    groups: &ConflictGroups,
    winners: &Winners,
    policy: ConvergencePolicy,
) -> Result<ConvergenceReport, ResolverError> {
    let mut report = ConvergenceReport::default();
    for (key, members) in groups {
        let mut versions: Vec<String> = members
            .iter()
            .filter_map(|id| version_of(graph, *id))
            .map(str::to_string)
            .collect();
        versions.sort();
        versions.dedup();
        if versions.len() <= 1 {
            continue;
        }

        let violates = match policy {
            ConvergencePolicy::None => false,
            ConvergencePolicy::VersionConvergence => true,
            ConvergencePolicy::MajorVersionConvergence => {
                versions.iter().map(|v| major_component(v)).collect::<std::collections::BTreeSet<_>>().len() > 1
            }
        };
        if violates {
            let artifact_id = members
                .iter()
                .filter_map(|id| graph.node(*id).dependency.as_ref())
                .map(|d| d.artifact.artifact_id.as_str())
                .next()
                .unwrap_or(key.as_str());
            return Err(ResolverError::kinded(
                ErrorKind::VersionConflict,
                format!("Convergence violated for {artifact_id}, versions present:[{}]", versions.join(", ")),
            ));
        }

        let selected = winners
            .get(key)
            .and_then(|&id| version_of(graph, id))
            .unwrap_or_default()
            .to_string();
        report.conflicts.push(ConvergenceConflict {
            versionless_id: key.clone(),
            requested_versions: versions,
            selected_version: selected,
        });
    }
    Ok(report)
}

fn version_of(graph: &DependencyGraph, id: NodeId) -> Option<&str> {
    graph.node(id).dependency.as_ref().map(|d| d.artifact.version.as_str())
}

/// The leading dot/dash-delimited segment of a version string (`"3.0.4"` ->
/// `"3"`), used to compare major versions without pulling in full Maven
/// version ordering.
fn major_component(version: &str) -> &str {
    version.split(|c| c == '.' || c == '-').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{conflict_marker, version_selector};
    use resolver_model::artifact::Artifact;
    use resolver_model::config::VersionSelectorStrategy;
    use resolver_model::dependency::Dependency;

    #[test]
    fn reports_groups_with_more_than_one_version_under_default_policy() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        g.add_child(root, Dependency::new(Artifact::new("org.example", "lib", "1.0")));
        g.add_child(root, Dependency::new(Artifact::new("org.example", "lib", "2.0")));
        let groups = conflict_marker::mark(&mut g);
        let winners = version_selector::select(&mut g, &groups, VersionSelectorStrategy::Nearest);
        let report = check(&g, &groups, &winners, ConvergencePolicy::None).unwrap();
        assert_eq!(report.len(), 1);
        assert!(report.to_string().contains("org.example:lib"));
    }

    #[test]
    fn single_version_group_does_not_conflict() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        g.add_child(root, Dependency::new(Artifact::new("org.example", "lib", "1.0")));
        let groups = conflict_marker::mark(&mut g);
        let winners = version_selector::select(&mut g, &groups, VersionSelectorStrategy::Nearest);
        let report = check(&g, &groups, &winners, ConvergencePolicy::VersionConvergence).unwrap();
        assert!(report.is_empty());
    }

    /// a -> b:2 -> c:2, a -> c:3.0.4: both paths to `c` disagree on version.
    #[test]
    fn a_to_b_to_c_and_a_to_c_directly_at_different_versions_conflicts_under_default_policy() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let b = g.add_child(root, Dependency::new(Artifact::new("org.example", "b", "2")));
        g.add_child(b, Dependency::new(Artifact::new("org.example", "c", "2")));
        g.add_child(root, Dependency::new(Artifact::new("org.example", "c", "3.0.4")));

        let expected_id = Artifact::new("org.example", "c", "2").versionless_id();

        let groups = conflict_marker::mark(&mut g);
        let winners = version_selector::select(&mut g, &groups, VersionSelectorStrategy::Nearest);
        let report = check(&g, &groups, &winners, ConvergencePolicy::None).unwrap();

        assert_eq!(report.len(), 1);
        let conflict = &report.conflicts[0];
        assert_eq!(conflict.versionless_id, expected_id);
        assert_eq!(conflict.requested_versions, vec!["2".to_string(), "3.0.4".to_string()]);
    }

    /// Same graph, but under `VersionConvergence` the disagreement aborts
    /// resolution with the exact message a caller would surface.
    #[test]
    fn a_to_b_to_c_and_a_to_c_directly_at_different_versions_aborts_under_version_convergence() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        let b = g.add_child(root, Dependency::new(Artifact::new("org.example", "b", "2")));
        g.add_child(b, Dependency::new(Artifact::new("org.example", "c", "2")));
        g.add_child(root, Dependency::new(Artifact::new("org.example", "c", "3.0.4")));

        let groups = conflict_marker::mark(&mut g);
        let winners = version_selector::select(&mut g, &groups, VersionSelectorStrategy::Nearest);
        let err = check(&g, &groups, &winners, ConvergencePolicy::VersionConvergence).unwrap_err();

        assert_eq!(err.kind(), Some(ErrorKind::VersionConflict));
        assert_eq!(err.to_string(), "version conflict: Convergence violated for c, versions present:[2, 3.0.4]");
    }

    /// `MajorVersionConvergence` tolerates disagreement within a major
    /// version, and only aborts once candidates span more than one.
    #[test]
    fn major_version_convergence_tolerates_minor_disagreement_but_not_major() {
        let mut g = DependencyGraph::new();
        let root = g.root();
        g.add_child(root, Dependency::new(Artifact::new("org.example", "lib", "1.0")));
        g.add_child(root, Dependency::new(Artifact::new("org.example", "lib", "1.9")));
        let groups = conflict_marker::mark(&mut g);
        let winners = version_selector::select(&mut g, &groups, VersionSelectorStrategy::Nearest);
        let report = check(&g, &groups, &winners, ConvergencePolicy::MajorVersionConvergence).unwrap();
        assert_eq!(report.len(), 1);

        let mut g2 = DependencyGraph::new();
        let root2 = g2.root();
        g2.add_child(root2, Dependency::new(Artifact::new("org.example", "lib", "1.0")));
        g2.add_child(root2, Dependency::new(Artifact::new("org.example", "lib", "2.0")));
        let groups2 = conflict_marker::mark(&mut g2);
        let winners2 = version_selector::select(&mut g2, &groups2, VersionSelectorStrategy::Nearest);
        let err = check(&g2, &groups2, &winners2, ConvergencePolicy::MajorVersionConvergence).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::VersionConflict));
    }
}
