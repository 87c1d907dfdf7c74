//! The graph transformer pipeline: rewrites a freshly collected graph into
//! its final, conflict-resolved shape.
//!
//! Seven stages, run in a fixed order per spec.md §4.4: mark conflict
//! groups, derive each node's scope-derivation context, pick a version
//! winner per group, check convergence, narrow the winner's scope, resolve
//! optionality across the group, then prune (or annotate) the losers.
//! Nothing here is grounded directly on the teacher — `kargo_resolver`
//! folded all of this into one inline pass during its BFS — but every
//! individual stage is grounded on a specific piece of that pass (see each
//! submodule's own doc comment).

pub mod conflict_marker;
pub mod context_refiner;
pub mod convergence;
pub mod optionality_selector;
pub mod scope_deriver;
pub mod scope_selector;
pub mod version_selector;

use resolver_model::config::{ConflictResolverConfig, VersionSelectorConfig};
use resolver_model::graph::DependencyGraph;
use resolver_model::session::Session;
use resolver_util::errors::ResolverError;

pub use conflict_marker::ConflictGroups;
pub use convergence::{ConvergenceConflict, ConvergenceReport};
pub use version_selector::Winners;

/// Runs the full pipeline over an already-collected graph.
pub struct GraphTransformer {
    version_selector: VersionSelectorConfig,
    conflict_resolver: ConflictResolverConfig,
}

impl GraphTransformer {
    pub fn new(version_selector: VersionSelectorConfig, conflict_resolver: ConflictResolverConfig) -> Self {
        Self {
            version_selector,
            conflict_resolver,
        }
    }

    /// Build from a [`Session`]'s own `VersionSelectorConfig` and
    /// `ConflictResolverConfig`, the entry point every real (non-test)
    /// caller should use.
    pub fn from_session(session: &Session) -> Self {
        Self::new(session.version_selector().clone(), session.conflict_resolver().clone())
    }

    /// Transform `graph` in place, returning the convergence report, or an
    /// error if the configured convergence policy is violated. On failure
    /// the remaining stages (scope selection, optionality, pruning) never
    /// run, so the graph is left in its pre-refinement shape.
    pub fn transform(&self, graph: &mut DependencyGraph) -> Result<ConvergenceReport, ResolverError> {
        let groups = conflict_marker::mark(graph);
        scope_deriver::derive(graph, &groups);
        let winners = version_selector::select(graph, &groups, self.version_selector.strategy);
        let report = convergence::check(graph, &groups, &winners, self.conflict_resolver.convergence)?;
        scope_selector::select(graph, &groups, &winners);
        optionality_selector::select(graph, &groups, &winners);
        context_refiner::refine(graph, &groups, &winners, &self.conflict_resolver.verbose);
        Ok(report)
    }
}
