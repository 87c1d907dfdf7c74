//! Dependency resolution engine built on [`resolver_model`]'s graph arena.
//!
//! Four stages run in sequence: the [`collector`] performs a breadth-first
//! expansion of the dependency tree against an injected
//! `resolver_model::collaborators::DescriptorProvider`, the
//! [`dependency_manager`] derives depth-tagged facet overrides along the
//! way, the [`transform`] pipeline rewrites the collected graph into its
//! final conflict-resolved shape, and the [`artifact_resolver`] fetches the
//! actual files through an injected `Transport`, guarded by
//! [`sync_context`]'s named locks.

pub mod artifact_resolver;
pub mod collector;
pub mod dependency_manager;
pub mod descriptor_resolver;
pub mod sync_context;
pub mod transform;

pub use artifact_resolver::{ArtifactRequest, ArtifactResolver, ArtifactResult};
pub use collector::{CollectRequest, Collector};
pub use dependency_manager::DependencyManager;
pub use descriptor_resolver::DescriptorResolver;
pub use sync_context::SyncContext;
pub use transform::GraphTransformer;
