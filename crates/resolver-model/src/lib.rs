//! Data model for the dependency resolver.
//!
//! Intentionally free of async code and network I/O: `Artifact`,
//! `Dependency` and the graph arena are plain value types so the core
//! resolution algorithms in `resolver-core` can be tested without a
//! runtime. Descriptor fetching and transport live behind the traits in
//! [`collaborators`], implemented by `resolver-descriptor` and
//! `resolver-transport`.

pub mod artifact;
pub mod collaborators;
pub mod config;
pub mod dependency;
pub mod exclusion;
pub mod graph;
pub mod repository;
pub mod session;

pub use artifact::Artifact;
pub use dependency::{Dependency, Scope};
pub use exclusion::Exclusion;
pub use repository::RemoteRepository;
pub use session::Session;
