//! Artifact transport: the `reqwest`-backed `Transport` implementation,
//! repository authentication, checksum verification, and the on-disk local
//! repository with its per-artifact update-check tracking.

pub mod auth;
pub mod checksum;
pub mod http;
pub mod local_repository;

pub use checksum::ChecksumPostProcessor;
pub use http::HttpTransport;
pub use local_repository::{LocalArtifactResult, LocalRepository, TrackingRecord, UpdatePolicy};
