//! Maven descriptor resolution: POM parsing (with parent inheritance and
//! BOM imports), `maven-metadata.xml` parsing, version range matching, and
//! the `DescriptorProvider` implementation. No network code of its own —
//! bytes come from an injected `resolver_model::collaborators::Transport`,
//! which `resolver-transport` implements over `reqwest`.

pub mod metadata;
pub mod pom;
pub mod provider;
pub mod urls;
pub mod version;

pub use provider::MavenDescriptorProvider;
