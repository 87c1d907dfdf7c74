//! CLI argument definitions.
//!
//! Uses `clap` derive macros the same way the teacher's `kargo-cli` does.
//! Scaled down to the two operations this demo binary exercises: printing
//! the resolved tree, and fetching every resolved artifact into the local
//! repository.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "resolver",
    version,
    about = "Maven-compatible transitive dependency resolver",
    long_about = "Collects, transforms and resolves a Maven-style dependency graph \
                  described by a Resolver.toml manifest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the manifest describing the root artifact and its dependencies
    #[arg(short, long, global = true, default_value = "Resolver.toml")]
    pub manifest: PathBuf,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect and transform the dependency graph, printing the resolved tree
    Tree {
        /// Print version conflicts found during transformation
        #[arg(long)]
        conflicts: bool,
    },

    /// Collect, transform, and fetch every resolved artifact into the local repository
    Fetch {
        /// Local repository root
        #[arg(long, default_value = ".resolver/repository")]
        local_repository: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
