//! Command dispatch and handler modules.

mod fetch;
mod tree;

use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Tree { conflicts } => tree::exec(&cli.manifest, conflicts).await,
        Command::Fetch { local_repository } => fetch::exec(&cli.manifest, &local_repository).await,
    }
}
