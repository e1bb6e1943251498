mod apply;
mod show;

use std::path::Path;

use clap::Subcommand;

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Apply a plan to a store as one transaction
    Apply(apply::ApplyArgs),
    /// Print the documents held by a store
    Show(show::ShowArgs),
}

impl Commands {
    pub(crate) fn execute(self, config: Option<&Path>) -> Result<()> {
        match self {
            Self::Apply(args) => apply::run(args, config),
            Self::Show(args) => show::run(&args),
        }
    }
}
