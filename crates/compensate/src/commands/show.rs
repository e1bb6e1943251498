use std::path::PathBuf;

use clap::Args;

use crate::error::{CliError, Result};
use crate::store;

#[derive(Args)]
pub(crate) struct ShowArgs {
    /// JSON store file to read
    #[arg(long)]
    pub(crate) store: PathBuf,
}

pub(crate) fn run(args: &ShowArgs) -> Result<()> {
    let collection = store::load(&args.store)?;
    if collection.is_empty() {
        println!("Store is empty.");
        return Ok(());
    }

    let rendered =
        serde_json::to_string_pretty(&collection.documents()).map_err(CliError::Serialize)?;
    println!("{rendered}");
    Ok(())
}
