use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use compensate_saga::{Command, RollbackPolicy, Transaction};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::plan::Plan;
use crate::store;

#[derive(Args)]
pub(crate) struct ApplyArgs {
    /// JSON file holding an array of operations
    pub(crate) plan: PathBuf,

    /// JSON store file to mutate (created on commit if missing)
    #[arg(long)]
    pub(crate) store: PathBuf,

    /// Transaction name shown in logs and errors
    #[arg(long)]
    pub(crate) name: Option<String>,

    /// What to do when a compensation fails
    #[arg(long, value_enum)]
    pub(crate) rollback: Option<RollbackPolicy>,

    /// Run the plan and roll it back without writing the store
    #[arg(long)]
    pub(crate) dry_run: bool,
}

pub(crate) fn run(args: ApplyArgs, config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let name = args.name.or(config.transaction.name);
    let policy = args.rollback.unwrap_or(config.transaction.rollback);

    let collection = Arc::new(store::load(&args.store)?);
    let plan = Plan::load(&args.plan)?;
    let mut transaction = plan.into_transaction(name.as_deref(), policy, &collection);

    info!(transaction = %transaction, steps = transaction.len(), ?policy, "applying plan");
    let outcome = transaction.execute();
    print_summary(&transaction);
    outcome?;

    if args.dry_run {
        transaction.undo()?;
        println!("Dry run: {transaction} rolled back, store not written.");
        return Ok(());
    }

    store::save(&args.store, &collection)?;
    println!(
        "Committed {} step(s) to {}.",
        transaction.done_count(),
        args.store.display()
    );
    Ok(())
}

fn print_summary(transaction: &Transaction) {
    let summary = transaction.audit_log().summary();
    if summary.is_empty() {
        warn!(transaction = %transaction, "plan has no steps");
        return;
    }
    println!("{summary}");
}
