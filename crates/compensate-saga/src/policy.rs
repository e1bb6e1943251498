use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What a rollback does when one of its compensations fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackPolicy {
    /// Stop at the first failed compensation. Earlier commands stay done.
    #[default]
    FailFast,
    /// Attempt every compensation and report all failures.
    ///
    /// Commands whose undo failed stay done and are retried by the next rollback.
    ContinueOnFailure,
}
