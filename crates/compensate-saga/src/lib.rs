//! Reversible commands grouped into compensating transactions.
//!
//! A [`Transaction`] runs an ordered list of [`Command`]s. If one of them
//! fails, the commands that already completed are undone in reverse order,
//! restoring the state observed before the transaction started. This is the
//! saga pattern for stores that have no native multi-operation transaction.
//!
//! Concrete commands share their pending/done state machine and callback
//! lists through [`Lifecycle`]. [`CustomCommand`] wraps a pair of closures;
//! store-backed commands live in their own crates and build on the same
//! pieces.

mod action;
mod audit;
mod command;
mod custom;
mod error;
mod lifecycle;
mod policy;
mod registry;
mod transaction;

pub use action::{Action, ActionRejected};
pub use audit::{StepRecord, StepStatus, TransactionAuditLog};
pub use command::{Command, CommandState};
pub use custom::CustomCommand;
pub use error::{BoxError, CommandError, CompensationError, Phase, RegistryError};
pub use lifecycle::Lifecycle;
pub use policy::RollbackPolicy;
pub use registry::TransactionRegistry;
pub use transaction::{Transaction, TransactionState};
