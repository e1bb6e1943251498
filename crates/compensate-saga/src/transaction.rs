use std::fmt;

use tracing::{debug, error, info, warn};

use crate::audit::{StepStatus, TransactionAuditLog};
use crate::command::{Command, CommandState};
use crate::error::{CommandError, CompensationError};
use crate::policy::RollbackPolicy;

/// Observable state of a transaction, derived from its command lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Nothing is done: either never run, fully rolled back, or empty.
    Pending,
    /// Every command executed successfully.
    Committed,
    /// A rollback stopped early; some commands are still done.
    RollbackHalted,
}

/// An ordered group of commands executed with reverse-order compensation.
///
/// `execute()` runs the commands in insertion order. When one fails, the
/// commands completed so far are undone in reverse order and the error is
/// returned. `undo()` rolls back a committed transaction the same way.
///
/// Under [`RollbackPolicy::FailFast`] a failed undo halts the rollback and
/// leaves every earlier command done. Those commands remain tracked, so a
/// later `undo()` retries exactly the ones left behind.
///
/// A failing step that still reports itself done, such as a nested
/// transaction whose own rollback halted, is tracked the same way and is
/// the first command compensated.
///
/// A transaction is itself a [`Command`] and can be nested in another one.
pub struct Transaction {
    name: Option<String>,
    policy: RollbackPolicy,
    commands: Vec<Box<dyn Command>>,
    done: Vec<usize>,
    committed: bool,
    audit_log: TransactionAuditLog,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            policy: RollbackPolicy::default(),
            commands: Vec::new(),
            done: Vec::new(),
            committed: false,
            audit_log: TransactionAuditLog::new(),
        }
    }

    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let mut transaction = Self::new();
        transaction.set_name(name);
        transaction
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    #[must_use]
    pub fn with_rollback_policy(mut self, policy: RollbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn set_rollback_policy(&mut self, policy: RollbackPolicy) {
        self.policy = policy;
    }

    #[must_use]
    pub fn rollback_policy(&self) -> RollbackPolicy {
        self.policy
    }

    /// Append a command to the end of the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Sealed`] if the transaction currently holds
    /// completed commands.
    pub fn add(&mut self, command: impl Command + 'static) -> Result<&mut Self, CommandError> {
        if self.state() != TransactionState::Pending {
            warn!(transaction = %self, command = %command, "transaction already ran; command rejected");
            return Err(CommandError::Sealed {
                transaction: self.to_string(),
                command: command.to_string(),
            });
        }
        debug!(transaction = %self, command = %command, "adding command");
        self.commands.push(Box::new(command));
        Ok(self)
    }

    /// Builder form of [`add`](Self::add) for a transaction under construction.
    ///
    /// # Panics
    ///
    /// Panics if the transaction currently holds completed commands; use
    /// [`add`](Self::add) to handle that case as an error.
    #[must_use]
    #[track_caller]
    pub fn with(mut self, command: impl Command + 'static) -> Self {
        if let Err(error) = self.add(command) {
            panic!("{error}");
        }
        self
    }

    #[must_use]
    pub fn state(&self) -> TransactionState {
        if self.committed {
            TransactionState::Committed
        } else if self.done.is_empty() {
            TransactionState::Pending
        } else {
            TransactionState::RollbackHalted
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands whose effects are currently in place.
    #[must_use]
    pub fn done_count(&self) -> usize {
        self.done.len()
    }

    /// Labels of the commands currently done, in execution order.
    #[must_use]
    pub fn done_labels(&self) -> Vec<String> {
        self.done
            .iter()
            .map(|&index| self.commands[index].to_string())
            .collect()
    }

    /// Audit log of the most recent `execute()` and any rollback after it.
    #[must_use]
    pub fn audit_log(&self) -> &TransactionAuditLog {
        &self.audit_log
    }

    fn run_commands(&mut self, label: &str) -> Result<(), (String, CommandError)> {
        for index in 0..self.commands.len() {
            let command = &mut self.commands[index];
            let step = command.to_string();
            self.audit_log.begin(index, &step);
            debug!(transaction = label, step = %step, "executing step");

            if let Err(error) = command.execute() {
                self.audit_log.settle_last(StepStatus::Failed);
                error!(transaction = label, step = %step, %error, "step failed");
                // A nested transaction whose own rollback halted still has work in place.
                if command.is_done() {
                    warn!(transaction = label, step = %step, "failed step left work in place");
                    self.done.push(index);
                }
                return Err((step, error));
            }
            self.audit_log.settle_last(StepStatus::Done);
            self.done.push(index);
        }
        Ok(())
    }

    /// Undo done commands newest first, honoring the rollback policy.
    fn compensate(&mut self, label: &str) -> Vec<CompensationError> {
        let mut compensation_errors = Vec::new();
        let mut retained = Vec::new();

        while let Some(index) = self.done.pop() {
            let command = &mut self.commands[index];
            let step = command.to_string();
            debug!(transaction = label, step = %step, "undoing step");

            match command.undo() {
                Ok(()) => {
                    self.audit_log.settle(index, StepStatus::Undone);
                }
                Err(error) => {
                    self.audit_log.settle(index, StepStatus::UndoRefused);
                    error!(fatal = true, transaction = label, step = %step, %error, "could not undo command");
                    compensation_errors.push(CompensationError { step, error });
                    match self.policy {
                        RollbackPolicy::FailFast => {
                            self.done.push(index);
                            break;
                        }
                        RollbackPolicy::ContinueOnFailure => retained.push(index),
                    }
                }
            }
        }

        retained.reverse();
        self.done.extend(retained);
        if !self.done.is_empty() {
            error!(
                fatal = true,
                transaction = label,
                remaining = self.done.len(),
                "rollback incomplete"
            );
        }
        compensation_errors
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name.as_deref().unwrap_or("tr"))
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("name", &self.to_string())
            .field("policy", &self.policy)
            .field("commands", &self.commands.len())
            .field("done", &self.done)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Command for Transaction {
    fn execute(&mut self) -> Result<(), CommandError> {
        let label = self.to_string();
        if self.state() != TransactionState::Pending {
            warn!(transaction = %label, state = ?self.state(), "transaction cannot run in this state");
            return Err(CommandError::AlreadyDone { command: label });
        }

        info!(transaction = %label, commands = self.commands.len(), "starting transaction");
        self.audit_log = TransactionAuditLog::new();

        match self.run_commands(&label) {
            Ok(()) => {
                self.committed = true;
                info!(transaction = %label, "transaction committed");
                Ok(())
            }
            Err((step, step_error)) => {
                error!(transaction = %label, done = self.done.len(), "could not finalize transaction; rolling back");
                let compensation_errors = self.compensate(&label);
                if compensation_errors.is_empty() {
                    Err(CommandError::StepFailed {
                        transaction: label,
                        step,
                        source: Box::new(step_error),
                    })
                } else {
                    Err(CommandError::CompensationFailed {
                        transaction: label,
                        failed_step: step,
                        step_error: Box::new(step_error),
                        compensation_errors,
                    })
                }
            }
        }
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        let label = self.to_string();
        if self.state() == TransactionState::Pending {
            warn!(transaction = %label, "nothing to roll back");
            return Err(CommandError::NotDone { command: label });
        }

        info!(transaction = %label, done = self.done.len(), "rolling back transaction");
        self.committed = false;
        let compensation_errors = self.compensate(&label);
        if compensation_errors.is_empty() {
            info!(transaction = %label, "transaction rolled back");
            Ok(())
        } else {
            Err(CommandError::RollbackFailed {
                transaction: label,
                compensation_errors,
            })
        }
    }

    fn state(&self) -> CommandState {
        match Transaction::state(self) {
            TransactionState::Pending => CommandState::Pending,
            TransactionState::Committed | TransactionState::RollbackHalted => CommandState::Done,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::action::Action;
    use crate::audit::StepStatus;
    use crate::custom::CustomCommand;

    type Journal = Rc<RefCell<Vec<String>>>;

    fn step(journal: &Journal, name: &'static str) -> CustomCommand {
        let on_do = Rc::clone(journal);
        let on_undo = Rc::clone(journal);
        CustomCommand::new(
            Action::check(move || {
                on_do.borrow_mut().push(format!("do {name}"));
                true
            }),
            Action::check(move || {
                on_undo.borrow_mut().push(format!("undo {name}"));
                true
            }),
        )
        .named(name)
    }

    fn failing(journal: &Journal, name: &'static str) -> CustomCommand {
        let on_do = Rc::clone(journal);
        CustomCommand::one_way(Action::check(move || {
            on_do.borrow_mut().push(format!("fail {name}"));
            false
        }))
        .named(name)
    }

    fn stuck(journal: &Journal, name: &'static str) -> CustomCommand {
        let on_do = Rc::clone(journal);
        let on_undo = Rc::clone(journal);
        CustomCommand::new(
            Action::check(move || {
                on_do.borrow_mut().push(format!("do {name}"));
                true
            }),
            Action::check(move || {
                on_undo.borrow_mut().push(format!("stuck {name}"));
                false
            }),
        )
        .named(name)
    }

    #[test]
    fn commits_when_every_command_succeeds() -> anyhow::Result<()> {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(step(&journal, "a"))
            .with(step(&journal, "b"));

        transaction.execute()?;

        assert_eq!(*journal.borrow(), vec!["do a", "do b"]);
        assert_eq!(transaction.state(), TransactionState::Committed);
        assert_eq!(transaction.done_labels(), vec!["[a]", "[b]"]);
        Ok(())
    }

    #[test]
    fn empty_transaction_commits() -> anyhow::Result<()> {
        let mut transaction = Transaction::new();

        transaction.execute()?;

        assert_eq!(transaction.state(), TransactionState::Committed);
        Ok(())
    }

    #[test]
    fn failure_undoes_completed_commands_in_reverse() {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(step(&journal, "a"))
            .with(step(&journal, "b"))
            .with(failing(&journal, "c"))
            .with(step(&journal, "d"));

        let err = transaction.execute().expect_err("should fail");

        assert!(matches!(&err, CommandError::StepFailed { step, .. } if step == "[c]"));
        assert_eq!(
            *journal.borrow(),
            vec!["do a", "do b", "fail c", "undo b", "undo a"]
        );
        assert_eq!(transaction.state(), TransactionState::Pending);
        assert_eq!(transaction.done_count(), 0);
    }

    #[test]
    fn fail_fast_rollback_stops_at_first_failed_undo() {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(step(&journal, "a"))
            .with(stuck(&journal, "b"))
            .with(step(&journal, "c"))
            .with(failing(&journal, "d"));

        let err = transaction.execute().expect_err("should fail");

        assert!(err.is_rollback_incomplete());
        assert_eq!(err.compensation_errors()[0].step, "[b]");
        assert_eq!(
            *journal.borrow(),
            vec!["do a", "do b", "do c", "fail d", "undo c", "stuck b"]
        );
        assert_eq!(transaction.state(), TransactionState::RollbackHalted);
        assert_eq!(transaction.done_labels(), vec!["[a]", "[b]"]);
    }

    #[test]
    fn continue_on_failure_attempts_every_undo() {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with_rollback_policy(RollbackPolicy::ContinueOnFailure)
            .with(step(&journal, "a"))
            .with(stuck(&journal, "b"))
            .with(failing(&journal, "c"));

        let err = transaction.execute().expect_err("should fail");

        assert_eq!(err.compensation_errors().len(), 1);
        assert_eq!(
            *journal.borrow(),
            vec!["do a", "do b", "fail c", "stuck b", "undo a"]
        );
        assert_eq!(transaction.done_labels(), vec!["[b]"]);
    }

    #[test]
    fn halted_rollback_can_be_retried() {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(step(&journal, "a"))
            .with(stuck(&journal, "b"))
            .with(failing(&journal, "c"));

        assert!(transaction.execute().is_err());
        journal.borrow_mut().clear();

        let err = transaction.undo().expect_err("b still cannot be undone");

        assert!(matches!(err, CommandError::RollbackFailed { .. }));
        assert_eq!(*journal.borrow(), vec!["stuck b"]);
        assert_eq!(transaction.state(), TransactionState::RollbackHalted);
    }

    #[test]
    fn execute_is_rejected_while_rollback_is_halted() {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(stuck(&journal, "a"))
            .with(failing(&journal, "b"));

        assert!(transaction.execute().is_err());
        let err = transaction.execute().expect_err("should be rejected");

        assert!(matches!(err, CommandError::AlreadyDone { .. }));
    }

    #[test]
    fn undo_rolls_back_a_committed_transaction() -> anyhow::Result<()> {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(step(&journal, "a"))
            .with(step(&journal, "b"));

        transaction.execute()?;
        transaction.undo()?;

        assert_eq!(*journal.borrow(), vec!["do a", "do b", "undo b", "undo a"]);
        assert_eq!(transaction.state(), TransactionState::Pending);
        Ok(())
    }

    #[test]
    fn undo_before_execute_is_rejected() {
        let mut transaction = Transaction::new();

        let err = transaction.undo().expect_err("should be rejected");

        assert!(matches!(err, CommandError::NotDone { command } if command == "[tr]"));
    }

    #[test]
    fn execute_twice_is_rejected() -> anyhow::Result<()> {
        let journal = Journal::default();
        let mut transaction = Transaction::new().with(step(&journal, "a"));

        transaction.execute()?;
        let err = transaction.execute().expect_err("should be rejected");

        assert!(err.is_illegal_state());
        assert_eq!(*journal.borrow(), vec!["do a"]);
        Ok(())
    }

    #[test]
    fn add_is_rejected_after_commit() -> anyhow::Result<()> {
        let journal = Journal::default();
        let mut transaction = Transaction::new().with(step(&journal, "a"));
        transaction.execute()?;

        let err = transaction
            .add(step(&journal, "late"))
            .expect_err("should be sealed");

        assert!(matches!(err, CommandError::Sealed { .. }));
        assert_eq!(transaction.len(), 1);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "cannot add [late] to [tr] after it has run")]
    fn builder_refuses_command_after_commit() {
        let journal = Journal::default();
        let mut transaction = Transaction::new().with(step(&journal, "a"));
        transaction.execute().expect("commit");

        let _ = transaction.with(step(&journal, "late"));
    }

    #[test]
    fn add_is_allowed_again_after_full_rollback() -> anyhow::Result<()> {
        let journal = Journal::default();
        let mut transaction = Transaction::new().with(step(&journal, "a"));
        transaction.execute()?;
        transaction.undo()?;

        transaction.add(step(&journal, "b"))?;

        assert_eq!(transaction.len(), 2);
        Ok(())
    }

    #[test]
    fn audit_log_reflects_rollback() {
        let journal = Journal::default();
        let mut transaction = Transaction::new()
            .with(step(&journal, "a"))
            .with(failing(&journal, "b"))
            .with(step(&journal, "c"));

        assert!(transaction.execute().is_err());

        let records = transaction.audit_log().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].status, StepStatus::Undone);
        assert_eq!(records[1].status, StepStatus::Failed);
    }

    #[test]
    fn display_defaults_to_tr() {
        assert_eq!(Transaction::new().to_string(), "[tr]");
        assert_eq!(Transaction::named("foo_bar").to_string(), "[foo_bar]");
    }
}
