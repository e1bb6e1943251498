use std::fmt;

use crate::action::Action;
use crate::command::{Command, CommandState};
use crate::error::{CommandError, Phase};
use crate::lifecycle::Lifecycle;

/// A command built from two user-supplied closures.
///
/// Either closure may be absent. A missing undo action makes the command
/// one-way: undoing it succeeds without doing anything.
///
/// ```
/// use compensate_saga::{Action, Command, CustomCommand};
///
/// let mut command = CustomCommand::new(Action::check(|| true), Action::Noop).named("touch");
/// assert!(command.execute().is_ok());
/// assert!(command.undo().is_ok());
/// ```
#[derive(Debug)]
pub struct CustomCommand {
    lifecycle: Lifecycle<()>,
    do_action: Action,
    undo_action: Action,
}

impl CustomCommand {
    #[must_use]
    pub fn new(do_action: Action, undo_action: Action) -> Self {
        Self {
            lifecycle: Lifecycle::new("CustomCommand"),
            do_action,
            undo_action,
        }
    }

    /// A command that cannot be meaningfully reversed.
    #[must_use]
    pub fn one_way(do_action: Action) -> Self {
        Self::new(do_action, Action::Noop)
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.lifecycle.set_name(name);
    }

    pub fn add_success_callback(&mut self, mut callback: impl FnMut() + 'static) {
        self.lifecycle.add_success_callback(move |_| callback());
    }

    pub fn add_failure_callback(&mut self, callback: impl FnMut() + 'static) {
        self.lifecycle.add_failure_callback(callback);
    }

    fn run_do_action(&mut self) -> Result<(), CommandError> {
        self.lifecycle.begin_execute()?;
        let label = self.lifecycle.to_string();
        self.do_action.invoke(&label, Phase::Execute)
    }
}

impl fmt::Display for CustomCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.lifecycle, f)
    }
}

impl Command for CustomCommand {
    fn execute(&mut self) -> Result<(), CommandError> {
        let outcome = self.run_do_action().map(|()| &());
        self.lifecycle.settle_execute(outcome)
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.lifecycle.begin_undo()?;
        let label = self.lifecycle.to_string();
        self.undo_action.invoke(&label, Phase::Undo)?;
        self.lifecycle.complete_undo();
        Ok(())
    }

    fn state(&self) -> CommandState {
        self.lifecycle.state()
    }
}
