use std::fmt;

use crate::error::CommandError;

/// Lifecycle state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandState {
    #[default]
    Pending,
    Done,
}

/// A unit of work that can be executed and undone.
///
/// `execute()` is only legal while the command is [`CommandState::Pending`]
/// and moves it to [`CommandState::Done`]; `undo()` is only legal while it is
/// done and moves it back. A call made in the wrong state is rejected with an
/// illegal-state error and has no effect on the command.
///
/// The `Display` impl renders the diagnostic label as `"[label]"`.
///
/// [`Transaction`](crate::Transaction) implements this trait as well, so
/// transactions can be nested inside other transactions.
pub trait Command: fmt::Display {
    /// Run the forward action.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is already done or the action fails.
    fn execute(&mut self) -> Result<(), CommandError>;

    /// Reverse a previous successful `execute()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is not done or the reverse action fails.
    fn undo(&mut self) -> Result<(), CommandError>;

    /// Current lifecycle state.
    fn state(&self) -> CommandState;

    fn is_done(&self) -> bool {
        self.state() == CommandState::Done
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn execute(&mut self) -> Result<(), CommandError> {
        (**self).execute()
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        (**self).undo()
    }

    fn state(&self) -> CommandState {
        (**self).state()
    }
}
