use std::fmt;

use tracing::{debug, info, warn};

use crate::command::CommandState;
use crate::error::CommandError;

type SuccessCallback<P> = Box<dyn FnMut(&P)>;
type FailureCallback = Box<dyn FnMut()>;

/// State machine and callback lists shared by concrete commands.
///
/// `P` is the payload handed to success callbacks: `()` for closures, the
/// assigned id for inserts, the removed document for deletes. Callbacks run
/// in registration order and persist across execute/undo cycles.
///
/// A concrete command drives its lifecycle like this:
///
/// 1. [`begin_execute`](Self::begin_execute) / [`begin_undo`](Self::begin_undo)
///    to reject calls made in the wrong state,
/// 2. its own action,
/// 3. [`complete_execute`](Self::complete_execute) or
///    [`fail_execute`](Self::fail_execute), or
///    [`complete_undo`](Self::complete_undo).
pub struct Lifecycle<P> {
    kind: &'static str,
    name: Option<String>,
    state: CommandState,
    success_callbacks: Vec<SuccessCallback<P>>,
    failure_callbacks: Vec<FailureCallback>,
}

impl<P> Lifecycle<P> {
    /// Create a pending lifecycle labelled with `kind` until a name is set.
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            name: None,
            state: CommandState::Pending,
            success_callbacks: Vec::new(),
            failure_callbacks: Vec::new(),
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The diagnostic label without brackets.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind)
    }

    #[must_use]
    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn add_success_callback(&mut self, callback: impl FnMut(&P) + 'static) {
        self.success_callbacks.push(Box::new(callback));
        debug!(
            command = %self,
            count = self.success_callbacks.len(),
            "registered success callback"
        );
    }

    pub fn add_failure_callback(&mut self, callback: impl FnMut() + 'static) {
        self.failure_callbacks.push(Box::new(callback));
        debug!(
            command = %self,
            count = self.failure_callbacks.len(),
            "registered failure callback"
        );
    }

    #[must_use]
    pub fn success_callback_count(&self) -> usize {
        self.success_callbacks.len()
    }

    #[must_use]
    pub fn failure_callback_count(&self) -> usize {
        self.failure_callbacks.len()
    }

    /// # Errors
    ///
    /// Returns [`CommandError::AlreadyDone`] unless the command is pending.
    pub fn begin_execute(&self) -> Result<(), CommandError> {
        if self.state == CommandState::Done {
            warn!(command = %self, "command already done");
            return Err(CommandError::AlreadyDone {
                command: self.to_string(),
            });
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CommandError::NotDone`] unless the command is done.
    pub fn begin_undo(&self) -> Result<(), CommandError> {
        if self.state == CommandState::Pending {
            warn!(command = %self, "cannot undo a command that is not done");
            return Err(CommandError::NotDone {
                command: self.to_string(),
            });
        }
        Ok(())
    }

    /// Mark the command done and run success callbacks with `payload`.
    pub fn complete_execute(&mut self, payload: &P) {
        self.state = CommandState::Done;
        info!(command = %self, "command done");
        let label = self.to_string();
        for (i, callback) in self.success_callbacks.iter_mut().enumerate() {
            debug!(command = %label, callback = i + 1, "running success callback");
            callback(payload);
        }
    }

    /// Run failure callbacks and hand the error back for propagation.
    ///
    /// The state is left unchanged.
    pub fn fail_execute(&mut self, error: CommandError) -> CommandError {
        let label = self.to_string();
        for (i, callback) in self.failure_callbacks.iter_mut().enumerate() {
            debug!(command = %label, callback = i + 1, "running failure callback");
            callback();
        }
        error
    }

    /// Mark the command pending again after a successful undo.
    pub fn complete_undo(&mut self) {
        self.state = CommandState::Pending;
        info!(command = %self, "command undone");
    }

    /// Settle an execute attempt: success moves to done, failure runs failure callbacks.
    ///
    /// # Errors
    ///
    /// Returns the error from `outcome` after running failure callbacks.
    pub fn settle_execute(&mut self, outcome: Result<&P, CommandError>) -> Result<(), CommandError> {
        match outcome {
            Ok(payload) => {
                self.complete_execute(payload);
                Ok(())
            }
            Err(error) => Err(self.fail_execute(error)),
        }
    }
}

impl<P> fmt::Display for Lifecycle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label())
    }
}

impl<P> fmt::Debug for Lifecycle<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("label", &self.label())
            .field("state", &self.state)
            .field("success_callbacks", &self.success_callbacks.len())
            .field("failure_callbacks", &self.failure_callbacks.len())
            .finish()
    }
}
