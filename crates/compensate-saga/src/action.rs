use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::{BoxError, CommandError, Phase};

type ActionFn = Box<dyn FnMut() -> Result<(), BoxError>>;

/// Returned by [`Action::check`] closures that answered `false`.
#[derive(Debug, Error)]
#[error("action reported failure")]
pub struct ActionRejected;

/// A user-supplied zero-argument action, or nothing at all.
///
/// A missing action is vacuously successful, which lets one-way commands
/// take part in a rollback without failing it.
#[derive(Default)]
pub enum Action {
    #[default]
    Noop,
    Run(ActionFn),
}

impl Action {
    /// Wrap a fallible closure. An `Err` is a logical failure of the action.
    pub fn new<F, E>(mut action: F) -> Self
    where
        F: FnMut() -> Result<(), E> + 'static,
        E: Into<BoxError>,
    {
        Self::Run(Box::new(move || action().map_err(Into::into)))
    }

    /// Wrap a closure that reports success as a boolean.
    pub fn check<F>(mut action: F) -> Self
    where
        F: FnMut() -> bool + 'static,
    {
        Self::Run(Box::new(move || -> Result<(), BoxError> {
            if action() {
                Ok(())
            } else {
                Err(Box::new(ActionRejected))
            }
        }))
    }

    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }

    /// Run the action, converting a returned error or a panic into a [`CommandError`].
    pub(crate) fn invoke(&mut self, command: &str, phase: Phase) -> Result<(), CommandError> {
        let Self::Run(action) = self else {
            warn!(command, %phase, "nothing to {phase}");
            return Ok(());
        };

        info!(command, %phase, "running custom action");
        match panic::catch_unwind(AssertUnwindSafe(|| action())) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => {
                warn!(command, %phase, error = %source, "action reported failure");
                Err(CommandError::ActionFailed {
                    command: command.to_string(),
                    phase,
                    source,
                })
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(fatal = true, command, %phase, %message, "action panicked");
                Err(CommandError::ActionPanicked {
                    command: command.to_string(),
                    phase,
                    message,
                })
            }
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => f.write_str("Noop"),
            Self::Run(_) => f.write_str("Run(..)"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
