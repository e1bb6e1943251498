use std::fmt;

use thiserror::Error;

/// Boxed error produced by user actions and collection collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which half of a command was running when something went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Execute,
    Undo,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Execute => f.write_str("execute"),
            Self::Undo => f.write_str("undo"),
        }
    }
}

/// Error from a failed compensation during rollback.
#[derive(Debug, Error)]
#[error("compensation failed for step '{step}'")]
pub struct CompensationError {
    /// Label of the command whose `undo()` failed.
    pub step: String,
    /// The underlying error.
    #[source]
    pub error: CommandError,
}

/// Error from executing or undoing a command.
///
/// Command labels are carried in their rendered form (`"[label]"`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CommandError {
    /// `execute()` was called on a command that is already done.
    #[error("{command} is already done")]
    AlreadyDone { command: String },

    /// `undo()` was called on a command that is not done.
    #[error("{command} cannot be undone before it is done")]
    NotDone { command: String },

    /// A user action ran and reported failure.
    #[error("{command} {phase} action failed")]
    ActionFailed {
        command: String,
        phase: Phase,
        #[source]
        source: BoxError,
    },

    /// A user action panicked. The panic was caught at the command boundary.
    #[error("{command} {phase} action panicked: {message}")]
    ActionPanicked {
        command: String,
        phase: Phase,
        message: String,
    },

    /// The document collection refused the mutation.
    #[error("{command} could not {operation}")]
    Collection {
        command: String,
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// A transaction step failed and every compensation succeeded.
    #[error("{transaction} failed at step {step}")]
    StepFailed {
        transaction: String,
        step: String,
        #[source]
        source: Box<CommandError>,
    },

    /// A transaction step failed and rollback did not complete.
    #[error(
        "{transaction} failed at step {failed_step}, and {} compensation(s) also failed",
        compensation_errors.len()
    )]
    CompensationFailed {
        transaction: String,
        failed_step: String,
        #[source]
        step_error: Box<CommandError>,
        compensation_errors: Vec<CompensationError>,
    },

    /// An explicit rollback of a transaction did not complete.
    #[error(
        "rollback of {transaction} incomplete: {} compensation(s) failed",
        compensation_errors.len()
    )]
    RollbackFailed {
        transaction: String,
        compensation_errors: Vec<CompensationError>,
    },

    /// A command was added to a transaction that already holds completed commands.
    #[error("cannot add {command} to {transaction} after it has run")]
    Sealed {
        transaction: String,
        command: String,
    },
}

impl CommandError {
    /// Whether the call was rejected because of the command's current state.
    #[must_use]
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self,
            Self::AlreadyDone { .. } | Self::NotDone { .. } | Self::Sealed { .. }
        )
    }

    /// Whether some completed work could not be compensated.
    ///
    /// When this is `true` the caller must not assume the prior state was restored.
    #[must_use]
    pub fn is_rollback_incomplete(&self) -> bool {
        matches!(
            self,
            Self::CompensationFailed { .. } | Self::RollbackFailed { .. }
        )
    }

    /// Failed compensations carried by this error, if any.
    #[must_use]
    pub fn compensation_errors(&self) -> &[CompensationError] {
        match self {
            Self::CompensationFailed {
                compensation_errors,
                ..
            }
            | Self::RollbackFailed {
                compensation_errors,
                ..
            } => compensation_errors,
            _ => &[],
        }
    }
}

/// Error from looking up a transaction by key.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid transaction name '{0}': only letters, digits and '_' are allowed")]
    InvalidName(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(Phase::Execute.to_string(), "execute");
        assert_eq!(Phase::Undo.to_string(), "undo");
    }

    #[test]
    fn already_done_message_includes_label() {
        let err = CommandError::AlreadyDone {
            command: "[InsertCommand]".to_string(),
        };

        assert_eq!(err.to_string(), "[InsertCommand] is already done");
        assert!(err.is_illegal_state());
        assert!(!err.is_rollback_incomplete());
    }

    #[test]
    fn compensation_failed_message_counts_failures() {
        let err = CommandError::CompensationFailed {
            transaction: "[tr]".to_string(),
            failed_step: "[b]".to_string(),
            step_error: Box::new(CommandError::NotDone {
                command: "[b]".to_string(),
            }),
            compensation_errors: vec![CompensationError {
                step: "[a]".to_string(),
                error: CommandError::NotDone {
                    command: "[a]".to_string(),
                },
            }],
        };

        assert_eq!(
            err.to_string(),
            "[tr] failed at step [b], and 1 compensation(s) also failed"
        );
        assert!(err.is_rollback_incomplete());
        assert_eq!(err.compensation_errors().len(), 1);
    }

    #[test]
    fn step_failed_has_source_chain() {
        let err = CommandError::StepFailed {
            transaction: "[tr]".to_string(),
            step: "[a]".to_string(),
            source: Box::new(CommandError::ActionPanicked {
                command: "[a]".to_string(),
                phase: Phase::Execute,
                message: "boom".to_string(),
            }),
        };

        let source = std::error::Error::source(&err);

        assert!(source.is_some());
        assert!(err.compensation_errors().is_empty());
    }

    #[test]
    fn action_failed_exposes_user_error_as_source() {
        let err = CommandError::ActionFailed {
            command: "[CustomCommand]".to_string(),
            phase: Phase::Undo,
            source: "disk full".into(),
        };

        let source = std::error::Error::source(&err).map(ToString::to_string);

        assert_eq!(source.as_deref(), Some("disk full"));
        assert_eq!(err.to_string(), "[CustomCommand] undo action failed");
    }
}
