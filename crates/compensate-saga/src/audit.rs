use std::fmt;
use std::time::Instant;

/// Where a command stands after the transaction last touched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// `execute()` has been called and has not returned.
    Running,
    /// Executed; its effects are in place.
    Done,
    /// `execute()` returned an error.
    Failed,
    /// Compensated by `undo()`.
    Undone,
    /// `undo()` returned an error; its effects are still in place.
    UndoRefused,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Undone => "undone",
            Self::UndoRefused => "undo refused",
        })
    }
}

/// One command's entry in a [`TransactionAuditLog`].
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Position of the command in the transaction.
    pub index: usize,
    /// Label of the command when it was executed.
    pub name: String,
    pub status: StepStatus,
    pub started_at: Instant,
    pub completed_at: Option<Instant>,
}

/// Audit log of the last run of a transaction.
///
/// Steps that were never reached have no record. Compensations update the
/// record of the command they undo, so each command appears at most once.
#[derive(Debug, Clone, Default)]
pub struct TransactionAuditLog {
    records: Vec<StepRecord>,
}

impl TransactionAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin(&mut self, index: usize, name: &str) {
        self.records.push(StepRecord {
            index,
            name: name.to_string(),
            status: StepStatus::Running,
            started_at: Instant::now(),
            completed_at: None,
        });
    }

    /// Settle the step most recently begun.
    pub(crate) fn settle_last(&mut self, status: StepStatus) {
        if let Some(record) = self.records.last_mut() {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    pub(crate) fn settle(&mut self, index: usize, status: StepStatus) {
        if let Some(record) = self.records.iter_mut().find(|r| r.index == index) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Steps whose effects are still in place.
    #[must_use]
    pub fn outstanding(&self) -> Vec<&StepRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.status, StepStatus::Done | StepStatus::UndoRefused))
            .collect()
    }

    fn rolled_back(&self) -> bool {
        self.records.iter().any(|r| {
            matches!(
                r.status,
                StepStatus::Failed | StepStatus::Undone | StepStatus::UndoRefused
            )
        })
    }

    /// Numbered step lines followed by the outcome of the run.
    ///
    /// The outcome names the commands still in place when a rollback did not
    /// finish. An empty log renders as an empty string.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.records.is_empty() {
            return String::new();
        }

        let mut lines: Vec<String> = self
            .records
            .iter()
            .map(|r| format!("{}. {}: {}", r.index + 1, r.name, r.status))
            .collect();

        let outstanding = self.outstanding();
        lines.push(match (self.rolled_back(), outstanding.is_empty()) {
            (false, _) => "committed".to_string(),
            (true, true) => "rolled back".to_string(),
            (true, false) => {
                let labels: Vec<&str> = outstanding.iter().map(|r| r.name.as_str()).collect();
                format!(
                    "rollback incomplete, {} still in place: {}",
                    outstanding.len(),
                    labels.join(", ")
                )
            }
        });
        lines.join("\n")
    }
}
