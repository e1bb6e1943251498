use std::path::Path;
use std::sync::Arc;

use compensate_saga::{RollbackPolicy, Transaction};
use compensate_store::{DeleteCommand, InsertCommand, MemoryCollection};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CliError, Result};

/// One step of a plan file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase", deny_unknown_fields)]
pub(crate) enum Operation {
    Insert {
        document: Value,
        #[serde(default)]
        name: Option<String>,
    },
    Delete {
        id: String,
        #[serde(default)]
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Plan {
    operations: Vec<Operation>,
}

impl Plan {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let operations = serde_json::from_str(&content).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let plan = Self { operations };
        debug!(path = %path.display(), steps = plan.len(), "loaded plan");
        Ok(plan)
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.len()
    }

    /// Turn every operation into a command against `collection`, in plan order.
    pub(crate) fn into_transaction(
        self,
        name: Option<&str>,
        policy: RollbackPolicy,
        collection: &Arc<MemoryCollection>,
    ) -> Transaction {
        let mut transaction = match name {
            Some(name) => Transaction::named(name),
            None => Transaction::new(),
        }
        .with_rollback_policy(policy);

        for operation in self.operations {
            transaction = match operation {
                Operation::Insert { document, name } => {
                    let command = InsertCommand::new(document, Arc::clone(collection))
                        .on_success(|id: &String| info!(id = %id, "inserted"));
                    transaction.with(match name {
                        Some(name) => command.named(name),
                        None => command,
                    })
                }
                Operation::Delete { id, name } => {
                    let command = DeleteCommand::new(id, Arc::clone(collection));
                    transaction.with(match name {
                        Some(name) => command.named(name),
                        None => command,
                    })
                }
            };
        }
        transaction
    }
}
