use std::fmt;

use compensate_saga::{Command, CommandError, CommandState, Lifecycle};
use tracing::{info, warn};

use crate::collection::DocumentCollection;

/// Inserts one document; undo deletes it again by the id the collection assigned.
///
/// Success callbacks receive the assigned id.
pub struct InsertCommand<C: DocumentCollection> {
    lifecycle: Lifecycle<C::Id>,
    document: C::Document,
    collection: C,
    inserted_id: Option<C::Id>,
}

impl<C: DocumentCollection> InsertCommand<C> {
    #[must_use]
    pub fn new(document: C::Document, collection: C) -> Self {
        Self {
            lifecycle: Lifecycle::new("InsertCommand"),
            document,
            collection,
            inserted_id: None,
        }
    }

    /// Register a success callback at construction time.
    #[must_use]
    pub fn on_success(mut self, callback: impl FnMut(&C::Id) + 'static) -> Self {
        self.add_success_callback(callback);
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.lifecycle.set_name(name);
    }

    pub fn add_success_callback(&mut self, callback: impl FnMut(&C::Id) + 'static) {
        self.lifecycle.add_success_callback(callback);
    }

    pub fn add_failure_callback(&mut self, callback: impl FnMut() + 'static) {
        self.lifecycle.add_failure_callback(callback);
    }

    #[must_use]
    pub fn document(&self) -> &C::Document {
        &self.document
    }

    /// Id assigned by the last successful `execute()`, until it is undone.
    #[must_use]
    pub fn inserted_id(&self) -> Option<&C::Id> {
        self.inserted_id.as_ref()
    }

    fn store_document(&self) -> Result<C::Id, CommandError> {
        self.lifecycle.begin_execute()?;
        info!(
            command = %self.lifecycle,
            document = ?self.document,
            collection = self.collection.name(),
            "inserting document"
        );
        self.collection
            .insert_document(&self.document)
            .map_err(|source| {
                warn!(command = %self.lifecycle, error = %source, "error during inserting document");
                CommandError::Collection {
                    command: self.lifecycle.to_string(),
                    operation: "insert document",
                    source: Box::new(source),
                }
            })
    }
}

impl<C: DocumentCollection> fmt::Display for InsertCommand<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.lifecycle, f)
    }
}

impl<C: DocumentCollection> Command for InsertCommand<C> {
    fn execute(&mut self) -> Result<(), CommandError> {
        match self.store_document() {
            Ok(id) => {
                self.lifecycle.complete_execute(&id);
                self.inserted_id = Some(id);
                Ok(())
            }
            Err(error) => Err(self.lifecycle.fail_execute(error)),
        }
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.lifecycle.begin_undo()?;
        let Some(id) = self.inserted_id.as_ref() else {
            return Err(CommandError::NotDone {
                command: self.to_string(),
            });
        };

        info!(
            command = %self.lifecycle,
            id = ?id,
            collection = self.collection.name(),
            "withdrawing document"
        );
        if let Err(source) = self.collection.delete_document(id) {
            warn!(command = %self.lifecycle, error = %source, "error during withdrawing document");
            return Err(CommandError::Collection {
                command: self.to_string(),
                operation: "withdraw document",
                source: Box::new(source),
            });
        }

        self.inserted_id = None;
        self.lifecycle.complete_undo();
        Ok(())
    }

    fn state(&self) -> CommandState {
        self.lifecycle.state()
    }
}
