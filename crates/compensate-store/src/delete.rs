use std::fmt;

use compensate_saga::{Command, CommandError, CommandState, Lifecycle};
use tracing::{info, warn};

use crate::collection::DocumentCollection;

/// Deletes one document by id; undo re-inserts the body that was removed.
///
/// Success callbacks receive the removed document.
pub struct DeleteCommand<C: DocumentCollection> {
    lifecycle: Lifecycle<C::Document>,
    document_id: C::Id,
    collection: C,
    deleted_document: Option<C::Document>,
}

impl<C: DocumentCollection> DeleteCommand<C> {
    #[must_use]
    pub fn new(document_id: C::Id, collection: C) -> Self {
        Self {
            lifecycle: Lifecycle::new("DeleteCommand"),
            document_id,
            collection,
            deleted_document: None,
        }
    }

    /// Register a success callback at construction time.
    #[must_use]
    pub fn on_success(mut self, callback: impl FnMut(&C::Document) + 'static) -> Self {
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

    pub fn add_success_callback(&mut self, callback: impl FnMut(&C::Document) + 'static) {
        self.lifecycle.add_success_callback(callback);
    }

    pub fn add_failure_callback(&mut self, callback: impl FnMut() + 'static) {
        self.lifecycle.add_failure_callback(callback);
    }

    #[must_use]
    pub fn document_id(&self) -> &C::Id {
        &self.document_id
    }

    /// Body removed by the last successful `execute()`, until it is restored.
    #[must_use]
    pub fn deleted_document(&self) -> Option<&C::Document> {
        self.deleted_document.as_ref()
    }

    fn remove_document(&self) -> Result<C::Document, CommandError> {
        self.lifecycle.begin_execute()?;
        info!(
            command = %self.lifecycle,
            id = ?self.document_id,
            collection = self.collection.name(),
            "deleting document"
        );
        self.collection
            .find_and_delete_document(&self.document_id)
            .map_err(|source| {
                warn!(command = %self.lifecycle, error = %source, "error during deleting document");
                CommandError::Collection {
                    command: self.lifecycle.to_string(),
                    operation: "delete document",
                    source: Box::new(source),
                }
            })
    }
}

impl<C: DocumentCollection> fmt::Display for DeleteCommand<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.lifecycle, f)
    }
}

impl<C: DocumentCollection> Command for DeleteCommand<C> {
    fn execute(&mut self) -> Result<(), CommandError> {
        match self.remove_document() {
            Ok(document) => {
                self.lifecycle.complete_execute(&document);
                self.deleted_document = Some(document);
                Ok(())
            }
            Err(error) => Err(self.lifecycle.fail_execute(error)),
        }
    }

    fn undo(&mut self) -> Result<(), CommandError> {
        self.lifecycle.begin_undo()?;
        let Some(document) = self.deleted_document.as_ref() else {
            return Err(CommandError::NotDone {
                command: self.to_string(),
            });
        };

        info!(
            command = %self.lifecycle,
            document = ?document,
            collection = self.collection.name(),
            "restoring document"
        );
        if let Err(source) = self.collection.insert_document(document) {
            warn!(command = %self.lifecycle, error = %source, "error during restoring document");
            return Err(CommandError::Collection {
                command: self.to_string(),
                operation: "restore document",
                source: Box::new(source),
            });
        }

        self.deleted_document = None;
        self.lifecycle.complete_undo();
        Ok(())
    }

    fn state(&self) -> CommandState {
        self.lifecycle.state()
    }
}
