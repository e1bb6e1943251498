use std::sync::{PoisonError, RwLock};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::collection::DocumentCollection;
use crate::error::StoreError;

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// An in-process collection of JSON object documents keyed by string id.
///
/// Documents keep their insertion order. A document inserted with a string
/// `"_id"` field is stored under that id, so a deleted document restored by
/// an undo comes back under the id it had. Documents without one get a fresh
/// UUID written into `"_id"`.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<IndexMap<String, Value>>,
}

impl MemoryCollection {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(IndexMap::new()),
        }
    }

    /// Build a collection from existing documents, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a document is not an object, has a non-string id,
    /// or repeats an id.
    pub fn from_documents(
        name: impl Into<String>,
        documents: impl IntoIterator<Item = Value>,
    ) -> Result<Self, StoreError> {
        let collection = Self::new(name);
        for document in documents {
            collection.insert_document(&document)?;
        }
        Ok(collection)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.read().get(id).cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Snapshot of every document, in insertion order.
    #[must_use]
    pub fn documents(&self) -> Vec<Value> {
        self.read().values().cloned().collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, IndexMap<String, Value>> {
        self.documents.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, IndexMap<String, Value>> {
        self.documents.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DocumentCollection for MemoryCollection {
    type Id = String;
    type Document = Value;
    type Error = StoreError;

    fn name(&self) -> &str {
        &self.name
    }

    fn insert_document(&self, document: &Value) -> Result<String, StoreError> {
        let Value::Object(fields) = document else {
            return Err(StoreError::NotAnObject);
        };
        let id = match fields.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            Some(_) => return Err(StoreError::InvalidId),
            None => Uuid::new_v4().to_string(),
        };

        let mut documents = self.write();
        if documents.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        let mut stored = fields.clone();
        stored.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        documents.insert(id.clone(), Value::Object(stored));
        debug!(collection = %self.name, id = %id, "stored document");
        Ok(id)
    }

    fn delete_document(&self, id: &String) -> Result<(), StoreError> {
        self.find_and_delete_document(id).map(|_| ())
    }

    fn find_and_delete_document(&self, id: &String) -> Result<Value, StoreError> {
        let removed = self
            .write()
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        debug!(collection = %self.name, id = %id, "removed document");
        Ok(removed)
    }
}
