use std::fmt::Debug;
use std::sync::Arc;

/// The document store operations that reversible commands rely on.
///
/// Implementations own their concurrency discipline; commands call these
/// methods synchronously and never retry.
pub trait DocumentCollection {
    /// Identifier the collection assigns to stored documents.
    type Id: Clone + Debug + 'static;

    /// Document body.
    type Document: Clone + Debug + 'static;

    type Error: std::error::Error + Send + Sync + 'static;

    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Store `document`, returning the identifier it was stored under.
    ///
    /// # Errors
    ///
    /// Returns an error if the document was not stored. Nothing is assigned then.
    fn insert_document(&self, document: &Self::Document) -> Result<Self::Id, Self::Error>;

    /// Remove the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was removed.
    fn delete_document(&self, id: &Self::Id) -> Result<(), Self::Error>;

    /// Remove the document stored under `id` and return its body.
    ///
    /// # Errors
    ///
    /// Returns an error if the document could not be found or removed.
    fn find_and_delete_document(&self, id: &Self::Id) -> Result<Self::Document, Self::Error>;
}

impl<C: DocumentCollection + ?Sized> DocumentCollection for Arc<C> {
    type Id = C::Id;
    type Document = C::Document;
    type Error = C::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    fn insert_document(&self, document: &Self::Document) -> Result<Self::Id, Self::Error> {
        (**self).insert_document(document)
    }

    fn delete_document(&self, id: &Self::Id) -> Result<(), Self::Error> {
        (**self).delete_document(id)
    }

    fn find_and_delete_document(&self, id: &Self::Id) -> Result<Self::Document, Self::Error> {
        (**self).find_and_delete_document(id)
    }
}
