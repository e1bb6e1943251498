use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document '{0}' already exists")]
    DuplicateId(String),

    #[error("document '{0}' not found")]
    NotFound(String),

    #[error("documents must be JSON objects")]
    NotAnObject,

    #[error("document id field must be a string")]
    InvalidId,
}
