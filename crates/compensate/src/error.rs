use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}'")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration in '{path}'")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid store '{path}'")]
    Store {
        path: PathBuf,
        #[source]
        source: compensate_store::StoreError,
    },

    #[error("failed to serialize store")]
    Serialize(#[source] serde_json::Error),

    #[error("transaction failed")]
    Transaction(#[from] compensate_saga::CommandError),
}

pub type Result<T> = std::result::Result<T, CliError>;
