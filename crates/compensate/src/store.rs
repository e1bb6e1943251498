use std::path::Path;

use compensate_store::MemoryCollection;
use serde_json::Value;
use tracing::info;

use crate::error::{CliError, Result};

/// Read a store file holding a JSON array of documents.
///
/// A missing file is an empty store.
pub(crate) fn load(path: &Path) -> Result<MemoryCollection> {
    let name = collection_name(path);
    if !path.exists() {
        info!(path = %path.display(), "store does not exist yet, starting empty");
        return Ok(MemoryCollection::new(name));
    }

    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let documents: Vec<Value> =
        serde_json::from_str(&content).map_err(|source| CliError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    MemoryCollection::from_documents(name, documents).map_err(|source| CliError::Store {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn save(path: &Path, collection: &MemoryCollection) -> Result<()> {
    let mut content =
        serde_json::to_string_pretty(&collection.documents()).map_err(CliError::Serialize)?;
    content.push('\n');
    std::fs::write(path, content).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), documents = collection.len(), "saved store");
    Ok(())
}

fn collection_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "store".to_string(), |stem| stem.to_string_lossy().into_owned())
}
