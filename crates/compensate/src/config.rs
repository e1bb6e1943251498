use std::path::{Path, PathBuf};

use compensate_saga::RollbackPolicy;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CliError, Result};

pub(crate) const DEFAULT_CONFIG_FILE: &str = "compensate.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) transaction: TransactionSettings,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TransactionSettings {
    pub(crate) name: Option<String>,
    pub(crate) rollback: RollbackPolicy,
}

impl Config {
    /// Load `explicit` if given, otherwise `./compensate.toml` when it exists.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub(crate) fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    debug!("no configuration file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };
        Self::from_file(&path)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
