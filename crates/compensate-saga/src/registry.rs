use std::collections::HashMap;

use tracing::debug;

use crate::error::RegistryError;
use crate::transaction::Transaction;

/// Named transactions, created on first lookup.
///
/// Looking up the same key twice returns the same transaction, so separate
/// parts of a program can contribute commands to one unit of work by name.
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    transactions: HashMap<String, Transaction>,
}

impl TransactionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the transaction registered under `key`, creating it if needed.
    ///
    /// A newly created transaction is labelled with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidName`] unless `key` is a non-empty
    /// run of ASCII letters, digits and underscores.
    pub fn transaction(&mut self, key: &str) -> Result<&mut Transaction, RegistryError> {
        debug!(key, "looking up transaction");
        if !is_valid_name(key) {
            return Err(RegistryError::InvalidName(key.to_string()));
        }
        Ok(self
            .transactions
            .entry(key.to_string())
            .or_insert_with(|| Transaction::named(key)))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Transaction> {
        self.transactions.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.transactions.contains_key(key)
    }

    /// Take a transaction out of the registry, e.g. to dispose of it after use.
    pub fn remove(&mut self, key: &str) -> Option<Transaction> {
        self.transactions.remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

fn is_valid_name(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
