//! In-memory session state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use passtrust_openid::provider::Result;

/// An in-memory state store. Expiry is recorded but never enforced, so
/// tests control staleness through the provider clock instead.
#[derive(Clone, Debug, Default)]
pub struct Store {
    store: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store state under the provided key.
    ///
    /// # Errors
    ///
    /// Does not error.
    pub fn put(&self, key: &str, data: Vec<u8>, _expiry: DateTime<Utc>) -> Result<()> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_string(), data);
        Ok(())
    }

    /// Retrieve state stored under the provided key.
    ///
    /// # Errors
    ///
    /// Returns an error if no state is stored under the key.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("state not found for key: {key}"))
    }

    /// Remove state stored under the provided key.
    ///
    /// # Errors
    ///
    /// Does not error.
    pub fn purge(&self, key: &str) -> Result<()> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}
