//! In-memory issuance log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use passtrust_openid::issuer::IssuanceRecord;
use passtrust_openid::provider::Result;

/// An in-memory issuance log keyed by credential id.
#[derive(Clone, Debug, Default)]
pub struct Log {
    store: Arc<Mutex<HashMap<String, IssuanceRecord>>>,
}

impl Log {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Does not error.
    pub fn add(&self, record: &IssuanceRecord) -> Result<()> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.credential_id.clone(), record.clone());
        Ok(())
    }

    /// The record for a credential, if one was logged.
    #[must_use]
    pub fn get(&self, credential_id: &str) -> Option<IssuanceRecord> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner).get(credential_id).cloned()
    }
}
