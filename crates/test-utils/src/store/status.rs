//! In-memory credential status records.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use passtrust_openid::issuer::StatusRecord;
use passtrust_openid::provider::{Result, StatusStore};

/// An in-memory status store.
#[derive(Clone, Debug, Default)]
pub struct Store {
    store: Arc<Mutex<HashMap<String, StatusRecord>>>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusStore for Store {
    async fn status(&self, credential_id: &str) -> Result<Option<StatusRecord>> {
        Ok(self.store.lock().unwrap_or_else(PoisonError::into_inner).get(credential_id).cloned())
    }

    async fn put_status(&self, record: &StatusRecord) -> Result<()> {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.credential_id.clone(), record.clone());
        Ok(())
    }
}
