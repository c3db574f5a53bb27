//! Scriptable credential status authority.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use passtrust_openid::provider::{Result, StatusClient};

/// An in-memory status authority. Unknown credentials read as valid, and
/// [`Authority::set_failing`] simulates an outage.
#[derive(Clone, Debug, Default)]
pub struct Authority {
    revoked: Arc<Mutex<HashSet<String>>>,
    failing: Arc<AtomicBool>,
}

impl Authority {
    /// Create an authority with no revocations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a credential as revoked.
    pub fn revoke(&self, credential_id: &str) {
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(credential_id.to_string());
    }

    /// Make every lookup fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl StatusClient for Authority {
    async fn is_valid(&self, credential_id: &str) -> Result<bool> {
        if self.failing.load(Ordering::Acquire) {
            bail!("status authority unavailable");
        }
        Ok(!self.revoked.lock().unwrap_or_else(PoisonError::into_inner).contains(credential_id))
    }
}
