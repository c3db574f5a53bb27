//! Scriptable issuer trust registry.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use passtrust_openid::provider::{Result, TrustRegistry};

/// An in-memory trust registry. No issuer is trusted until added, and
/// [`Registry::set_failing`] simulates an outage.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    trusted: Arc<Mutex<HashSet<String>>>,
    failing: Arc<AtomicBool>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an issuer as trusted.
    pub fn trust(&self, issuer_did: &str) {
        self.trusted.lock().unwrap_or_else(PoisonError::into_inner).insert(issuer_did.to_string());
    }

    /// Remove an issuer's trusted marking.
    pub fn distrust(&self, issuer_did: &str) {
        self.trusted.lock().unwrap_or_else(PoisonError::into_inner).remove(issuer_did);
    }

    /// Make every lookup fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl TrustRegistry for Registry {
    async fn is_trusted(&self, issuer_did: &str) -> Result<bool> {
        if self.failing.load(Ordering::Acquire) {
            bail!("trust registry unavailable");
        }
        Ok(self.trusted.lock().unwrap_or_else(PoisonError::into_inner).contains(issuer_did))
    }
}
