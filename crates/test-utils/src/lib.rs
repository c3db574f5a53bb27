//! # Test Utilities for PassTrust
//!
//! Hard-coded provider trait implementations backing the endpoint tests.
//! Keys are fixed so DIDs and signatures are stable across runs.
//!
//! This crate provides common utilities for the PassTrust project and is
//! not intended to be used directly.

pub mod holder;
pub mod issuer;
pub mod store;
pub mod verifier;

use std::sync::{Arc, Mutex, Once, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use passtrust_core::jose::jwk::PublicKeyJwk;
use passtrust_core::keys::SigningKeypair;
use passtrust_core::signature::{Algorithm, Signer};
use passtrust_openid::provider;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

// initalise tracing once for all tests
static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// # Panics
///
/// Panics if the tracing subscriber cannot be set.
pub fn init_tracer() {
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::ERROR).finish();
        tracing::subscriber::set_global_default(subscriber).expect("subscriber set");
    });
}

/// A test clock frozen at construction. Clones share the offset, so
/// advancing any clone advances them all.
#[derive(Clone, Debug)]
pub struct Clock {
    start: DateTime<Utc>,
    offset: Arc<Mutex<TimeDelta>>,
}

impl Clock {
    /// A clock frozen at the current instant.
    #[must_use]
    pub fn frozen() -> Self {
        Self {
            start: Utc::now(),
            offset: Arc::new(Mutex::new(TimeDelta::zero())),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += delta;
    }

    /// The clock's current instant.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        let offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.start + *offset
    }
}

impl provider::Clock for Clock {
    fn now(&self) -> DateTime<Utc> {
        Self::now(self)
    }
}

/// A [`Signer`] over a fixed keypair, naming its verification method under
/// the given DID.
#[derive(Clone, Debug)]
pub struct Keystore {
    keypair: SigningKeypair,
    verification_method: String,
}

impl Keystore {
    /// Bind a keypair to a DID. The verification method is the DID's first
    /// key.
    #[must_use]
    pub fn new(keypair: SigningKeypair, did: &str) -> Self {
        Self {
            keypair,
            verification_method: format!("{did}#0"),
        }
    }

    /// The public half of the keystore's keypair.
    #[must_use]
    pub fn public_jwk(&self) -> PublicKeyJwk {
        self.keypair.public_jwk()
    }
}

impl Signer for Keystore {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDSA
    }

    fn verification_method(&self) -> String {
        self.verification_method.clone()
    }

    async fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.keypair.try_sign(msg)
    }

    async fn verifying_key(&self) -> anyhow::Result<PublicKeyJwk> {
        Ok(self.keypair.public_jwk())
    }
}
