//! A provider backing the verification endpoint tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use passtrust_core::jose::jwk::PublicKeyJwk;
use passtrust_core::keys::SigningKeypair;
use passtrust_core::signature::{Algorithm, Signer, Verifier};
use passtrust_openid::provider::{
    CachedRegistry, CachedStatusClient, Challenge, ChallengeStore, Consumption, FailurePolicy,
    InMemoryChallengeStore, Result, StateStore, StatusClient, TrustRegistry, status_cache_ttl,
    trust_cache_ttl,
};
use passtrust_openid::verifier::{Metadata, Verifier as Config};
use serde_json::json;

use crate::store::{authority::Authority, registry::Registry, state};
use crate::{Clock, Keystore};

/// The verifier's DID, a `did:jwk` over the fixed verifier key.
pub const VERIFIER_DID: &str = "did:jwk:eyJjcnYiOiJFZDI1NTE5Iiwia3R5IjoiT0tQIiwieCI6Iko0RVhfQlJNY2pRUFo5RHlNVzZEaHM3X3Z5c2tLTW5GSC05OFdYOGRRbTQifQ";

/// A verifier provider over fixed keys, scriptable dependencies, and a
/// frozen clock.
#[derive(Clone, Debug)]
pub struct Provider {
    keystore: Keystore,
    state: state::Store,
    challenges: InMemoryChallengeStore,
    registry: Registry,
    trust: CachedRegistry<Registry, Clock>,
    authority: Authority,
    revocation: CachedStatusClient<Authority, Clock>,
    keys: Arc<Mutex<HashMap<String, PublicKeyJwk>>>,
    clock: Clock,
    revocation_policy: FailurePolicy,
}

impl Provider {
    /// Create a provider with empty stores and default failure policies.
    ///
    /// # Panics
    ///
    /// Panics if the embedded verifier JWK fails to load.
    #[must_use]
    pub fn new() -> Self {
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "J4EX_BRMcjQPZ9DyMW6Dhs7_vyskKMnFH-98WX8dQm4",
            "d": "9eV2fPFTMZUXYw8iaHa4bIFgzFg7wBN0TGvyVfXMDuU",
        });
        let keypair = SigningKeypair::from_jwk(&jwk).expect("verifier key is valid");

        let clock = Clock::frozen();
        let registry = Registry::new();
        let authority = Authority::new();

        Self {
            keystore: Keystore::new(keypair, VERIFIER_DID),
            state: state::Store::new(),
            challenges: InMemoryChallengeStore::new(),
            trust: CachedRegistry::new(registry.clone(), clock.clone(), trust_cache_ttl()),
            registry,
            revocation: CachedStatusClient::new(
                authority.clone(),
                clock.clone(),
                status_cache_ttl(),
            ),
            authority,
            keys: Arc::new(Mutex::new(HashMap::new())),
            clock,
            revocation_policy: FailurePolicy::FailOpen,
        }
    }

    /// Override the revocation gate's failure policy.
    #[must_use]
    pub fn with_revocation_policy(mut self, policy: FailurePolicy) -> Self {
        self.revocation_policy = policy;
        self
    }

    /// The backing trust registry, for tests that script trust.
    #[must_use]
    pub fn registry(&self) -> Registry {
        self.registry.clone()
    }

    /// The backing status authority, for tests that script revocations.
    #[must_use]
    pub fn authority(&self) -> Authority {
        self.authority.clone()
    }

    /// The provider's clock, for tests that move time.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    /// The verifier's public signing key.
    #[must_use]
    pub fn public_jwk(&self) -> PublicKeyJwk {
        self.keystore.public_jwk()
    }

    /// Register a public key for a DID so tokens signed under it resolve.
    pub fn register_key(&self, did: &str, jwk: PublicKeyJwk) {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).insert(did.to_string(), jwk);
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl passtrust_openid::verifier::Provider for Provider {}

impl Metadata for Provider {
    async fn verifier(&self) -> Result<Config> {
        Ok(Config {
            verifier_did: VERIFIER_DID.into(),
            response_uri: "http://localhost:8080/post".into(),
            revocation_policy: self.revocation_policy,
            ..Config::default()
        })
    }
}

impl StateStore for Provider {
    async fn put(&self, key: &str, data: Vec<u8>, expiry: DateTime<Utc>) -> Result<()> {
        self.state.put(key, data, expiry)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.state.get(key)
    }

    async fn purge(&self, key: &str) -> Result<()> {
        self.state.purge(key)
    }
}

impl ChallengeStore for Provider {
    async fn mint(&self, expires_at: DateTime<Utc>) -> Result<Challenge> {
        self.challenges.mint(expires_at).await
    }

    async fn consume(&self, id: &str, now: DateTime<Utc>) -> Result<Consumption> {
        self.challenges.consume(id, now).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        self.challenges.purge_expired(now).await
    }
}

impl TrustRegistry for Provider {
    async fn is_trusted(&self, issuer_did: &str) -> Result<bool> {
        self.trust.is_trusted(issuer_did).await
    }
}

impl StatusClient for Provider {
    async fn is_valid(&self, credential_id: &str) -> Result<bool> {
        self.revocation.is_valid(credential_id).await
    }
}

impl passtrust_openid::provider::Clock for Provider {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl Signer for Provider {
    fn algorithm(&self) -> Algorithm {
        Algorithm::EdDSA
    }

    fn verification_method(&self) -> String {
        self.keystore.verification_method()
    }

    async fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        self.keystore.try_sign(msg).await
    }

    async fn verifying_key(&self) -> anyhow::Result<PublicKeyJwk> {
        self.keystore.verifying_key().await
    }
}

impl Verifier for Provider {
    async fn deref_jwk(&self, did_url: &str) -> anyhow::Result<PublicKeyJwk> {
        let did = did_url.split('#').next().unwrap_or(did_url);
        if did.starts_with("did:jwk:") {
            return PublicKeyJwk::from_did_url(did_url);
        }
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(did)
            .cloned()
            .ok_or_else(|| anyhow!("no key registered for {did}"))
    }
}
