//! A provider backing the issuance endpoint tests.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use passtrust_core::jose::jwk::PublicKeyJwk;
use passtrust_core::keys::SigningKeypair;
use passtrust_core::signature::{Algorithm, Signer, Verifier};
use passtrust_openid::issuer::{
    CredentialConfiguration, IssuanceRecord, Issuer, Metadata, StatusRecord,
};
use passtrust_openid::provider::{IssuanceLog, Result, StateStore, StatusStore};
use serde_json::json;

use crate::store::{issuance, state, status};
use crate::{Clock, Keystore};

/// The issuer's DID, a `did:jwk` over the fixed issuer key.
pub const ISSUER_DID: &str = "did:jwk:eyJjcnYiOiJFZDI1NTE5Iiwia3R5IjoiT0tQIiwieCI6IjExcVlBWUt4Q3JmVlNfN1R5V1FIT2c3aGN2UGFwaU1scndJYWFQY0hVUm8ifQ";

/// An issuer provider over fixed keys and in-memory stores.
#[derive(Clone, Debug)]
pub struct Provider {
    keystore: Keystore,
    state: state::Store,
    issuance: issuance::Log,
    status: status::Store,
    clock: Clock,
}

impl Provider {
    /// Create a provider with a frozen clock and empty stores.
    ///
    /// # Panics
    ///
    /// Panics if the embedded issuer JWK fails to load.
    #[must_use]
    pub fn new() -> Self {
        let jwk = json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo",
            "d": "nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A",
        });
        let keypair = SigningKeypair::from_jwk(&jwk).expect("issuer key is valid");

        Self {
            keystore: Keystore::new(keypair, ISSUER_DID),
            state: state::Store::new(),
            issuance: issuance::Log::new(),
            status: status::Store::new(),
            clock: Clock::frozen(),
        }
    }

    /// The provider's clock, for tests that move time.
    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    /// The issuer's public signing key.
    #[must_use]
    pub fn public_jwk(&self) -> PublicKeyJwk {
        self.keystore.public_jwk()
    }

    /// The logged record for an issued credential.
    #[must_use]
    pub fn issuance(&self, credential_id: &str) -> Option<IssuanceRecord> {
        self.issuance.get(credential_id)
    }
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl passtrust_openid::issuer::Provider for Provider {}

impl Metadata for Provider {
    async fn issuer(&self) -> Result<Issuer> {
        let mut configurations = HashMap::new();
        configurations.insert(
            "PassportCredential".to_string(),
            CredentialConfiguration {
                format: "jwt_vc_json".into(),
                cryptographic_binding_methods_supported: vec!["did:jwk".into()],
                credential_signing_alg_values_supported: vec!["EdDSA".into()],
                display: Some("Passport Credential".into()),
            },
        );

        Ok(Issuer {
            credential_issuer: ISSUER_DID.into(),
            credential_endpoint: "http://localhost:8080/credential".into(),
            token_endpoint: "http://localhost:8080/token".into(),
            credential_configurations_supported: configurations,
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

impl IssuanceLog for Provider {
    async fn record(&self, record: &IssuanceRecord) -> Result<()> {
        self.issuance.add(record)
    }
}

impl StatusStore for Provider {
    async fn status(&self, credential_id: &str) -> Result<Option<StatusRecord>> {
        self.status.status(credential_id).await
    }

    async fn put_status(&self, record: &StatusRecord) -> Result<()> {
        self.status.put_status(record).await
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
        PublicKeyJwk::from_did_url(did_url)
    }
}
