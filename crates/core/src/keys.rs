//! # Signing Keys
//!
//! Ed25519 keypair management. Keys are generated at startup or loaded from
//! a JWK exported by a previous run so issued credentials remain verifiable
//! across restarts.

use anyhow::{anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::{Signer as _, SigningKey};
use rand_core::OsRng;
use serde_json::{Value, json};

use crate::jose::jwk::{Curve, KeyType, KeyUse, PublicKeyJwk};

/// An Ed25519 signing keypair with a stable key identifier.
#[derive(Clone)]
pub struct SigningKeypair {
    key_id: String,
    signing_key: SigningKey,
}

impl SigningKeypair {
    /// Generate a fresh keypair with a random key identifier.
    #[must_use]
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self {
            key_id: format!("key-{}", uuid::Uuid::new_v4()),
            signing_key,
        }
    }

    /// Load a keypair from a private JWK previously produced by
    /// [`Self::export_private_jwk`].
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK is not an Ed25519 OKP key or the `d`
    /// parameter is missing or malformed.
    pub fn from_jwk(jwk: &Value) -> anyhow::Result<Self> {
        if jwk["kty"] != json!("OKP") || jwk["crv"] != json!("Ed25519") {
            bail!("unsupported key type, expected OKP/Ed25519");
        }
        let d = jwk["d"].as_str().ok_or_else(|| anyhow!("JWK 'd' parameter is not set"))?;
        let d_bytes = Base64UrlUnpadded::decode_vec(d)
            .map_err(|e| anyhow!("unable to base64 decode JWK 'd': {e}"))?;
        let secret: [u8; 32] =
            d_bytes.try_into().map_err(|_| anyhow!("invalid secret key length"))?;

        let key_id = jwk["kid"]
            .as_str()
            .map_or_else(|| format!("key-{}", uuid::Uuid::new_v4()), ToString::to_string);

        Ok(Self {
            key_id,
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// The key identifier.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(self.signing_key.try_sign(msg)?.to_vec())
    }

    /// The public half of the keypair as a JWK.
    #[must_use]
    pub fn public_jwk(&self) -> PublicKeyJwk {
        PublicKeyJwk {
            kid: Some(self.key_id.clone()),
            kty: KeyType::Okp,
            crv: Curve::Ed25519,
            x: Base64UrlUnpadded::encode_string(self.signing_key.verifying_key().as_bytes()),
            use_: Some(KeyUse::Signature),
        }
    }

    /// Export the full keypair as a private JWK for persistence.
    #[must_use]
    pub fn export_private_jwk(&self) -> Value {
        json!({
            "kid": self.key_id,
            "kty": "OKP",
            "crv": "Ed25519",
            "use": "sig",
            "x": Base64UrlUnpadded::encode_string(self.signing_key.verifying_key().as_bytes()),
            "d": Base64UrlUnpadded::encode_string(&self.signing_key.to_bytes()),
        })
    }
}

impl std::fmt::Debug for SigningKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKeypair").field("key_id", &self.key_id).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jose::jws;

    #[test]
    fn export_import_round_trip() {
        let keypair = SigningKeypair::generate();
        let exported = keypair.export_private_jwk();

        let imported = SigningKeypair::from_jwk(&exported).expect("should import");
        assert_eq!(imported.key_id(), keypair.key_id());
        assert_eq!(imported.public_jwk(), keypair.public_jwk());
    }

    #[test]
    fn imported_key_signs_verifiably() {
        let keypair = SigningKeypair::generate();
        let imported =
            SigningKeypair::from_jwk(&keypair.export_private_jwk()).expect("should import");

        let sig = imported.try_sign(b"header.claims").expect("should sign");
        jws::verify(&keypair.public_jwk(), "header.claims", &sig).expect("should verify");
    }

    #[test]
    fn rejects_non_ed25519() {
        let jwk = json!({"kty": "EC", "crv": "P-256", "d": "AA", "x": "AA", "y": "AA"});
        assert!(SigningKeypair::from_jwk(&jwk).is_err());
    }
}
