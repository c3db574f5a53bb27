//! # JSON Web Key (JWK)
//!
//! A JWK ([RFC7517]) is a JSON representation of a cryptographic key. Only
//! the Ed25519 octet key pair shape is modelled here.
//!
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

use anyhow::anyhow;
use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};

/// Simplified JSON Web Key (JWK) public key structure.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub struct PublicKeyJwk {
    /// Key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Key type.
    pub kty: KeyType,

    /// Cryptographic curve type.
    pub crv: Curve,

    /// Public key, base64url encoded.
    pub x: String,

    /// Use of the key.
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_: Option<KeyUse>,
}

impl PublicKeyJwk {
    /// Encode this key as a `did:jwk` DID with a `#0` verification method
    /// fragment.
    #[must_use]
    pub fn to_did_url(&self) -> String {
        let jwk_json = serde_json::json!({
            "kty": self.kty,
            "crv": self.crv,
            "x": self.x,
        });
        let encoded = Base64UrlUnpadded::encode_string(jwk_json.to_string().as_bytes());
        format!("did:jwk:{encoded}#0")
    }

    /// Extract the public key embedded in a `did:jwk` DID URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a `did:jwk` or its payload is not a
    /// valid JWK.
    pub fn from_did_url(did_url: &str) -> anyhow::Result<Self> {
        let did = did_url.split('#').next().unwrap_or(did_url);
        let encoded = did
            .strip_prefix("did:jwk:")
            .ok_or_else(|| anyhow!("unsupported DID method: {did}"))?;
        let decoded = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|e| anyhow!("issue decoding did:jwk payload: {e}"))?;
        serde_json::from_slice(&decoded).map_err(|e| anyhow!("invalid JWK in DID: {e}"))
    }
}

/// Cryptographic key type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyType {
    /// Octet key pair (Edwards curve).
    #[default]
    #[serde(rename = "OKP")]
    Okp,
}

/// Cryptographic curve type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum Curve {
    /// Ed25519 signature curve.
    #[default]
    Ed25519,
}

/// Intended use of the key.
#[derive(Clone, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum KeyUse {
    /// Signature verification.
    #[default]
    #[serde(rename = "sig")]
    Signature,
}
