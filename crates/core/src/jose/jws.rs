//! # JSON Web Signature (JWS)
//!
//! Compact JWS serialization ([RFC7515]) over Ed25519. Every token minted by
//! the issuer and verifier goes through [`encode`]; every token consumed goes
//! through [`decode`], which resolves the header `kid` to a public key and
//! refuses to return claims unless the signature verifies.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515

use anyhow::{anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use ed25519_dalek::Verifier as _;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;

use crate::jose::jwk::PublicKeyJwk;
use crate::jose::jwt::{Header, Jwt, Type};
use crate::signature::Signer;

/// Encode the provided claims and sign, returning a JWT in compact JWS form.
///
/// # Errors
///
/// Returns an error if the header or claims cannot be serialized or the
/// signer fails.
pub async fn encode<T>(typ: Type, claims: &T, signer: &impl Signer) -> anyhow::Result<String>
where
    T: Serialize + Send + Sync,
{
    tracing::debug!("jws::encode");

    let header = Header {
        alg: signer.algorithm(),
        typ,
        kid: signer.verification_method(),
    };

    let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
    let claims = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
    let payload = format!("{header}.{claims}");

    let sig = signer.try_sign(payload.as_bytes()).await?;
    let sig_enc = Base64UrlUnpadded::encode_string(&sig);

    Ok(format!("{payload}.{sig_enc}"))
}

/// Decode a compact JWS, resolve the header `kid` to a public key using the
/// provided callback, and verify the signature before returning the claims.
///
/// # Errors
///
/// Returns an error if the token is malformed, the key cannot be resolved,
/// or the signature does not verify.
pub async fn decode<F, Fut, T>(token: &str, resolver: F) -> anyhow::Result<Jwt<T>>
where
    T: DeserializeOwned + Send,
    F: FnOnce(String) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<PublicKeyJwk>> + Send,
{
    let parts = token.split('.').collect::<Vec<&str>>();
    if parts.len() != 3 {
        bail!("invalid compact JWS format");
    }

    let decoded = Base64UrlUnpadded::decode_vec(parts[0])
        .map_err(|e| anyhow!("issue decoding header: {e}"))?;
    let header: Header =
        serde_json::from_slice(&decoded).map_err(|e| anyhow!("issue deserializing header: {e}"))?;
    let decoded = Base64UrlUnpadded::decode_vec(parts[1])
        .map_err(|e| anyhow!("issue decoding claims: {e}"))?;
    let claims =
        serde_json::from_slice(&decoded).map_err(|e| anyhow!("issue deserializing claims: {e}"))?;
    let sig = Base64UrlUnpadded::decode_vec(parts[2])
        .map_err(|e| anyhow!("issue decoding signature: {e}"))?;

    if header.kid.is_empty() {
        bail!("'kid' is not set");
    }

    let jwk = resolver(header.kid.clone()).await?;
    verify(&jwk, &format!("{}.{}", parts[0], parts[1]), &sig)?;

    Ok(Jwt { header, claims })
}

/// Verify an Ed25519 signature over `msg` using the JWK.
///
/// # Errors
///
/// Returns an error if the JWK or signature is invalid or verification
/// fails.
pub fn verify(jwk: &PublicKeyJwk, msg: &str, sig: &[u8]) -> anyhow::Result<()> {
    use ed25519_dalek::{Signature, VerifyingKey};

    let x_bytes = Base64UrlUnpadded::decode_vec(&jwk.x)
        .map_err(|e| anyhow!("unable to base64 decode JWK 'x': {e}"))?;
    let bytes = &x_bytes.try_into().map_err(|_| anyhow!("invalid public key length"))?;
    let verifying_key = VerifyingKey::from_bytes(bytes)
        .map_err(|e| anyhow!("unable to build verifying key: {e}"))?;
    let signature =
        Signature::from_slice(sig).map_err(|e| anyhow!("unable to build signature: {e}"))?;

    verifying_key
        .verify(msg.as_bytes(), &signature)
        .map_err(|e| anyhow!("unable to verify signature: {e}"))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::keys::SigningKeypair;
    use crate::signature::Algorithm;

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Claims {
        iss: String,
        sub: String,
    }

    struct Keystore(SigningKeypair);

    impl Signer for Keystore {
        fn algorithm(&self) -> Algorithm {
            Algorithm::EdDSA
        }

        fn verification_method(&self) -> String {
            self.0.public_jwk().to_did_url()
        }

        async fn try_sign(&self, msg: &[u8]) -> anyhow::Result<Vec<u8>> {
            self.0.try_sign(msg)
        }

        async fn verifying_key(&self) -> anyhow::Result<PublicKeyJwk> {
            Ok(self.0.public_jwk())
        }
    }

    #[tokio::test]
    async fn encode_decode_verifies() {
        let keystore = Keystore(SigningKeypair::generate());
        let claims = Claims {
            iss: "did:web:issuer.io".into(),
            sub: "did:jwk:holder".into(),
        };

        let token = encode(Type::Jwt, &claims, &keystore).await.expect("should encode");
        let jwk = keystore.0.public_jwk();

        let jwt: Jwt<Claims> =
            decode(&token, |_kid| async move { Ok(jwk) }).await.expect("should decode");
        assert_eq!(jwt.claims, claims);
        assert_eq!(jwt.header.alg, Algorithm::EdDSA);
    }

    #[tokio::test]
    async fn tampered_payload_fails() {
        let keystore = Keystore(SigningKeypair::generate());
        let claims = Claims {
            iss: "did:web:issuer.io".into(),
            sub: "did:jwk:holder".into(),
        };

        let token = encode(Type::Jwt, &claims, &keystore).await.expect("should encode");
        let parts = token.split('.').collect::<Vec<&str>>();
        let forged_claims = Claims {
            iss: "did:web:issuer.io".into(),
            sub: "did:jwk:mallory".into(),
        };
        let forged = Base64UrlUnpadded::encode_string(
            &serde_json::to_vec(&forged_claims).expect("should serialize"),
        );
        let tampered = format!("{}.{forged}.{}", parts[0], parts[2]);

        let jwk = keystore.0.public_jwk();
        let result: anyhow::Result<Jwt<Claims>> =
            decode(&tampered, |_kid| async move { Ok(jwk) }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn wrong_key_fails() {
        let keystore = Keystore(SigningKeypair::generate());
        let other = SigningKeypair::generate();
        let claims = Claims {
            iss: "did:web:issuer.io".into(),
            sub: "did:jwk:holder".into(),
        };

        let token = encode(Type::Jwt, &claims, &keystore).await.expect("should encode");
        let jwk = other.public_jwk();
        let result: anyhow::Result<Jwt<Claims>> =
            decode(&token, |_kid| async move { Ok(jwk) }).await;
        assert!(result.is_err());
    }
}
