//! # Signing and Verification Traits
//!
//! Seams between token encoding and the key material backing it. Services
//! implement [`Signer`] over their own keypair and [`Verifier`] to resolve
//! counterparty keys from DID URLs.

use std::future::{Future, IntoFuture};

use crate::jose::jwk::PublicKeyJwk;

pub use crate::jose::jwt::Algorithm;

/// Signer is used by implementers to provide signing functionality for
/// token issuance.
pub trait Signer: Send + Sync {
    /// Algorithm returns the algorithm used by the signer.
    fn algorithm(&self) -> Algorithm;

    /// The verification method the verify key is associated with, as a DID
    /// URL. Placed in the `kid` header of tokens this signer produces.
    fn verification_method(&self) -> String;

    /// Sign is a convenience method for infallible Signer implementations.
    fn sign(&self, msg: &[u8]) -> impl Future<Output = Vec<u8>> + Send {
        let v = async { self.try_sign(msg).await.expect("should sign") };
        v.into_future()
    }

    /// `TrySign` is the fallible version of Sign.
    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = anyhow::Result<Vec<u8>>> + Send;

    /// The public key matching the signing key, used to advertise the key
    /// in metadata.
    fn verifying_key(&self) -> impl Future<Output = anyhow::Result<PublicKeyJwk>> + Send;
}

/// Verifier is used by implementers to provide verification key resolution.
pub trait Verifier: Send + Sync {
    /// Dereference a DID URL (the `kid` of a received token) to the public
    /// key it names.
    fn deref_jwk(&self, did_url: &str) -> impl Future<Output = anyhow::Result<PublicKeyJwk>> + Send;
}
