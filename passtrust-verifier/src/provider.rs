//! Provider traits the deployment must implement for the verification API.

pub use passtrust_core::jose::jwk::PublicKeyJwk;
pub use passtrust_core::signature::{Algorithm, Signer, Verifier};
pub use passtrust_openid::provider::{
    CachedRegistry, CachedStatusClient, Challenge, ChallengeStore, Clock, Consumption,
    FailurePolicy, InMemoryChallengeStore, Result, StateStore, StatusClient, TrustRegistry,
};
pub use passtrust_openid::verifier::{Metadata, Provider};
