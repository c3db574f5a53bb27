//! Provider traits the deployment must implement for the issuance API.

pub use passtrust_core::jose::jwk::PublicKeyJwk;
pub use passtrust_core::signature::{Algorithm, Signer, Verifier};
pub use passtrust_openid::issuer::{Metadata, Provider};
pub use passtrust_openid::provider::{Clock, IssuanceLog, Result, StateStore, StatusStore};
