//! # PassTrust Protocol Types
//!
//! Request, response, error, and provider types shared by the
//! `passtrust-issuer` and `passtrust-verifier` crates.
//!
//! The crate is for internal use within the PassTrust project and is not
//! intended to be used directly by end users. Public types are re-exported
//! through the respective top-level crates.

mod error;
pub mod issuer;
pub mod provider;
pub mod verifier;

pub use self::error::{Error, ErrorResponse};

/// Result type for protocol endpoints.
pub type Result<T, E = Error> = std::result::Result<T, E>;
