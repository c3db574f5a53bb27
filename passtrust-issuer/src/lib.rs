//! An API for the issuance of passport-derived digital credentials, based on
//! the pre-authorized code flow of [OpenID for Verifiable Credential
//! Issuance].
//!
//! # Design
//!
//! **Endpoints**
//!
//! The library is architected around endpoints, each with its own
//! `XxxRequest` and `XxxResponse` types. The types serialize to and from
//! JSON in accordance with the external interface.
//!
//! The endpoints are designed to be used with Rust-based HTTP servers, such
//! as [axum](https://docs.rs/axum/latest/axum/): each endpoint is an async
//! function taking a `Provider` and a request, returning a response or a
//! protocol error. Implementers supply `Provider` traits for externals such
//! as state storage, status persistence, and key material.
//!
//! **Flow**
//!
//! A wallet exchanges a pre-authorized code for an access token at the
//! [`token`] endpoint, then presents the token plus a proof of possession of
//! its key material at the [`credential`] endpoint to receive a credential
//! and commitment token. Credentials can later be suspended, reinstated, or
//! revoked through the [`status`] endpoints.
//!
//! [OpenID for Verifiable Credential Issuance]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html

mod credential;
mod issue;
pub mod liveness;
mod metadata;
pub mod provider;
mod state;
pub mod status;
mod token;

pub use passtrust_openid::issuer::{
    CredentialRequest, CredentialResponse, IssueRequest, IssueResponse, MetadataRequest,
    MetadataResponse, ReinstateRequest, RevokeRequest, StatusRequest, StatusResponse,
    SuspendRequest, TokenRequest, TokenResponse,
};
pub use passtrust_openid::{Error, Result};

pub use crate::credential::credential;
pub use crate::issue::issue;
pub use crate::metadata::metadata;
pub use crate::status::{is_valid, reinstate, revoke, status, suspend};
pub use crate::token::token;
