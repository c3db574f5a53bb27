//! An API for verifying passport-derived digital credentials, based on
//! [OpenID for Verifiable Presentations].
//!
//! # Design
//!
//! **Endpoints**
//!
//! The library is architected around endpoints, each with its own
//! `XxxRequest` and `XxxResponse` types serializing to and from JSON.
//! Endpoints are async functions taking a `Provider` and a request, suited
//! to thin HTTP wrappers. Implementers supply `Provider` traits for
//! externals such as the challenge store, trust registry, status authority,
//! session state, and key material.
//!
//! **Flow**
//!
//! A holder mints a [`challenge`], then presents a commitment token and a
//! challenge-bound predicate proof to [`verify`], which runs a linear gate
//! pipeline and mints a short-lived decision token. Wallet-driven flows use
//! [`authorize`] and [`response`] instead, carrying credentials inside a
//! `vp_token`. Relying parties check decision tokens with [`validate`].
//!
//! [OpenID for Verifiable Presentations]: https://openid.net/specs/openid-4-verifiable-presentations-1_0.html

mod authorize;
pub mod challenge;
pub mod decision;
mod definition;
mod metadata;
pub mod provider;
mod response;
mod revocation;
mod state;
mod trust;
mod verify;

pub use passtrust_openid::verifier::{
    AuthorizeRequest, AuthorizeResponse, ChallengeRequest, ChallengeResponse, DefinitionRequest,
    DefinitionResponse, ResponseRequest, ResponseResponse, ValidateRequest, ValidateResponse,
    VerifierMetadataRequest, VerifierMetadataResponse, VerifyRequest, VerifyResponse,
};
pub use passtrust_openid::provider::InMemoryChallengeStore;
pub use passtrust_openid::{Error, Result};

pub use crate::authorize::authorize;
pub use crate::challenge::{challenge, purge_expired};
pub use crate::decision::{has_claim, validate};
pub use crate::definition::definition;
pub use crate::metadata::metadata;
pub use crate::response::response;
pub use crate::verify::verify;
