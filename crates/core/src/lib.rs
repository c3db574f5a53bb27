//! # PassTrust Core
//!
//! Shared building blocks for the PassTrust issuer and verifier: compact JWS
//! encoding and verification, Ed25519 signing keys, canonical claim hashing,
//! random token generation, and a TTL cache used by the trust and revocation
//! gates.
//!
//! This crate provides common utilities for the PassTrust project and is not
//! intended to be used directly.

pub mod cache;
pub mod gen;
pub mod hash;
pub mod jose;
pub mod keys;
pub mod signature;
