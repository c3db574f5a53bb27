//! # JSON Web Token (JWT)
//!
//! Header and claim envelope types for the compact JWS tokens exchanged by
//! the protocol: credentials, commitments, access tokens, wallet proofs,
//! presentations, and decision tokens.

use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

/// A decoded JWT: the verified header plus typed claims.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct Jwt<T> {
    /// The JWT header.
    pub header: Header,

    /// The JWT claims.
    pub claims: T,
}

/// The JWT header.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Digital signature algorithm identifier as per the IANA "JSON Web
    /// Signature and Encryption Algorithms" registry.
    pub alg: Algorithm,

    /// Media type of the JWS.
    pub typ: Type,

    /// Key identifier used for signature verification. Contains a DID URL
    /// naming the signer's verification key.
    pub kid: String,
}

/// The JWT `typ` header value.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Type {
    /// Ordinary signed JWT: credentials, commitments, access and decision
    /// tokens.
    #[default]
    #[serde(rename = "JWT")]
    Jwt,

    /// Wallet proof of possession of key material.
    #[serde(rename = "openid4vci-proof+jwt")]
    Proof,
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Signing algorithm identifier.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Algorithm {
    /// Edwards-curve digital signature (Ed25519).
    #[default]
    EdDSA,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
