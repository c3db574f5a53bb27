//! # JOSE
//!
//! JSON Object Signing and Encryption support: compact JWS serialization
//! ([RFC7515]), JWT header and claim envelopes, and JSON Web Keys
//! ([RFC7517]). Only the EdDSA/Ed25519 suite is supported: every token in
//! the protocol is an Ed25519-signed compact JWS with the key identifier in
//! the header.
//!
//! [RFC7515]: https://www.rfc-editor.org/rfc/rfc7515
//! [RFC7517]: https://www.rfc-editor.org/rfc/rfc7517

pub mod jwk;
pub mod jws;
pub mod jwt;
