//! # Protocol Errors
//!
//! The closed set of errors returned by issuance, verification, and
//! revocation endpoints. Every variant carries a stable machine-readable
//! code and a human-readable description; internal failure details are
//! folded into the description and never leak as traces.

use std::fmt::Debug;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Error codes for credential issuance, presentation, and revocation.
#[derive(Error, Debug, Deserialize)]
pub enum Error {
    /// The request is missing a required parameter, includes an unsupported
    /// parameter value, repeats a parameter, or is otherwise malformed.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// The provided authorization grant (e.g. pre-authorized code) is
    /// invalid, expired, or was issued to another client.
    #[error(r#"{{"error": "invalid_grant", "error_description": "{0}"}}"#)]
    InvalidGrant(String),

    /// The authorization grant type is not supported by the issuer. Only the
    /// pre-authorized code grant is accepted.
    #[error(r#"{{"error": "unsupported_grant_type", "error_description": "{0}"}}"#)]
    UnsupportedGrantType(String),

    /// The resource owner or authorization server denied the request.
    #[error(r#"{{"error": "access_denied", "error_description": "{0}"}}"#)]
    AccessDenied(String),

    /// The access token is missing, malformed, expired, or its signature
    /// does not verify against the issuer key.
    #[error(r#"{{"error": "invalid_token", "error_description": "{0}"}}"#)]
    InvalidToken(String),

    /// The Credential Request did not contain a proof, or the proof was
    /// invalid. The error response contains a fresh `c_nonce` for the wallet
    /// to use when creating another proof of possession.
    #[allow(missing_docs)]
    #[error(r#"{{"error": "invalid_proof", "error_description": "{hint}", "c_nonce": "{c_nonce}", "c_nonce_expires_in": {c_nonce_expires_in}}}"#)]
    InvalidProof { hint: String, c_nonce: String, c_nonce_expires_in: i64 },

    /// The proof or presentation names no subject to bind the credential to.
    #[error(r#"{{"error": "invalid_subject", "error_description": "{0}"}}"#)]
    InvalidSubject(String),

    /// The presentation response is missing a `vp_token` or the token cannot
    /// be parsed.
    #[error(r#"{{"error": "invalid_presentation", "error_description": "{0}"}}"#)]
    InvalidPresentation(String),

    /// The presentation response is missing a `presentation_submission`.
    #[error(r#"{{"error": "invalid_submission", "error_description": "{0}"}}"#)]
    InvalidSubmission(String),

    /// The presentation embeds no credentials to verify.
    #[error(r#"{{"error": "no_credentials", "error_description": "{0}"}}"#)]
    NoCredentials(String),

    /// None of the presented credentials passed verification.
    #[error(r#"{{"error": "verification_failed", "error_description": "{0}"}}"#)]
    VerificationFailed(String),

    /// The challenge was never minted or has already been evicted.
    #[error(r#"{{"error": "unknown_challenge", "error_description": "{0}"}}"#)]
    UnknownChallenge(String),

    /// The challenge has already been consumed. Challenges are single-use.
    #[error(r#"{{"error": "challenge_used", "error_description": "{0}"}}"#)]
    ChallengeUsed(String),

    /// The challenge expired before it was consumed.
    #[error(r#"{{"error": "challenge_expired", "error_description": "{0}"}}"#)]
    ChallengeExpired(String),

    /// The commitment token's subject does not match the presented holder.
    #[error(r#"{{"error": "subject_mismatch", "error_description": "{0}"}}"#)]
    SubjectMismatch(String),

    /// A token signature did not verify against the resolved key.
    #[error(r#"{{"error": "invalid_signature", "error_description": "{0}"}}"#)]
    InvalidSignature(String),

    /// The credential's issuer is not in the trust registry, or the registry
    /// could not be reached and the trust gate fails closed.
    #[error(r#"{{"error": "untrusted_issuer", "error_description": "{0}"}}"#)]
    UntrustedIssuer(String),

    /// The proof's public signals are not bound to the consumed challenge.
    #[error(r#"{{"error": "proof_not_bound", "error_description": "{0}"}}"#)]
    ProofNotBound(String),

    /// The proof claims a predicate the verifier does not support.
    #[error(r#"{{"error": "unsupported_predicate", "error_description": "{0}"}}"#)]
    UnsupportedPredicate(String),

    /// The proof's public result signal is not boolean true.
    #[error(r#"{{"error": "proof_result_false", "error_description": "{0}"}}"#)]
    ProofResultFalse(String),

    /// The referenced entity does not exist.
    #[error(r#"{{"error": "not_found", "error_description": "{0}"}}"#)]
    NotFound(String),

    /// The credential has already been revoked. Revocation is terminal.
    #[error(r#"{{"error": "already_revoked", "error_description": "{0}"}}"#)]
    AlreadyRevoked(String),

    /// The requested status change is not a legal transition from the
    /// credential's current state.
    #[error(r#"{{"error": "invalid_state_transition", "error_description": "{0}"}}"#)]
    InvalidStateTransition(String),

    /// The configured signing key material is malformed. Fatal at startup.
    #[error(r#"{{"error": "invalid_key_configuration", "error_description": "{0}"}}"#)]
    InvalidKeyConfiguration(String),

    /// An upstream dependency (trust registry, status authority) could not
    /// be reached and the configured policy fails closed.
    #[error(r#"{{"error": "upstream_unavailable", "error_description": "{0}"}}"#)]
    UpstreamUnavailable(String),

    /// The server encountered an unexpected condition that prevented it from
    /// fulfilling the request.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),
}

/// Externally-facing error response body.
#[allow(clippy::module_name_repetitions)]
#[derive(Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Error description.
    pub error_description: String,

    /// A fresh `c_nonce` to use when retrying proof submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,

    /// The expiry time of the `c_nonce`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<i64>,
}

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error as SerdeError;

        let Ok(error) = serde_json::from_str::<ErrorResponse>(&self.to_string()) else {
            return Err(SerdeError::custom("issue deserializing Err"));
        };
        error.serialize(serializer)
    }
}

impl Error {
    /// Transform error to external json format.
    #[must_use]
    pub fn to_json(self) -> serde_json::Value {
        serde_json::from_str(&self.to_string()).unwrap_or_default()
    }

    /// Transform error to query string format for redirect responses. Does
    /// not include `c_nonce` as this is not required in query string
    /// responses.
    #[must_use]
    pub fn to_querystring(self) -> String {
        serde_qs::to_string(&self).unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn err_json() {
        let err = Error::ChallengeUsed("challenge already consumed".into());
        let ser: Value = serde_json::from_str(&err.to_string()).unwrap();
        assert_eq!(
            ser,
            json!({"error": "challenge_used", "error_description": "challenge already consumed"})
        );
    }

    #[test]
    fn err_querystring() {
        let err = Error::UntrustedIssuer("issuer is not trusted".into());
        let ser = serde_qs::to_string(&err).unwrap();
        assert_eq!(ser, "error=untrusted_issuer&error_description=issuer+is+not+trusted");
    }

    #[test]
    fn err_serialize() {
        let err = Error::SubjectMismatch("sub does not match holder".into());
        let ser = serde_json::to_value(&err).unwrap();
        assert_eq!(
            ser,
            json!({"error": "subject_mismatch", "error_description": "sub does not match holder"})
        );
    }

    // An InvalidProof error carries c_nonce and c_nonce_expires_in values in
    // the external response.
    #[test]
    fn proof_err() {
        let err = Error::InvalidProof {
            hint: "proof jwt is malformed".into(),
            c_nonce: "1234".into(),
            c_nonce_expires_in: 300,
        };
        let ser: Value = serde_json::from_str(&err.to_string()).unwrap();

        assert_eq!(
            ser,
            json!({
                "error": "invalid_proof",
                "error_description": "proof jwt is malformed",
                "c_nonce": "1234",
                "c_nonce_expires_in": 300,
            })
        );
    }
}
