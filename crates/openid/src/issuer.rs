//! # Issuance Types
//!
//! Request, response, and token claim types for credential issuance: the
//! pre-authorized token exchange, the credential endpoint, direct issuance,
//! and the revocation state machine.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::future::Future;

use chrono::{DateTime, Utc};
use passtrust_core::signature::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::provider::{self, Clock, IssuanceLog, StateStore, StatusStore};

/// Issuer Provider trait.
pub trait Provider:
    Metadata + StateStore + IssuanceLog + StatusStore + Clock + Signer + Verifier + Clone
{
}

/// The `Metadata` trait is used by implementers to provide issuer
/// configuration.
pub trait Metadata: Send + Sync {
    /// Returns the issuer's configuration and public metadata.
    fn issuer(&self) -> impl Future<Output = provider::Result<Issuer>> + Send;
}

/// The only grant type accepted by the token endpoint.
pub const PRE_AUTH_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:pre-authorized_code";

/// Token request to the issuer's token endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenRequest {
    /// Authorization grant type. Must be [`PRE_AUTH_GRANT_TYPE`].
    pub grant_type: String,

    /// The pre-authorized code obtained out of band during credential offer.
    #[serde(rename = "pre-authorized_code")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_authorized_code: Option<String>,
}

/// Token response from the issuer's token endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct TokenResponse {
    /// A signed JWT granting access to the credential endpoint.
    pub access_token: String,

    /// The type of the access token. Always `Bearer`.
    pub token_type: TokenType,

    /// Access token lifetime in seconds.
    pub expires_in: i64,

    /// A nonce the wallet must embed in its proof of possession.
    pub c_nonce: String,

    /// Lifetime of the `c_nonce` in seconds.
    pub c_nonce_expires_in: i64,
}

/// Access token type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum TokenType {
    /// Bearer token.
    #[default]
    Bearer,
}

/// Claims carried by an access token JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// The issuer DID.
    pub iss: String,

    /// Unique token identifier.
    pub jti: String,

    /// Issued-at timestamp, seconds since the epoch.
    pub iat: i64,

    /// Expiry timestamp, seconds since the epoch.
    pub exp: i64,

    /// The pre-authorized code this token was exchanged for.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,
}

/// Credential request to the issuer's credential endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CredentialRequest {
    /// The access token obtained from the token endpoint.
    pub access_token: String,

    /// Proof of possession of the key material the credential will be bound
    /// to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,

    /// Claims to attest to, keyed by claim name.
    pub claims: Map<String, Value>,
}

/// Wallet proof of possession of key material.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Proof {
    /// Proof type. Only `jwt` is supported.
    pub proof_type: String,

    /// The proof JWT, signed by the wallet's key.
    pub jwt: String,
}

/// Claims carried by a wallet proof JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProofClaims {
    /// The wallet's client identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// The holder DID the credential will be issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// The issuer this proof is addressed to.
    pub aud: String,

    /// Issued-at timestamp, seconds since the epoch.
    pub iat: i64,

    /// The `c_nonce` from the token response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Credential response from the issuer's credential endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CredentialResponse {
    /// The issued credential as a compact JWS.
    pub credential: String,

    /// The commitment token binding the credential's claims, as a compact
    /// JWS.
    pub commitment: String,

    /// A fresh nonce for the wallet's next proof.
    pub c_nonce: String,

    /// Lifetime of the `c_nonce` in seconds.
    pub c_nonce_expires_in: i64,
}

/// Direct issuance request.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IssueRequest {
    /// The holder DID the credential is issued to.
    pub holder_did: String,

    /// Claims to attest to, keyed by claim name.
    pub claims: Map<String, Value>,

    /// Evidence the holder was live when claims were captured. Gated when
    /// present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liveness_proof: Option<LivenessProof>,
}

/// Evidence from a liveness capture session.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LivenessProof {
    /// Liveness score in `[0, 1]`.
    pub score: f64,

    /// Capture confidence in `[0, 1]`.
    pub confidence: f64,

    /// The capture system's own live/not-live determination.
    pub is_live: bool,

    /// When the capture was taken.
    pub captured_at: DateTime<Utc>,
}

/// Direct issuance response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct IssueResponse {
    /// Unique identifier of the issued credential.
    pub credential_id: String,

    /// The issued credential as a compact JWS.
    pub credential_jwt: String,

    /// The commitment token as a compact JWS.
    pub commitment_jwt: String,

    /// SHA-256 hex digest of the canonicalised claims.
    pub commitment_hash: String,
}

/// Claims carried by a credential JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CredentialJwtClaims {
    /// The issuer DID.
    pub iss: String,

    /// The holder DID.
    pub sub: String,

    /// Unique credential identifier.
    pub jti: String,

    /// Issued-at timestamp, seconds since the epoch.
    pub iat: i64,

    /// The verifiable credential wrapper.
    pub vc: VcClaims,
}

/// The `vc` claim of a credential JWT.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VcClaims {
    /// JSON-LD context.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential types.
    #[serde(rename = "type")]
    pub type_: Vec<String>,

    /// The attested claims, keyed by claim name.
    #[serde(rename = "credentialSubject")]
    pub credential_subject: Map<String, Value>,
}

impl Default for VcClaims {
    fn default() -> Self {
        Self {
            context: vec!["https://www.w3.org/2018/credentials/v1".into()],
            type_: vec!["VerifiableCredential".into(), "PassportCredential".into()],
            credential_subject: Map::default(),
        }
    }
}

/// Claims carried by a commitment JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CommitmentJwtClaims {
    /// The issuer DID.
    pub iss: String,

    /// The holder DID.
    pub sub: String,

    /// The credential identifier this commitment belongs to.
    pub jti: String,

    /// Issued-at timestamp, seconds since the epoch.
    pub iat: i64,

    /// SHA-256 hex digest of the canonicalised claims.
    pub commitment_hash: String,
}

/// A record of an issued credential, appended to the issuance log.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuanceRecord {
    /// Unique credential identifier.
    pub credential_id: String,

    /// The holder DID the credential was issued to.
    pub holder_did: String,

    /// SHA-256 hex digest of the canonicalised claims.
    pub commitment_hash: String,

    /// When the credential was issued.
    pub issued_at: DateTime<Utc>,
}

/// The lifecycle state of an issued credential.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CredentialStatus {
    /// The credential is in good standing.
    #[default]
    Valid,

    /// The credential is temporarily not usable but may be reinstated.
    Suspended,

    /// The credential is permanently unusable. Terminal.
    Revoked,
}

impl Display for CredentialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "VALID"),
            Self::Suspended => write!(f, "SUSPENDED"),
            Self::Revoked => write!(f, "REVOKED"),
        }
    }
}

/// Why a credential was revoked or suspended.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevocationReason {
    /// The credential was obtained or used fraudulently.
    Fraud,

    /// The holder's key material was compromised.
    Compromised,

    /// The credential was issued in error.
    Error,

    /// The underlying document expired.
    Expired,

    /// The holder asked for revocation.
    UserRequest,

    /// An administrator decided to revoke.
    #[default]
    AdminDecision,
}

/// Persisted revocation state for one credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusRecord {
    /// The credential this record belongs to.
    pub credential_id: String,

    /// Current lifecycle state.
    pub status: CredentialStatus,

    /// When the credential was revoked or suspended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    /// Why the credential was revoked or suspended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RevocationReason>,

    /// Who performed the state change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,

    /// Free-text elaboration of the reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request to revoke a credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RevokeRequest {
    /// The credential to revoke.
    pub credential_id: String,

    /// Why the credential is being revoked.
    pub reason: RevocationReason,

    /// Who is performing the revocation.
    pub revoked_by: String,

    /// Free-text elaboration of the reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request to suspend a credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SuspendRequest {
    /// The credential to suspend.
    pub credential_id: String,

    /// Why the credential is being suspended.
    pub reason: RevocationReason,

    /// Who is performing the suspension.
    pub revoked_by: String,
}

/// Request to reinstate a suspended credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ReinstateRequest {
    /// The credential to reinstate.
    pub credential_id: String,
}

/// Request for a credential's current status.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct StatusRequest {
    /// The credential to look up.
    pub credential_id: String,
}

/// A credential's current status.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// The credential this response describes.
    pub credential_id: String,

    /// Current lifecycle state.
    pub status: CredentialStatus,

    /// Whether the credential may be relied upon right now.
    pub is_valid: bool,

    /// When the credential was revoked or suspended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,

    /// Why the credential was revoked or suspended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<RevocationReason>,

    /// Who performed the state change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,

    /// Free-text elaboration of the reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_description: Option<String>,
}

/// Issuer configuration and public metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Issuer {
    /// The issuer's identifier (and credential `iss`), as a DID.
    pub credential_issuer: String,

    /// URL of the issuer's credential endpoint.
    pub credential_endpoint: String,

    /// URL of the issuer's token endpoint.
    pub token_endpoint: String,

    /// Credential configurations the issuer supports, keyed by
    /// configuration id.
    pub credential_configurations_supported: HashMap<String, CredentialConfiguration>,
}

/// One supported credential configuration in issuer metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CredentialConfiguration {
    /// Credential format identifier.
    pub format: String,

    /// Supported cryptographic binding methods.
    pub cryptographic_binding_methods_supported: Vec<String>,

    /// Supported credential signing algorithms.
    pub credential_signing_alg_values_supported: Vec<String>,

    /// Display name for wallets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Request for issuer metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MetadataRequest {}

/// Issuer metadata response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MetadataResponse {
    /// The issuer's public metadata.
    #[serde(flatten)]
    pub issuer: Issuer,

    /// The issuer's signing keys as a JWK set.
    pub jwks: serde_json::Value,
}
