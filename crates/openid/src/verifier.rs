//! # Verification Types
//!
//! Request, response, and token claim types for the verifier: challenge
//! minting, presentation definition and exchange, the verification
//! orchestrator, and decision tokens.

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use passtrust_core::signature::{self, Signer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::provider::{
    self, ChallengeStore, Clock, FailurePolicy, StateStore, StatusClient, TrustRegistry,
};

/// Verifier Provider trait.
pub trait Provider:
    Metadata
    + StateStore
    + ChallengeStore
    + TrustRegistry
    + StatusClient
    + Clock
    + Signer
    + signature::Verifier
    + Clone
{
}

/// The `Metadata` trait is used by implementers to provide verifier
/// configuration.
pub trait Metadata: Send + Sync {
    /// Returns the verifier's configuration and public metadata.
    fn verifier(&self) -> impl Future<Output = provider::Result<Verifier>> + Send;
}

/// The only proof predicate the verifier accepts.
pub const SUPPORTED_PREDICATE: &str = "over_18";

/// Assurance level asserted in decision tokens. Proofs are validated
/// structurally, not cryptographically, so assurance never rises above LOW.
pub const ASSURANCE_LOW: &str = "LOW";

/// Verifier configuration and public metadata.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Verifier {
    /// The verifier's identifier (and decision token `iss`), as a DID.
    pub verifier_did: String,

    /// URL wallets post presentation responses back to.
    pub response_uri: String,

    /// Challenge lifetime in seconds.
    pub challenge_ttl: i64,

    /// Decision token lifetime in seconds.
    pub decision_ttl: i64,

    /// How the trust gate behaves when the registry is unreachable.
    pub trust_policy: FailurePolicy,

    /// How the revocation gate behaves when the status authority is
    /// unreachable.
    pub revocation_policy: FailurePolicy,
}

impl Default for Verifier {
    fn default() -> Self {
        Self {
            verifier_did: String::new(),
            response_uri: String::new(),
            challenge_ttl: 300,
            decision_ttl: 300,
            trust_policy: FailurePolicy::FailClosed,
            revocation_policy: FailurePolicy::FailOpen,
        }
    }
}

/// Request for a fresh verification challenge.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChallengeRequest {}

/// A freshly minted challenge.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChallengeResponse {
    /// The challenge identifier to bind the proof to.
    pub challenge: String,

    /// Challenge lifetime in seconds.
    pub ttl_seconds: i64,
}

/// Verification request: a holder presents a commitment token and a
/// predicate proof against a previously minted challenge.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VerifyRequest {
    /// The challenge being consumed.
    pub challenge: String,

    /// The presenting holder's DID.
    pub holder_did: String,

    /// The commitment token issued alongside the holder's credential.
    pub commitment_jwt: String,

    /// Opaque predicate proof material.
    pub proof: String,

    /// Public signals accompanying the proof.
    pub public_signals: PublicSignals,
}

/// Public signals accompanying a predicate proof.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PublicSignals {
    /// The predicate the proof attests to.
    pub predicate: String,

    /// The challenge the proof is bound to.
    pub challenge: String,

    /// The proof's public result signal. Must be boolean `true`.
    pub result: Value,
}

/// Successful verification outcome.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VerifyResponse {
    /// A short-lived decision token for downstream relying parties.
    pub decision_token: String,

    /// The claims verification established.
    pub verified_claims: Vec<String>,

    /// Assurance level of the verification.
    pub assurance_level: String,

    /// Decision token lifetime in seconds.
    pub expires_in: i64,
}

/// Claims carried by a decision token JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct DecisionTokenClaims {
    /// The verifier DID.
    pub iss: String,

    /// The verified holder's DID.
    pub sub: String,

    /// Unique token identifier.
    pub jti: String,

    /// Issued-at timestamp, seconds since the epoch.
    pub iat: i64,

    /// Expiry timestamp, seconds since the epoch.
    pub exp: i64,

    /// The claims verification established.
    pub verified_claims: Vec<String>,

    /// Assurance level of the verification.
    pub assurance_level: String,

    /// When the verification took place.
    pub verified_at: DateTime<Utc>,
}

/// Request to validate a decision token presented by a relying party.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ValidateRequest {
    /// The decision token to validate.
    pub decision_token: String,
}

/// Result of validating a decision token.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ValidateResponse {
    /// The verified holder's DID.
    pub holder_did: String,

    /// The claims the token attests to.
    pub verified_claims: Vec<String>,

    /// Assurance level of the original verification.
    pub assurance_level: String,
}

/// Request for the verifier's presentation definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DefinitionRequest {}

/// The verifier's presentation definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DefinitionResponse {
    /// The presentation definition wallets should satisfy.
    pub presentation_definition: PresentationDefinition,
}

/// A presentation definition as per DIF Presentation Exchange.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PresentationDefinition {
    /// Definition identifier.
    pub id: String,

    /// Requirements on the credentials to present.
    pub input_descriptors: Vec<InputDescriptor>,

    /// Supported formats, keyed by format identifier.
    pub format: HashMap<String, FormatSpec>,
}

/// One input requirement of a presentation definition.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct InputDescriptor {
    /// Descriptor identifier.
    pub id: String,

    /// Constraints credentials must satisfy.
    pub constraints: Constraints,
}

/// Constraints of an input descriptor.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Constraints {
    /// Fields the credential must (or may) carry.
    pub fields: Vec<Field>,
}

/// One field constraint.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Field {
    /// JSONPath expressions locating the field.
    pub path: Vec<String>,

    /// Whether the field may be omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Algorithms supported for a format.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FormatSpec {
    /// Supported signing algorithms.
    pub alg: Vec<String>,
}

/// Authorization request opening a presentation exchange.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AuthorizeRequest {
    /// Requested response type. Must be `vp_token`.
    pub response_type: String,

    /// The requesting client's identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Authorization response: the session the wallet should respond into.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct AuthorizeResponse {
    /// Session identifier. Echoed back as `state` in the wallet's response.
    pub session_id: String,

    /// Nonce the wallet must embed in its presentation.
    pub nonce: String,

    /// The presentation definition to satisfy.
    pub presentation_definition: PresentationDefinition,

    /// Where to post the presentation response.
    pub response_uri: String,
}

/// Presentation response posted by a wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResponseRequest {
    /// The presentation token, a compact JWS signed by the holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vp_token: Option<String>,

    /// Mapping of presented credentials to the definition's descriptors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_submission: Option<PresentationSubmission>,

    /// The session identifier from the authorization response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Result of processing a presentation response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ResponseResponse {
    /// A short-lived decision token for downstream relying parties.
    pub decision_token: String,

    /// The union of claims established across verified credentials.
    pub verified_claims: Vec<String>,

    /// Assurance level of the verification.
    pub assurance_level: String,

    /// Decision token lifetime in seconds.
    pub expires_in: i64,
}

/// A presentation submission as per DIF Presentation Exchange.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PresentationSubmission {
    /// Submission identifier.
    pub id: String,

    /// The definition this submission answers.
    pub definition_id: String,

    /// Mapping of presented credentials to input descriptors.
    pub descriptor_map: Vec<DescriptorMap>,
}

/// One entry of a submission's descriptor map.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DescriptorMap {
    /// The input descriptor this entry answers.
    pub id: String,

    /// Format of the presented credential.
    pub format: String,

    /// JSONPath to the credential within the `vp_token`.
    pub path: String,
}

/// Claims carried by a presentation (`vp_token`) JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VpClaims {
    /// The presenting holder's DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// The presenting holder's DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Unique presentation identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// The nonce from the authorization response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// The presentation wrapper.
    pub vp: VpToken,
}

/// The `vp` claim of a presentation JWT.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VpToken {
    /// JSON-LD context.
    #[serde(rename = "@context")]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub context: Vec<String>,

    /// Presentation types.
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub type_: Vec<String>,

    /// Embedded credential JWTs: a single string or an array of strings.
    #[serde(rename = "verifiableCredential")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifiable_credential: Option<Value>,
}

/// Request for verifier metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VerifierMetadataRequest {}

/// Verifier metadata response.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct VerifierMetadataResponse {
    /// The verifier's identifier, as a DID.
    pub verifier_did: String,

    /// Where to post presentation responses.
    pub response_uri: String,

    /// Presentation formats the verifier accepts, keyed by format
    /// identifier.
    pub vp_formats: HashMap<String, FormatSpec>,
}
