//! # Response Endpoint
//!
//! Accepts a wallet's presentation response: validates the holder's
//! signature over the `vp_token`, extracts the embedded credentials, runs
//! each through the trust and revocation gates, and mints a decision token
//! over the union of verified claims.

use std::collections::BTreeSet;

use passtrust_core::jose::jws;
use passtrust_core::jose::jwt::Jwt;
use passtrust_openid::verifier::{ResponseRequest, ResponseResponse, VpClaims};
use passtrust_openid::{Error, Result};
use serde_json::Value;
use tracing::instrument;

use crate::provider::{Clock, Metadata, Provider, StateStore, Verifier};
use crate::state::State;
use crate::{decision, verify};

/// Presentation response handler.
///
/// # Errors
///
/// Returns an error if the response is missing its token or submission, the
/// holder's signature does not hold, or no embedded credential verifies.
#[instrument(level = "debug", skip(provider))]
pub async fn response(
    provider: impl Provider, request: &ResponseRequest,
) -> Result<ResponseResponse> {
    let config = Metadata::verifier(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifier metadata: {e}")))?;

    let Some(vp_token) = &request.vp_token else {
        return Err(Error::InvalidPresentation("vp_token is not set".into()));
    };
    if request.presentation_submission.is_none() {
        return Err(Error::InvalidSubmission("presentation_submission is not set".into()));
    }

    // the presentation must be signed by the holder it names
    let resolver_provider = provider.clone();
    let jwt: Jwt<VpClaims> = jws::decode(vp_token, |kid| {
        let p = resolver_provider;
        async move { Verifier::deref_jwk(&p, &kid).await }
    })
    .await
    .map_err(|e| Error::InvalidPresentation(format!("vp_token is invalid: {e}")))?;

    let Some(holder_did) = jwt.claims.sub.clone() else {
        return Err(Error::InvalidSubject("presentation names no subject".into()));
    };
    let signing_did = jwt.header.kid.split('#').next().unwrap_or_default();
    if signing_did != holder_did {
        return Err(Error::InvalidPresentation(
            "presentation is not signed by its holder".into(),
        ));
    }

    // when the wallet responds into a session, consume it and check the
    // nonce binding
    if let Some(session_id) = &request.state {
        let Ok(buf) = StateStore::get(&provider, session_id).await else {
            return Err(Error::InvalidRequest(format!("session {session_id} not found")));
        };
        let session = State::try_from(buf.as_slice())?;
        StateStore::purge(&provider, session_id)
            .await
            .map_err(|e| Error::ServerError(format!("issue purging state: {e}")))?;

        if session.expires_at <= Clock::now(&provider) {
            return Err(Error::InvalidRequest(format!("session {session_id} has expired")));
        }
        if jwt.claims.nonce.as_deref() != Some(session.nonce.as_str()) {
            return Err(Error::InvalidPresentation(
                "presentation nonce does not match session".into(),
            ));
        }
    }

    let credentials = embedded_credentials(jwt.claims.vp.verifiable_credential.as_ref())?;

    // every credential that passes the gates contributes its claims
    let mut verified = BTreeSet::new();
    let mut any_verified = false;
    for credential_jwt in &credentials {
        match verify::verify_credential(&provider, &config, &holder_did, credential_jwt).await {
            Ok(claims) => {
                any_verified = true;
                verified.extend(claims);
            }
            Err(e) => tracing::debug!("credential failed verification: {e}"),
        }
    }
    if !any_verified {
        return Err(Error::VerificationFailed(
            "none of the presented credentials verified".into(),
        ));
    }

    let verified_claims: Vec<String> = verified.into_iter().collect();
    let now = Clock::now(&provider);
    let (decision_token, expires_in) =
        decision::mint(&provider, &config, &holder_did, verified_claims.clone(), now).await?;

    Ok(ResponseResponse {
        decision_token,
        verified_claims,
        assurance_level: passtrust_openid::verifier::ASSURANCE_LOW.into(),
        expires_in,
    })
}

// The vp's verifiableCredential member holds a single JWT string or an
// array of them.
fn embedded_credentials(member: Option<&Value>) -> Result<Vec<String>> {
    let credentials = match member {
        Some(Value::String(jwt)) => vec![jwt.clone()],
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| entry.as_str().map(ToString::to_string))
            .collect(),
        _ => Vec::new(),
    };
    if credentials.is_empty() {
        return Err(Error::NoCredentials("presentation embeds no credentials".into()));
    }

    Ok(credentials)
}
