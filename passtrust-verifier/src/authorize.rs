//! # Authorization Endpoint
//!
//! Opens a presentation exchange: validates the requested response type,
//! creates a session with a fresh nonce, and hands the wallet the
//! presentation definition plus the callback URI to respond to.

use passtrust_core::gen;
use passtrust_openid::verifier::{AuthorizeRequest, AuthorizeResponse};
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::definition;
use crate::provider::{Clock, Metadata, Provider, StateStore};
use crate::state::{Expire, State};

/// Authorization request handler.
///
/// # Errors
///
/// Returns an error if the response type is not `vp_token` or the provider
/// is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn authorize(
    provider: impl Provider, request: &AuthorizeRequest,
) -> Result<AuthorizeResponse> {
    verify(request)?;
    process(provider, request).await
}

// Verify the authorization request.
fn verify(request: &AuthorizeRequest) -> Result<()> {
    tracing::debug!("authorize::verify");

    if request.response_type != "vp_token" {
        return Err(Error::InvalidRequest("response_type must be vp_token".into()));
    }

    Ok(())
}

// Create the session and save its state.
async fn process(provider: impl Provider, _request: &AuthorizeRequest) -> Result<AuthorizeResponse> {
    tracing::debug!("authorize::process");

    let config = Metadata::verifier(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifier metadata: {e}")))?;
    let now = Clock::now(&provider);

    let session_id = uuid::Uuid::new_v4().to_string();
    let nonce = gen::nonce();

    let state = State {
        expires_at: now + Expire::Session.duration(),
        nonce: nonce.clone(),
    };
    StateStore::put(&provider, &session_id, state.to_vec()?, state.expires_at)
        .await
        .map_err(|e| Error::ServerError(format!("issue saving state: {e}")))?;

    Ok(AuthorizeResponse {
        session_id,
        nonce,
        presentation_definition: definition::passport_definition(),
        response_uri: config.response_uri,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_utils::verifier::Provider;

    use super::*;

    #[tokio::test]
    async fn opens_session() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({"response_type": "vp_token"});
        let request: AuthorizeRequest = serde_json::from_value(value).expect("request is valid");

        let response = authorize(provider.clone(), &request).await.expect("response is ok");
        assert!(!response.session_id.is_empty());
        assert!(!response.nonce.is_empty());
        assert!(!response.response_uri.is_empty());

        // session state holds the nonce
        let buf = StateStore::get(&provider, &response.session_id).await.expect("state exists");
        let state = State::from_slice(&buf).expect("state deserializes");
        assert_eq!(state.nonce, response.nonce);
    }

    #[tokio::test]
    async fn rejects_other_response_types() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({"response_type": "code"});
        let request: AuthorizeRequest = serde_json::from_value(value).expect("request is valid");

        let err = authorize(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
