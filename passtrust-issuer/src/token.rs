//! # Token Endpoint
//!
//! The Token Endpoint exchanges a pre-authorized code for an access token
//! granting access to the Credential Endpoint, per the pre-authorized code
//! flow of [RFC6749](https://tools.ietf.org/html/rfc6749#section-5.1).
//!
//! The access token is itself a signed JWT so the Credential Endpoint can
//! verify it without a store round trip; token state carries the `c_nonce`
//! the wallet must bind its proof of possession to.

use passtrust_core::gen;
use passtrust_core::jose::jws;
use passtrust_core::jose::jwt::Type;
use passtrust_openid::issuer::{
    AccessTokenClaims, PRE_AUTH_GRANT_TYPE, TokenRequest, TokenResponse, TokenType,
};
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::provider::{Clock, Metadata, Provider, StateStore};
use crate::state::{Expire, State};

/// Token request handler.
///
/// # Errors
///
/// Returns an error if the grant is not the pre-authorized code grant, the
/// code is missing, or the provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn token(provider: impl Provider, request: &TokenRequest) -> Result<TokenResponse> {
    verify(request)?;
    process(provider, request).await
}

// Verify the token request.
fn verify(request: &TokenRequest) -> Result<()> {
    tracing::debug!("token::verify");

    if request.grant_type != PRE_AUTH_GRANT_TYPE {
        return Err(Error::UnsupportedGrantType(format!(
            "grant type must be {PRE_AUTH_GRANT_TYPE}"
        )));
    }

    let Some(code) = &request.pre_authorized_code else {
        return Err(Error::InvalidGrant("pre-authorized code is not set".into()));
    };
    if code.trim().is_empty() {
        return Err(Error::InvalidGrant("pre-authorized code is blank".into()));
    }

    Ok(())
}

// Exchange the pre-authorized code for an access token, saving token state
// along the way.
async fn process(provider: impl Provider, request: &TokenRequest) -> Result<TokenResponse> {
    tracing::debug!("token::process");

    let issuer = Metadata::issuer(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting issuer metadata: {e}")))?;
    let now = Clock::now(&provider);

    // already checked in verify
    let code = request.pre_authorized_code.clone().unwrap_or_default();

    let jti = uuid::Uuid::new_v4().to_string();
    let claims = AccessTokenClaims {
        iss: issuer.credential_issuer,
        jti: jti.clone(),
        iat: now.timestamp(),
        exp: (now + Expire::Access.duration()).timestamp(),
        pre_authorized_code: code.clone(),
    };
    let access_token = jws::encode(Type::Jwt, &claims, &provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue signing access token: {e}")))?;

    let c_nonce = gen::nonce();
    let state = State {
        expires_at: now + Expire::Access.duration(),
        pre_authorized_code: code,
        c_nonce: c_nonce.clone(),
        c_nonce_expires_at: now + Expire::Nonce.duration(),
    };
    StateStore::put(&provider, &jti, state.to_vec()?, state.expires_at)
        .await
        .map_err(|e| Error::ServerError(format!("issue saving state: {e}")))?;

    Ok(TokenResponse {
        access_token,
        token_type: TokenType::Bearer,
        expires_in: Expire::Access.duration().num_seconds(),
        c_nonce,
        c_nonce_expires_in: Expire::Nonce.duration().num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_utils::issuer::{ISSUER_DID, Provider};

    use super::*;

    #[tokio::test]
    async fn pre_authorized() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "grant_type": "urn:ietf:params:oauth:grant-type:pre-authorized_code",
            "pre-authorized_code": "ABCDEF",
        });
        let request: TokenRequest = serde_json::from_value(value).expect("request is valid");

        let response = token(provider.clone(), &request).await.expect("response is ok");
        assert_eq!(response.token_type, TokenType::Bearer);
        assert_eq!(response.expires_in, 3600);
        assert_eq!(response.c_nonce_expires_in, 300);
        assert!(!response.c_nonce.is_empty());

        // the access token is a JWT signed by the issuer and embeds the code
        let jwk = provider.public_jwk();
        let jwt: passtrust_core::jose::jwt::Jwt<AccessTokenClaims> =
            jws::decode(&response.access_token, |_kid| async move { Ok(jwk) })
                .await
                .expect("token verifies");
        assert_eq!(jwt.claims.iss, ISSUER_DID);
        assert_eq!(jwt.claims.pre_authorized_code, "ABCDEF");
        assert_eq!(jwt.claims.exp - jwt.claims.iat, 3600);

        // token state is saved under the token's jti
        let buf = StateStore::get(&provider, &jwt.claims.jti).await.expect("state exists");
        let state = State::from_slice(&buf).expect("state deserializes");
        assert_eq!(state.c_nonce, response.c_nonce);
    }

    #[tokio::test]
    async fn unsupported_grant() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "grant_type": "authorization_code",
            "pre-authorized_code": "ABCDEF",
        });
        let request: TokenRequest = serde_json::from_value(value).expect("request is valid");

        let err = token(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedGrantType(_)));
    }

    #[tokio::test]
    async fn blank_code() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "grant_type": "urn:ietf:params:oauth:grant-type:pre-authorized_code",
            "pre-authorized_code": "  ",
        });
        let request: TokenRequest = serde_json::from_value(value).expect("request is valid");

        let err = token(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidGrant(_)));
    }

    #[tokio::test]
    async fn missing_code() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "grant_type": "urn:ietf:params:oauth:grant-type:pre-authorized_code",
        });
        let request: TokenRequest = serde_json::from_value(value).expect("request is valid");

        let err = token(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidGrant(_)));
    }
}
