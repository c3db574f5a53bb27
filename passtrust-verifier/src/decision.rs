//! # Decision Tokens
//!
//! Short-lived tokens minted on successful verification, presented by
//! relying parties to gate downstream actions without re-running the
//! verification pipeline.

use chrono::{DateTime, TimeDelta, Utc};
use passtrust_core::jose::jws;
use passtrust_core::jose::jwt::{Jwt, Type};
use passtrust_openid::verifier::{
    ASSURANCE_LOW, DecisionTokenClaims, ValidateRequest, ValidateResponse, Verifier as Config,
};
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::provider::{Clock, Metadata, Provider, Signer};

// Mint a decision token for a verified holder, returning the token and its
// lifetime in seconds.
pub(crate) async fn mint(
    provider: &impl Provider, config: &Config, holder_did: &str, verified_claims: Vec<String>,
    now: DateTime<Utc>,
) -> Result<(String, i64)> {
    let claims = DecisionTokenClaims {
        iss: config.verifier_did.clone(),
        sub: holder_did.into(),
        jti: uuid::Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: (now + TimeDelta::try_seconds(config.decision_ttl).unwrap_or_default()).timestamp(),
        verified_claims,
        assurance_level: ASSURANCE_LOW.into(),
        verified_at: now,
    };
    let token = jws::encode(Type::Jwt, &claims, provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue signing decision token: {e}")))?;

    Ok((token, config.decision_ttl))
}

/// Validate a decision token presented by a relying party.
///
/// # Errors
///
/// Returns `InvalidToken` if the token's signature, issuer, subject, or
/// expiry does not hold.
#[instrument(level = "debug", skip(provider))]
pub async fn validate(
    provider: impl Provider, request: &ValidateRequest,
) -> Result<ValidateResponse> {
    tracing::debug!("decision::validate");

    let config = Metadata::verifier(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifier metadata: {e}")))?;

    // decision tokens are self-issued, so verify with our own key
    let jwk = Signer::verifying_key(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifying key: {e}")))?;
    let jwt: Jwt<DecisionTokenClaims> =
        jws::decode(&request.decision_token, |_kid| async move { Ok(jwk) })
            .await
            .map_err(|e| Error::InvalidToken(format!("decision token is invalid: {e}")))?;

    if jwt.claims.iss != config.verifier_did {
        return Err(Error::InvalidToken("decision token was not issued by this verifier".into()));
    }
    if jwt.claims.sub.trim().is_empty() {
        return Err(Error::InvalidToken("decision token names no subject".into()));
    }
    if jwt.claims.exp <= Clock::now(&provider).timestamp() {
        return Err(Error::InvalidToken("decision token has expired".into()));
    }
    if jwt.claims.verified_claims.is_empty() {
        return Err(Error::InvalidToken("decision token attests no claims".into()));
    }

    Ok(ValidateResponse {
        holder_did: jwt.claims.sub,
        verified_claims: jwt.claims.verified_claims,
        assurance_level: jwt.claims.assurance_level,
    })
}

/// Whether a validated token attests the named claim. Convenience for
/// relying parties gating an action on a single claim.
#[must_use]
pub fn has_claim(verified_claims: &[String], name: &str) -> bool {
    verified_claims.iter().any(|claim| claim == name)
}

#[cfg(test)]
mod tests {
    use test_utils::verifier::{Provider, VERIFIER_DID};

    use super::*;

    const HOLDER_DID: &str = "did:jwk:holder";

    #[tokio::test]
    async fn validates_own_token() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let config = Metadata::verifier(&provider).await.expect("metadata is ok");
        let now = Clock::now(&provider);

        let (token, expires_in) =
            mint(&provider, &config, HOLDER_DID, vec!["over_18".into()], now)
                .await
                .expect("mint is ok");
        assert_eq!(expires_in, 300);

        let response = validate(provider, &ValidateRequest { decision_token: token })
            .await
            .expect("response is ok");
        assert_eq!(response.holder_did, HOLDER_DID);
        assert_eq!(response.assurance_level, "LOW");
        assert!(has_claim(&response.verified_claims, "over_18"));
        assert!(!has_claim(&response.verified_claims, "over_65"));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let config = Metadata::verifier(&provider).await.expect("metadata is ok");
        let now = Clock::now(&provider);

        let (token, _) = mint(&provider, &config, HOLDER_DID, vec!["over_18".into()], now)
            .await
            .expect("mint is ok");

        provider.clock().advance(TimeDelta::try_seconds(301).unwrap_or_default());
        let err = validate(provider, &ValidateRequest { decision_token: token })
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_foreign_issuer() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let now = Clock::now(&provider);

        // a token claiming another verifier as issuer fails even when signed
        // with our key
        let config = Config {
            verifier_did: "did:web:other-verifier.io".into(),
            ..Config::default()
        };
        let (token, _) = mint(&provider, &config, HOLDER_DID, vec!["over_18".into()], now)
            .await
            .expect("mint is ok");
        assert_ne!(config.verifier_did, VERIFIER_DID);

        let err = validate(provider, &ValidateRequest { decision_token: token })
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::InvalidToken(_)));
    }

    #[tokio::test]
    async fn rejects_tampered_token() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let err = validate(provider, &ValidateRequest { decision_token: "aa.bb.cc".into() })
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::InvalidToken(_)));
    }
}
