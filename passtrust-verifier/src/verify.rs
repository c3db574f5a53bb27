//! # Verification Orchestrator
//!
//! The capstone of the verifier: a linear gate pipeline with no retries.
//! Each gate is terminal on failure and the caller must restart from a
//! fresh challenge:
//!
//! 1. consume the challenge (replay/freshness gate);
//! 2. validate the commitment token and its issuer signature;
//! 3. check issuer trust (fail-closed by default);
//! 4. check revocation status (fail-open by default);
//! 5. validate the bound predicate proof;
//! 6. mint a decision token.

use passtrust_core::jose::jws;
use passtrust_core::jose::jwt::Jwt;
use passtrust_openid::issuer::{CommitmentJwtClaims, CredentialJwtClaims};
use passtrust_openid::verifier::{
    SUPPORTED_PREDICATE, Verifier as Config, VerifyRequest, VerifyResponse,
};
use passtrust_openid::{Error, Result};
use serde_json::Value;
use tracing::instrument;

use crate::provider::{ChallengeStore, Clock, Consumption, Metadata, Provider, Verifier};
use crate::{decision, revocation, trust};

/// Verification request handler.
///
/// # Errors
///
/// Returns the first gate's error: challenge, commitment, trust, revocation,
/// or proof.
#[instrument(level = "debug", skip(provider))]
pub async fn verify(provider: impl Provider, request: &VerifyRequest) -> Result<VerifyResponse> {
    let config = Metadata::verifier(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifier metadata: {e}")))?;
    let now = Clock::now(&provider);

    // gate 1: the challenge must be fresh and unconsumed
    let consumption = ChallengeStore::consume(&provider, &request.challenge, now)
        .await
        .map_err(|e| Error::ServerError(format!("issue consuming challenge: {e}")))?;
    match consumption {
        Consumption::Consumed => {}
        Consumption::Unknown => {
            return Err(Error::UnknownChallenge(format!(
                "challenge {} was never minted",
                request.challenge
            )));
        }
        Consumption::AlreadyUsed => {
            return Err(Error::ChallengeUsed(format!(
                "challenge {} has already been consumed",
                request.challenge
            )));
        }
        Consumption::Expired => {
            return Err(Error::ChallengeExpired(format!(
                "challenge {} has expired",
                request.challenge
            )));
        }
    }

    // gate 2: the commitment must be well-formed and signed by its issuer
    let commitment = commitment_gate(&provider, request).await?;

    // gate 3: the issuer must be trusted
    trust::gate(&provider, config.trust_policy, &commitment.iss).await?;

    // gate 4: the credential must not be revoked
    if !commitment.jti.is_empty() {
        revocation::gate(&provider, config.revocation_policy, &commitment.jti).await?;
    }

    // gate 5: the proof must be bound to the consumed challenge
    let verified_claims = proof_gate(request)?;

    // gate 6: mint the decision token
    let (decision_token, expires_in) =
        decision::mint(&provider, &config, &request.holder_did, verified_claims.clone(), now)
            .await?;

    Ok(VerifyResponse {
        decision_token,
        verified_claims,
        assurance_level: passtrust_openid::verifier::ASSURANCE_LOW.into(),
        expires_in,
    })
}

// Decode the commitment token, verifying issuer signature and holder
// binding.
async fn commitment_gate(
    provider: &impl Provider, request: &VerifyRequest,
) -> Result<CommitmentJwtClaims> {
    let resolver_provider = provider.clone();
    let jwt: Jwt<CommitmentJwtClaims> = jws::decode(&request.commitment_jwt, |kid| {
        let p = resolver_provider;
        async move { Verifier::deref_jwk(&p, &kid).await }
    })
    .await
    .map_err(|e| Error::InvalidSignature(format!("commitment is invalid: {e}")))?;

    let claims = jwt.claims;
    if claims.iss.trim().is_empty() {
        return Err(Error::InvalidRequest("commitment iss is not set".into()));
    }
    if claims.sub.trim().is_empty() {
        return Err(Error::InvalidRequest("commitment sub is not set".into()));
    }

    // the signing key must belong to the claimed issuer
    let signing_did = jwt.header.kid.split('#').next().unwrap_or_default();
    if signing_did != claims.iss {
        return Err(Error::InvalidSignature("commitment is not signed by its issuer".into()));
    }

    if claims.sub != request.holder_did {
        return Err(Error::SubjectMismatch(format!(
            "commitment subject {} does not match holder {}",
            claims.sub, request.holder_did
        )));
    }
    if claims.commitment_hash.trim().is_empty() {
        return Err(Error::InvalidRequest("commitment_hash is not set".into()));
    }

    Ok(claims)
}

// Validate the predicate proof's binding to the consumed challenge,
// returning the claim names it establishes.
fn proof_gate(request: &VerifyRequest) -> Result<Vec<String>> {
    if request.proof.trim().is_empty() {
        return Err(Error::ProofNotBound("proof is not set".into()));
    }
    if request.public_signals.challenge != request.challenge {
        return Err(Error::ProofNotBound(
            "public signals are not bound to the consumed challenge".into(),
        ));
    }
    if request.public_signals.predicate != SUPPORTED_PREDICATE {
        return Err(Error::UnsupportedPredicate(format!(
            "predicate {} is not supported",
            request.public_signals.predicate
        )));
    }
    if request.public_signals.result != Value::Bool(true) {
        return Err(Error::ProofResultFalse("proof result signal is not true".into()));
    }

    Ok(vec![SUPPORTED_PREDICATE.into()])
}

// Verify one presented credential through the trust and revocation gates,
// returning the claim names it attests. Shared with the presentation
// response endpoint.
pub(crate) async fn verify_credential(
    provider: &impl Provider, config: &Config, holder_did: &str, credential_jwt: &str,
) -> Result<Vec<String>> {
    let resolver_provider = provider.clone();
    let jwt: Jwt<CredentialJwtClaims> = jws::decode(credential_jwt, |kid| {
        let p = resolver_provider;
        async move { Verifier::deref_jwk(&p, &kid).await }
    })
    .await
    .map_err(|e| Error::InvalidSignature(format!("credential is invalid: {e}")))?;

    let claims = jwt.claims;
    let signing_did = jwt.header.kid.split('#').next().unwrap_or_default();
    if signing_did != claims.iss {
        return Err(Error::InvalidSignature("credential is not signed by its issuer".into()));
    }
    if claims.sub != holder_did {
        return Err(Error::SubjectMismatch(format!(
            "credential subject {} does not match holder {holder_did}",
            claims.sub
        )));
    }

    trust::gate(provider, config.trust_policy, &claims.iss).await?;
    if !claims.jti.is_empty() {
        revocation::gate(provider, config.revocation_policy, &claims.jti).await?;
    }

    Ok(claims.vc.credential_subject.keys().cloned().collect())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use passtrust_core::jose::jwt::Type;
    use passtrust_core::keys::SigningKeypair;
    use passtrust_openid::provider::FailurePolicy;
    use passtrust_openid::verifier::{DecisionTokenClaims, PublicSignals};
    use serde_json::json;
    use test_utils::Keystore;
    use test_utils::verifier::{Provider, VERIFIER_DID};

    use super::*;
    use crate::challenge;

    const ISS_A: &str = "did:iss:A";
    const HOLDER_1: &str = "did:holder:1";

    async fn commitment_jwt(provider: &Provider, iss: &str, sub: &str, hash: &str) -> String {
        let keypair = SigningKeypair::generate();
        provider.register_key(iss, keypair.public_jwk());
        let keystore = Keystore::new(keypair, iss);

        let claims = CommitmentJwtClaims {
            iss: iss.into(),
            sub: sub.into(),
            jti: "cred-1".into(),
            iat: Clock::now(provider).timestamp(),
            commitment_hash: hash.into(),
        };
        jws::encode(Type::Jwt, &claims, &keystore).await.expect("commitment encodes")
    }

    async fn mint_challenge(provider: &Provider) -> String {
        let response = challenge::challenge(provider.clone(), &Default::default())
            .await
            .expect("challenge mints");
        response.challenge
    }

    fn request(challenge: &str, commitment_jwt: &str) -> VerifyRequest {
        VerifyRequest {
            challenge: challenge.into(),
            holder_did: HOLDER_1.into(),
            commitment_jwt: commitment_jwt.into(),
            proof: "p".into(),
            public_signals: PublicSignals {
                predicate: "over_18".into(),
                challenge: challenge.into(),
                result: json!(true),
            },
        }
    }

    #[tokio::test]
    async fn full_pipeline() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let response =
            verify(provider.clone(), &request(&c1, &commitment)).await.expect("response is ok");
        assert_eq!(response.verified_claims, vec!["over_18".to_string()]);
        assert_eq!(response.assurance_level, "LOW");
        assert_eq!(response.expires_in, 300);

        // the decision token is signed by the verifier for the holder
        let jwk = provider.public_jwk();
        let jwt: Jwt<DecisionTokenClaims> =
            jws::decode(&response.decision_token, |_kid| async move { Ok(jwk) })
                .await
                .expect("decision token verifies");
        assert_eq!(jwt.claims.iss, VERIFIER_DID);
        assert_eq!(jwt.claims.sub, HOLDER_1);
        assert_eq!(jwt.claims.exp - jwt.claims.iat, 300);
    }

    #[tokio::test]
    async fn challenge_is_single_use() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        verify(provider.clone(), &request(&c1, &commitment)).await.expect("first verify is ok");

        // resubmitting the same challenge fails regardless of proof validity
        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::ChallengeUsed(_)));
    }

    #[tokio::test]
    async fn unknown_challenge() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let err =
            verify(provider, &request("never-minted", &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::UnknownChallenge(_)));
    }

    #[tokio::test]
    async fn expired_challenge() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        provider.clock().advance(TimeDelta::try_seconds(301).unwrap_or_default());
        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::ChallengeExpired(_)));
    }

    #[tokio::test]
    async fn subject_mismatch() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, "did:holder:2", "abc123").await;

        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::SubjectMismatch(_)));
    }

    #[tokio::test]
    async fn untrusted_issuer() {
        test_utils::init_tracer();

        let provider = Provider::new();
        // issuer key resolves but the registry does not trust it

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::UntrustedIssuer(_)));
    }

    #[tokio::test]
    async fn forged_issuer_signature() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        // commitment claims ISS_A but is signed by another party's key
        let keypair = SigningKeypair::generate();
        provider.register_key("did:iss:B", keypair.public_jwk());
        let keystore = Keystore::new(keypair, "did:iss:B");
        let claims = CommitmentJwtClaims {
            iss: ISS_A.into(),
            sub: HOLDER_1.into(),
            jti: "cred-1".into(),
            iat: Clock::now(&provider).timestamp(),
            commitment_hash: "abc123".into(),
        };
        let forged = jws::encode(Type::Jwt, &claims, &keystore).await.expect("encodes");

        let c1 = mint_challenge(&provider).await;
        let err = verify(provider, &request(&c1, &forged)).await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn proof_not_bound() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let c2 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let mut req = request(&c1, &commitment);
        req.public_signals.challenge = c2;

        let err = verify(provider, &req).await.expect_err("should fail");
        assert!(matches!(err, Error::ProofNotBound(_)));
    }

    #[tokio::test]
    async fn unsupported_predicate() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let mut req = request(&c1, &commitment);
        req.public_signals.predicate = "over_65".into();

        let err = verify(provider, &req).await.expect_err("should fail");
        assert!(matches!(err, Error::UnsupportedPredicate(_)));
    }

    #[tokio::test]
    async fn proof_result_false() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let mut req = request(&c1, &commitment);
        req.public_signals.result = json!("true");

        let err = verify(provider, &req).await.expect_err("should fail");
        assert!(matches!(err, Error::ProofResultFalse(_)));
    }

    #[tokio::test]
    async fn revoked_credential() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);
        provider.authority().revoke("cred-1");

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::VerificationFailed(_)));
    }

    #[tokio::test]
    async fn trust_outage_fails_closed() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);
        provider.registry().set_failing(true);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn revocation_outage_fails_open() {
        test_utils::init_tracer();

        let provider = Provider::new();
        provider.registry().trust(ISS_A);
        provider.authority().set_failing(true);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let response = verify(provider, &request(&c1, &commitment)).await.expect("response is ok");
        assert_eq!(response.verified_claims, vec!["over_18".to_string()]);
    }

    #[tokio::test]
    async fn revocation_outage_with_closed_policy() {
        test_utils::init_tracer();

        let provider = Provider::new().with_revocation_policy(FailurePolicy::FailClosed);
        provider.registry().trust(ISS_A);
        provider.authority().set_failing(true);

        let c1 = mint_challenge(&provider).await;
        let commitment = commitment_jwt(&provider, ISS_A, HOLDER_1, "abc123").await;

        let err = verify(provider, &request(&c1, &commitment)).await.expect_err("should fail");
        assert!(matches!(err, Error::UpstreamUnavailable(_)));
    }
}
