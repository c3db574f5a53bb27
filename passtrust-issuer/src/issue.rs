//! # Credential Issuance
//!
//! Issues a signed credential and its companion commitment token for a
//! holder's claims. The commitment token binds a SHA-256 digest of the
//! canonicalised claims so a verifier can later check integrity without
//! seeing the claims themselves.

use passtrust_core::hash;
use passtrust_core::jose::jws;
use passtrust_core::jose::jwt::Type;
use passtrust_openid::issuer::{
    CommitmentJwtClaims, CredentialJwtClaims, CredentialStatus, IssuanceRecord, IssueRequest,
    IssueResponse, StatusRecord, VcClaims,
};
use passtrust_openid::{Error, Result};
use serde_json::Value;
use tracing::instrument;

use crate::liveness;
use crate::provider::{Clock, IssuanceLog, Metadata, Provider, StatusStore};

/// Issue request handler.
///
/// # Errors
///
/// Returns an error if the request is invalid, the liveness gate fails, or
/// the provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn issue(provider: impl Provider, request: &IssueRequest) -> Result<IssueResponse> {
    verify(&provider, request)?;
    process(provider, request).await
}

// Verify the issue request.
fn verify(provider: &impl Provider, request: &IssueRequest) -> Result<()> {
    tracing::debug!("issue::verify");

    if !request.holder_did.starts_with("did:") {
        return Err(Error::InvalidRequest("holder_did is not a DID".into()));
    }
    if request.claims.is_empty() {
        return Err(Error::InvalidRequest("no claims to attest".into()));
    }
    if let Some(proof) = &request.liveness_proof {
        liveness::validate(proof, Clock::now(provider))?;
    }

    Ok(())
}

// Sign the credential and commitment and log the issuance.
async fn process(provider: impl Provider, request: &IssueRequest) -> Result<IssueResponse> {
    tracing::debug!("issue::process");

    let issuer = Metadata::issuer(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting issuer metadata: {e}")))?;
    let now = Clock::now(&provider);

    let credential_id = uuid::Uuid::new_v4().to_string();
    let commitment_hash = hash::commitment_hash(&Value::Object(request.claims.clone()));

    let credential = CredentialJwtClaims {
        iss: issuer.credential_issuer.clone(),
        sub: request.holder_did.clone(),
        jti: credential_id.clone(),
        iat: now.timestamp(),
        vc: VcClaims {
            credential_subject: request.claims.clone(),
            ..VcClaims::default()
        },
    };
    let credential_jwt = jws::encode(Type::Jwt, &credential, &provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue signing credential: {e}")))?;

    let commitment = CommitmentJwtClaims {
        iss: issuer.credential_issuer,
        sub: request.holder_did.clone(),
        jti: credential_id.clone(),
        iat: now.timestamp(),
        commitment_hash: commitment_hash.clone(),
    };
    let commitment_jwt = jws::encode(Type::Jwt, &commitment, &provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue signing commitment: {e}")))?;

    let record = IssuanceRecord {
        credential_id: credential_id.clone(),
        holder_did: request.holder_did.clone(),
        commitment_hash: commitment_hash.clone(),
        issued_at: now,
    };
    IssuanceLog::record(&provider, &record)
        .await
        .map_err(|e| Error::ServerError(format!("issue logging issuance: {e}")))?;

    // every issued credential starts with an explicit VALID status record
    let status = StatusRecord {
        credential_id: credential_id.clone(),
        status: CredentialStatus::Valid,
        ..StatusRecord::default()
    };
    StatusStore::put_status(&provider, &status)
        .await
        .map_err(|e| Error::ServerError(format!("issue initialising status: {e}")))?;

    Ok(IssueResponse {
        credential_id,
        credential_jwt,
        commitment_jwt,
        commitment_hash,
    })
}

#[cfg(test)]
mod tests {
    use passtrust_core::jose::jwt::Jwt;
    use serde_json::json;
    use test_utils::issuer::{ISSUER_DID, Provider};

    use super::*;

    const HOLDER_DID: &str = "did:jwk:holder";

    #[tokio::test]
    async fn issues_credential_and_commitment() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "holder_did": HOLDER_DID,
            "claims": {
                "given_name": "Alice",
                "family_name": "Doe",
                "nationality": "NL",
                "birth_date": "1990-01-01",
            },
        });
        let request: IssueRequest = serde_json::from_value(value).expect("request is valid");

        let response = issue(provider.clone(), &request).await.expect("response is ok");

        let jwk = provider.public_jwk();
        let credential: Jwt<CredentialJwtClaims> =
            jws::decode(&response.credential_jwt, |_kid| async move { Ok(jwk) })
                .await
                .expect("credential verifies");
        assert_eq!(credential.claims.iss, ISSUER_DID);
        assert_eq!(credential.claims.sub, HOLDER_DID);
        assert_eq!(credential.claims.jti, response.credential_id);
        assert_eq!(credential.claims.vc.credential_subject["given_name"], json!("Alice"));

        let jwk = provider.public_jwk();
        let commitment: Jwt<CommitmentJwtClaims> =
            jws::decode(&response.commitment_jwt, |_kid| async move { Ok(jwk) })
                .await
                .expect("commitment verifies");
        assert_eq!(commitment.claims.sub, HOLDER_DID);
        assert_eq!(commitment.claims.jti, response.credential_id);
        assert_eq!(commitment.claims.commitment_hash, response.commitment_hash);

        // commitment binds the canonicalised claims
        let expected = hash::commitment_hash(&json!({
            "birth_date": "1990-01-01",
            "family_name": "Doe",
            "given_name": "Alice",
            "nationality": "NL",
        }));
        assert_eq!(response.commitment_hash, expected);

        // issuance is logged
        let record = provider.issuance(&response.credential_id).expect("issuance is logged");
        assert_eq!(record.holder_did, HOLDER_DID);
        assert_eq!(record.commitment_hash, response.commitment_hash);

        // and the credential starts out valid
        let valid = crate::status::is_valid(provider, &response.credential_id)
            .await
            .expect("is_valid answers");
        assert!(valid);
    }

    #[tokio::test]
    async fn rejects_non_did_holder() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "holder_did": "not-a-did",
            "claims": {"given_name": "Alice"},
        });
        let request: IssueRequest = serde_json::from_value(value).expect("request is valid");

        let err = issue(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn rejects_empty_claims() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "holder_did": HOLDER_DID,
            "claims": {},
        });
        let request: IssueRequest = serde_json::from_value(value).expect("request is valid");

        let err = issue(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn enforces_liveness_gate() {
        test_utils::init_tracer();

        let provider = Provider::new();
        let value = json!({
            "holder_did": HOLDER_DID,
            "claims": {"given_name": "Alice"},
            "liveness_proof": {
                "score": 0.4,
                "confidence": 0.9,
                "is_live": true,
                "captured_at": chrono::Utc::now(),
            },
        });
        let request: IssueRequest = serde_json::from_value(value).expect("request is valid");

        let err = issue(provider, &request).await.expect_err("should fail");
        assert!(matches!(err, Error::AccessDenied(_)));
    }
}
