//! # Credential Endpoint
//!
//! The Credential Endpoint issues a credential (and its commitment token)
//! in exchange for a valid access token and a proof of possession of the
//! holder's key material.
//!
//! The wallet's proof signature is verified against the key its `kid`
//! resolves to before the proof's subject is trusted. A proof that names a
//! subject but cannot demonstrate possession of its key is rejected.

use passtrust_core::gen;
use passtrust_core::jose::jws;
use passtrust_core::jose::jwt::Jwt;
use passtrust_openid::issuer::{
    AccessTokenClaims, CredentialRequest, CredentialResponse, IssueRequest, ProofClaims,
};
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::issue;
use crate::provider::{Clock, Provider, Signer, StateStore, Verifier};
use crate::state::{Expire, State};

/// Credential request handler.
///
/// # Errors
///
/// Returns an error if the access token or proof is invalid, or if the
/// provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn credential(
    provider: impl Provider, request: &CredentialRequest,
) -> Result<CredentialResponse> {
    // the access token must verify against the issuer's own key
    let jwk = Signer::verifying_key(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifying key: {e}")))?;
    let token: Jwt<AccessTokenClaims> =
        jws::decode(&request.access_token, |_kid| async move { Ok(jwk) })
            .await
            .map_err(|e| Error::InvalidToken(format!("access token is invalid: {e}")))?;

    let now = Clock::now(&provider);
    if token.claims.exp <= now.timestamp() {
        return Err(Error::InvalidToken("access token has expired".into()));
    }

    // restore token state
    let Ok(buf) = StateStore::get(&provider, &token.claims.jti).await else {
        return Err(Error::InvalidToken("token state not found".into()));
    };
    let state = State::try_from(buf.as_slice())?;

    let ctx = Context {
        state_key: token.claims.jti,
        state,
    };

    let holder_did = verify(&ctx, provider.clone(), request).await?;
    process(&ctx, provider, request, holder_did).await
}

#[derive(Debug)]
struct Context {
    state_key: String,
    state: State,
}

// Verify the proof of possession, returning the proven holder DID.
async fn verify(
    ctx: &Context, provider: impl Provider, request: &CredentialRequest,
) -> Result<String> {
    tracing::debug!("credential::verify");

    let Some(proof) = &request.proof else {
        return Err(invalid_proof(&provider, ctx, "proof is not set").await?);
    };
    if proof.proof_type != "jwt" {
        return Err(invalid_proof(&provider, ctx, "proof_type must be jwt").await?);
    }

    // decode the proof, verifying its signature against the key the
    // header's kid resolves to
    let resolver_provider = provider.clone();
    let jwt: Jwt<ProofClaims> = match jws::decode(&proof.jwt, |kid| {
        let p = resolver_provider;
        async move { Verifier::deref_jwk(&p, &kid).await }
    })
    .await
    {
        Ok(jwt) => jwt,
        Err(e) => {
            return Err(invalid_proof(&provider, ctx, &format!("proof jwt is invalid: {e}"))
                .await?);
        }
    };

    if jwt.claims.iss.as_deref().unwrap_or_default().trim().is_empty() {
        return Err(invalid_proof(&provider, ctx, "proof iss is not set").await?);
    }
    let Some(sub) = &jwt.claims.sub else {
        return Err(Error::InvalidSubject("proof names no subject".into()));
    };
    if sub.trim().is_empty() {
        return Err(Error::InvalidSubject("proof subject is blank".into()));
    }

    // the signing key must belong to the claimed subject, otherwise anyone
    // could claim any subject with their own key
    let signing_did = jwt.header.kid.split('#').next().unwrap_or_default();
    if signing_did != sub {
        return Err(invalid_proof(&provider, ctx, "proof subject does not match signing key")
            .await?);
    }

    // the proof must be bound to the c_nonce issued with the access token
    let now = Clock::now(&provider);
    if now > ctx.state.c_nonce_expires_at {
        return Err(invalid_proof(&provider, ctx, "c_nonce has expired").await?);
    }
    if jwt.claims.nonce.as_deref() != Some(ctx.state.c_nonce.as_str()) {
        return Err(invalid_proof(&provider, ctx, "proof nonce does not match c_nonce").await?);
    }

    Ok(sub.clone())
}

// Issue the credential and rotate the c_nonce.
async fn process(
    ctx: &Context, provider: impl Provider, request: &CredentialRequest, holder_did: String,
) -> Result<CredentialResponse> {
    tracing::debug!("credential::process");

    let issued = issue::issue(
        provider.clone(),
        &IssueRequest {
            holder_did,
            claims: request.claims.clone(),
            liveness_proof: None,
        },
    )
    .await?;

    let c_nonce = rotate_nonce(&provider, ctx).await?;

    Ok(CredentialResponse {
        credential: issued.credential_jwt,
        commitment: issued.commitment_jwt,
        c_nonce,
        c_nonce_expires_in: Expire::Nonce.duration().num_seconds(),
    })
}

// Save a fresh c_nonce into token state, returning it.
async fn rotate_nonce(provider: &impl Provider, ctx: &Context) -> Result<String> {
    let c_nonce = gen::nonce();
    let mut state = ctx.state.clone();
    state.c_nonce.clone_from(&c_nonce);
    state.c_nonce_expires_at = Clock::now(provider) + Expire::Nonce.duration();

    StateStore::put(provider, &ctx.state_key, state.to_vec()?, state.expires_at)
        .await
        .map_err(|e| Error::ServerError(format!("issue saving state: {e}")))?;

    Ok(c_nonce)
}

// Build an InvalidProof error carrying a fresh c_nonce for the wallet's
// next attempt.
async fn invalid_proof(provider: &impl Provider, ctx: &Context, hint: &str) -> Result<Error> {
    let c_nonce = rotate_nonce(provider, ctx).await?;
    Ok(Error::InvalidProof {
        hint: hint.into(),
        c_nonce,
        c_nonce_expires_in: Expire::Nonce.duration().num_seconds(),
    })
}
