//! # Challenge Endpoint
//!
//! Mints single-use, time-bounded challenges for verification requests. A
//! challenge can be consumed exactly once; concurrent consumption attempts
//! resolve with one winner. Expired challenges are evicted on access and by
//! the periodic [`purge_expired`] sweep.

use chrono::TimeDelta;
use passtrust_openid::verifier::{ChallengeRequest, ChallengeResponse};
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::provider::{ChallengeStore, Clock, Metadata, Provider};

/// Challenge request handler.
///
/// # Errors
///
/// Returns an error if the provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn challenge(
    provider: impl Provider, request: &ChallengeRequest,
) -> Result<ChallengeResponse> {
    tracing::debug!("challenge::process");

    let config = Metadata::verifier(&provider)
        .await
        .map_err(|e| Error::ServerError(format!("issue getting verifier metadata: {e}")))?;
    let now = Clock::now(&provider);

    let ttl = TimeDelta::try_seconds(config.challenge_ttl).unwrap_or_default();
    let minted = ChallengeStore::mint(&provider, now + ttl)
        .await
        .map_err(|e| Error::ServerError(format!("issue minting challenge: {e}")))?;

    Ok(ChallengeResponse {
        challenge: minted.id,
        ttl_seconds: config.challenge_ttl,
    })
}

/// Evict expired challenges. Intended to be driven by a periodic sweep task;
/// requests never depend on it as expired entries are also evicted on
/// consumption.
///
/// # Errors
///
/// Returns an error if the provider is not available.
pub async fn purge_expired(provider: impl Provider) -> Result<usize> {
    let now = Clock::now(&provider);
    ChallengeStore::purge_expired(&provider, now)
        .await
        .map_err(|e| Error::ServerError(format!("issue purging challenges: {e}")))
}
