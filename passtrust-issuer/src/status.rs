//! # Credential Status
//!
//! The revocation state machine for issued credentials. Legal transitions:
//!
//! ```text
//! VALID|SUSPENDED --suspend--> SUSPENDED --reinstate--> VALID
//!       *         --revoke---> REVOKED (terminal)
//! ```
//!
//! A credential with no recorded status reads as VALID. Status reads are
//! served through a TTL cache; every write evicts the credential's cache
//! entry so state changes are visible immediately.

use chrono::TimeDelta;
use passtrust_core::cache::TtlCache;
use passtrust_openid::issuer::{
    CredentialStatus, ReinstateRequest, RevokeRequest, StatusRecord, StatusRequest,
    StatusResponse, SuspendRequest,
};
use passtrust_openid::provider;
use passtrust_openid::{Error, Result};
use tracing::instrument;

use crate::provider::{Clock, Provider, StatusStore};

/// Revoke a credential. Terminal: a revoked credential can never return to
/// VALID or SUSPENDED.
///
/// # Errors
///
/// Returns `AlreadyRevoked` if the credential is already revoked.
#[instrument(level = "debug", skip(provider))]
pub async fn revoke(provider: impl Provider, request: &RevokeRequest) -> Result<StatusResponse> {
    let current = current(&provider, &request.credential_id).await?;
    if current.status == CredentialStatus::Revoked {
        return Err(Error::AlreadyRevoked(format!(
            "credential {} is already revoked",
            request.credential_id
        )));
    }

    let record = StatusRecord {
        credential_id: request.credential_id.clone(),
        status: CredentialStatus::Revoked,
        revoked_at: Some(Clock::now(&provider)),
        reason: Some(request.reason),
        revoked_by: Some(request.revoked_by.clone()),
        description: request.description.clone(),
    };
    put(&provider, &record).await?;

    Ok(response(record))
}

/// Suspend a credential. Suspending an already suspended credential
/// succeeds, re-applying the suspension with the new actor and reason.
///
/// # Errors
///
/// Returns `InvalidStateTransition` if the credential is REVOKED.
#[instrument(level = "debug", skip(provider))]
pub async fn suspend(provider: impl Provider, request: &SuspendRequest) -> Result<StatusResponse> {
    let current = current(&provider, &request.credential_id).await?;
    if current.status == CredentialStatus::Revoked {
        return Err(Error::InvalidStateTransition(
            "cannot suspend a revoked credential".into(),
        ));
    }

    let record = StatusRecord {
        credential_id: request.credential_id.clone(),
        status: CredentialStatus::Suspended,
        revoked_at: Some(Clock::now(&provider)),
        reason: Some(request.reason),
        revoked_by: Some(request.revoked_by.clone()),
        description: None,
    };
    put(&provider, &record).await?;

    Ok(response(record))
}

/// Reinstate a suspended credential.
///
/// # Errors
///
/// Returns `InvalidStateTransition` if the credential is not SUSPENDED.
#[instrument(level = "debug", skip(provider))]
pub async fn reinstate(
    provider: impl Provider, request: &ReinstateRequest,
) -> Result<StatusResponse> {
    let current = current(&provider, &request.credential_id).await?;
    match current.status {
        CredentialStatus::Revoked => {
            return Err(Error::InvalidStateTransition(
                "cannot reinstate a revoked credential".into(),
            ));
        }
        CredentialStatus::Valid => {
            return Err(Error::InvalidStateTransition("credential is not suspended".into()));
        }
        CredentialStatus::Suspended => {}
    }

    let record = StatusRecord {
        credential_id: request.credential_id.clone(),
        status: CredentialStatus::Valid,
        ..StatusRecord::default()
    };
    put(&provider, &record).await?;

    Ok(response(record))
}

/// Current status of a credential. Absence of a record reads as VALID.
///
/// # Errors
///
/// Returns an error if the provider is not available.
#[instrument(level = "debug", skip(provider))]
pub async fn status(provider: impl Provider, request: &StatusRequest) -> Result<StatusResponse> {
    let record = current(&provider, &request.credential_id).await?;
    Ok(response(record))
}

/// Whether the credential may be relied upon right now.
///
/// # Errors
///
/// Returns an error if the provider is not available.
pub async fn is_valid(provider: impl Provider, credential_id: &str) -> Result<bool> {
    let record = current(&provider, credential_id).await?;
    Ok(record.status == CredentialStatus::Valid)
}

async fn current(provider: &impl Provider, credential_id: &str) -> Result<StatusRecord> {
    let record = StatusStore::status(provider, credential_id)
        .await
        .map_err(|e| Error::ServerError(format!("issue reading status: {e}")))?;

    Ok(record.unwrap_or_else(|| StatusRecord {
        credential_id: credential_id.into(),
        status: CredentialStatus::Valid,
        ..StatusRecord::default()
    }))
}

async fn put(provider: &impl Provider, record: &StatusRecord) -> Result<()> {
    StatusStore::put_status(provider, record)
        .await
        .map_err(|e| Error::ServerError(format!("issue writing status: {e}")))
}

fn response(record: StatusRecord) -> StatusResponse {
    StatusResponse {
        credential_id: record.credential_id,
        is_valid: record.status == CredentialStatus::Valid,
        status: record.status,
        revoked_at: record.revoked_at,
        revocation_reason: record.reason,
        revoked_by: record.revoked_by,
        reason_description: record.description,
    }
}

/// A [`StatusStore`] adapter caching reads for a short TTL. Writes pass
/// through and evict the credential's cache entry.
#[derive(Clone, Debug)]
pub struct CachedStatusStore<S: StatusStore, C: Clock> {
    inner: S,
    clock: C,
    cache: TtlCache<Option<StatusRecord>>,
}

impl<S: StatusStore, C: Clock> CachedStatusStore<S, C> {
    /// Wrap a status store with a read cache of the given TTL.
    pub fn new(inner: S, clock: C, ttl: TimeDelta) -> Self {
        Self {
            inner,
            clock,
            cache: TtlCache::new(ttl),
        }
    }
}

impl<S: StatusStore, C: Clock> StatusStore for CachedStatusStore<S, C> {
    async fn status(&self, credential_id: &str) -> provider::Result<Option<StatusRecord>> {
        let now = self.clock.now();
        if let Some(cached) = self.cache.get(credential_id, now) {
            return Ok(cached);
        }

        let record = self.inner.status(credential_id).await?;
        self.cache.put(credential_id, record.clone(), now);
        Ok(record)
    }

    async fn put_status(&self, record: &StatusRecord) -> provider::Result<()> {
        self.cache.evict(&record.credential_id);
        self.inner.put_status(record).await
    }
}
