//! # Provider Traits
//!
//! Seams between the protocol engine and its environment: state persistence,
//! time, challenge storage, trust registry and status authority lookups, and
//! issuance logging. Most implementations live with the deployment; the
//! in-memory challenge store and the caching registry and status adapters
//! are provided here.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use passtrust_core::cache::TtlCache;
use serde::{Deserialize, Serialize};

use crate::issuer::{IssuanceRecord, StatusRecord};

/// Result type used for all provider-facing errors. Provider failures are
/// mapped to protocol errors by the calling handler, subject to the
/// configured [`FailurePolicy`].
pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

/// `StateStore` is used to store and manage server state.
pub trait StateStore: Send + Sync {
    /// Store state using the provided key. The expiry parameter indicates
    /// when state can be expunged from the store.
    fn put(
        &self, key: &str, data: Vec<u8>, expiry: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Retrieve state using the provided key.
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Remove state using the key provided.
    fn purge(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// `Clock` supplies the current instant. All expiry decisions read time
/// through this trait so tests can drive a deterministic clock.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// A single-use, time-bounded challenge.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Challenge {
    /// Unique challenge identifier, returned to the caller verbatim.
    pub id: String,

    /// The instant after which the challenge can no longer be consumed.
    pub expires_at: DateTime<Utc>,
}

/// Outcome of a challenge consumption attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Consumption {
    /// The caller won the challenge. No other caller can consume it again.
    Consumed,

    /// The challenge was never minted or has been evicted.
    Unknown,

    /// The challenge was already consumed by an earlier caller.
    AlreadyUsed,

    /// The challenge expired before consumption. The entry is evicted.
    Expired,
}

/// `ChallengeStore` mints and atomically consumes single-use challenges.
///
/// Implementations must guarantee that concurrent consumption attempts for
/// the same id resolve with exactly one winner.
pub trait ChallengeStore: Send + Sync {
    /// Mint a fresh challenge expiring at the provided instant.
    fn mint(&self, expires_at: DateTime<Utc>) -> impl Future<Output = Result<Challenge>> + Send;

    /// Attempt to consume the identified challenge at instant `now`.
    fn consume(&self, id: &str, now: DateTime<Utc>)
    -> impl Future<Output = Result<Consumption>> + Send;

    /// Evict every challenge expired as at instant `now`, returning the
    /// number evicted.
    fn purge_expired(&self, now: DateTime<Utc>) -> impl Future<Output = Result<usize>> + Send;
}

/// `TrustRegistry` answers whether an issuer DID is trusted. Lookup failures
/// are policy-gated by the caller (trust fails closed by default).
pub trait TrustRegistry: Send + Sync {
    /// Returns whether the identified issuer is trusted to issue credentials.
    fn is_trusted(&self, issuer_did: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// `StatusClient` queries the issuing authority for a credential's current
/// validity. Lookup failures are policy-gated by the caller (revocation
/// fails open by default).
pub trait StatusClient: Send + Sync {
    /// Returns whether the identified credential is currently valid, i.e.
    /// neither revoked nor suspended.
    fn is_valid(&self, credential_id: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// `IssuanceLog` records every credential issued, for audit and status
/// initialisation.
pub trait IssuanceLog: Send + Sync {
    /// Append a record of an issued credential.
    fn record(&self, record: &IssuanceRecord) -> impl Future<Output = Result<()>> + Send;
}

/// `StatusStore` persists per-credential revocation state for the issuer's
/// status endpoints.
pub trait StatusStore: Send + Sync {
    /// Retrieve the status record for a credential. `None` means no status
    /// has ever been recorded.
    fn status(&self, credential_id: &str)
    -> impl Future<Output = Result<Option<StatusRecord>>> + Send;

    /// Store (or replace) the status record for a credential.
    fn put_status(&self, record: &StatusRecord) -> impl Future<Output = Result<()>> + Send;
}

/// How a gate behaves when its backing dependency fails.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Treat a dependency failure as denial.
    #[default]
    FailClosed,

    /// Treat a dependency failure as permission.
    FailOpen,
}

/// How long a trust registry answer may be served from cache.
#[must_use]
pub fn trust_cache_ttl() -> TimeDelta {
    TimeDelta::try_hours(1).unwrap_or_default()
}

/// How long a status authority answer may be served from cache.
#[must_use]
pub fn status_cache_ttl() -> TimeDelta {
    TimeDelta::try_seconds(60).unwrap_or_default()
}

struct Entry {
    expires_at: DateTime<Utc>,
    used: AtomicBool,
}

/// In-memory [`ChallengeStore`]. Consumption flips a per-entry atomic flag,
/// so unrelated challenges never contend on a common write lock.
#[derive(Clone, Default)]
pub struct InMemoryChallengeStore {
    entries: Arc<RwLock<HashMap<String, Arc<Entry>>>>,
}

impl InMemoryChallengeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChallengeStore for InMemoryChallengeStore {
    async fn mint(&self, expires_at: DateTime<Utc>) -> Result<Challenge> {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = Arc::new(Entry {
            expires_at,
            used: AtomicBool::new(false),
        });

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(id.clone(), entry);

        Ok(Challenge { id, expires_at })
    }

    async fn consume(&self, id: &str, now: DateTime<Utc>) -> Result<Consumption> {
        // hold the map lock only long enough to fetch the entry
        let entry = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries.get(id).cloned()
        };
        let Some(entry) = entry else {
            return Ok(Consumption::Unknown);
        };

        if now > entry.expires_at {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.remove(id);
            return Ok(Consumption::Expired);
        }

        // exactly one caller can win the flip from unused to used
        if entry.used.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok() {
            Ok(Consumption::Consumed)
        } else {
            Ok(Consumption::AlreadyUsed)
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        Ok(before - entries.len())
    }
}

impl std::fmt::Debug for InMemoryChallengeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChallengeStore").finish_non_exhaustive()
    }
}

/// A [`TrustRegistry`] adapter caching answers for a TTL. Registry mutations
/// must call [`CachedRegistry::evict`] so the next read reflects the write.
#[derive(Clone, Debug)]
pub struct CachedRegistry<R: TrustRegistry, C: Clock> {
    inner: R,
    clock: C,
    cache: TtlCache<bool>,
}

impl<R: TrustRegistry, C: Clock> CachedRegistry<R, C> {
    /// Wrap a registry with an answer cache of the given TTL.
    pub fn new(inner: R, clock: C, ttl: TimeDelta) -> Self {
        Self {
            inner,
            clock,
            cache: TtlCache::new(ttl),
        }
    }

    /// Drop the cached answer for an issuer.
    pub fn evict(&self, issuer_did: &str) {
        self.cache.evict(issuer_did);
    }
}

impl<R: TrustRegistry, C: Clock> TrustRegistry for CachedRegistry<R, C> {
    async fn is_trusted(&self, issuer_did: &str) -> Result<bool> {
        let now = self.clock.now();
        if let Some(cached) = self.cache.get(issuer_did, now) {
            return Ok(cached);
        }

        let trusted = self.inner.is_trusted(issuer_did).await?;
        self.cache.put(issuer_did, trusted, now);
        Ok(trusted)
    }
}

/// A [`StatusClient`] adapter caching answers for a short TTL.
#[derive(Clone, Debug)]
pub struct CachedStatusClient<S: StatusClient, C: Clock> {
    inner: S,
    clock: C,
    cache: TtlCache<bool>,
}

impl<S: StatusClient, C: Clock> CachedStatusClient<S, C> {
    /// Wrap a status client with an answer cache of the given TTL.
    pub fn new(inner: S, clock: C, ttl: TimeDelta) -> Self {
        Self {
            inner,
            clock,
            cache: TtlCache::new(ttl),
        }
    }
}

impl<S: StatusClient, C: Clock> StatusClient for CachedStatusClient<S, C> {
    async fn is_valid(&self, credential_id: &str) -> Result<bool> {
        let now = self.clock.now();
        if let Some(cached) = self.cache.get(credential_id, now) {
            return Ok(cached);
        }

        let valid = self.inner.is_valid(credential_id).await?;
        self.cache.put(credential_id, valid, now);
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[derive(Clone)]
    struct TestClock {
        start: DateTime<Utc>,
        offset: Arc<Mutex<TimeDelta>>,
    }

    impl TestClock {
        fn frozen() -> Self {
            Self {
                start: Utc::now(),
                offset: Arc::new(Mutex::new(TimeDelta::zero())),
            }
        }

        fn advance(&self, delta: TimeDelta) {
            let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
            *offset += delta;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            let offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
            self.start + *offset
        }
    }

    #[derive(Clone, Default)]
    struct StubRegistry {
        trusted: Arc<Mutex<HashSet<String>>>,
    }

    impl StubRegistry {
        fn trust(&self, did: &str) {
            self.trusted.lock().unwrap_or_else(PoisonError::into_inner).insert(did.into());
        }

        fn distrust(&self, did: &str) {
            self.trusted.lock().unwrap_or_else(PoisonError::into_inner).remove(did);
        }
    }

    impl TrustRegistry for StubRegistry {
        async fn is_trusted(&self, issuer_did: &str) -> Result<bool> {
            Ok(self.trusted.lock().unwrap_or_else(PoisonError::into_inner).contains(issuer_did))
        }
    }

    #[derive(Clone, Default)]
    struct StubAuthority {
        revoked: Arc<Mutex<HashSet<String>>>,
    }

    impl StubAuthority {
        fn revoke(&self, id: &str) {
            self.revoked.lock().unwrap_or_else(PoisonError::into_inner).insert(id.into());
        }
    }

    impl StatusClient for StubAuthority {
        async fn is_valid(&self, credential_id: &str) -> Result<bool> {
            Ok(!self.revoked.lock().unwrap_or_else(PoisonError::into_inner).contains(credential_id))
        }
    }

    #[tokio::test]
    async fn mint_and_consume_once() {
        let store = InMemoryChallengeStore::new();
        let now = Utc::now();
        let minted = store.mint(now + TimeDelta::try_seconds(300).unwrap_or_default())
            .await
            .expect("mint is ok");

        assert_eq!(store.consume(&minted.id, now).await.expect("consume answers"),
            Consumption::Consumed);
        assert_eq!(store.consume(&minted.id, now).await.expect("consume answers"),
            Consumption::AlreadyUsed);
    }

    #[tokio::test]
    async fn unknown_challenge() {
        let store = InMemoryChallengeStore::new();
        assert_eq!(store.consume("never-minted", Utc::now()).await.expect("consume answers"),
            Consumption::Unknown);
    }

    #[tokio::test]
    async fn expired_challenge_is_evicted() {
        let store = InMemoryChallengeStore::new();
        let now = Utc::now();
        let minted = store.mint(now + TimeDelta::try_seconds(300).unwrap_or_default())
            .await
            .expect("mint is ok");

        let later = now + TimeDelta::try_seconds(301).unwrap_or_default();
        assert_eq!(store.consume(&minted.id, later).await.expect("consume answers"),
            Consumption::Expired);

        // the entry is gone, not merely marked
        assert_eq!(store.consume(&minted.id, now).await.expect("consume answers"),
            Consumption::Unknown);
    }

    #[tokio::test]
    async fn concurrent_consumers_one_winner() {
        let store = InMemoryChallengeStore::new();
        let now = Utc::now();
        let minted = store.mint(now + TimeDelta::try_seconds(300).unwrap_or_default())
            .await
            .expect("mint is ok");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let id = minted.id.clone();
            handles.push(tokio::spawn(async move { store.consume(&id, now).await }));
        }

        let mut consumed = 0;
        for handle in handles {
            let outcome = handle.await.expect("task joins").expect("consume answers");
            if outcome == Consumption::Consumed {
                consumed += 1;
            } else {
                assert_eq!(outcome, Consumption::AlreadyUsed);
            }
        }
        assert_eq!(consumed, 1);
    }

    #[tokio::test]
    async fn purge_evicts_only_expired() {
        let store = InMemoryChallengeStore::new();
        let now = Utc::now();
        let stale = store.mint(now - TimeDelta::try_seconds(1).unwrap_or_default())
            .await
            .expect("mint is ok");
        let fresh = store.mint(now + TimeDelta::try_seconds(300).unwrap_or_default())
            .await
            .expect("mint is ok");

        assert_eq!(ChallengeStore::purge_expired(&store, now).await.expect("purge is ok"), 1);
        assert_eq!(store.consume(&stale.id, now).await.expect("consume answers"),
            Consumption::Unknown);
        assert_eq!(store.consume(&fresh.id, now).await.expect("consume answers"),
            Consumption::Consumed);
    }

    #[tokio::test]
    async fn registry_caches_answers_until_ttl() {
        let registry = StubRegistry::default();
        registry.trust("did:web:issuer.io");

        let clock = TestClock::frozen();
        let cached = CachedRegistry::new(registry.clone(), clock.clone(), trust_cache_ttl());

        assert!(cached.is_trusted("did:web:issuer.io").await.expect("registry answers"));

        // a mutation bypassing eviction is not seen until the TTL lapses
        registry.distrust("did:web:issuer.io");
        assert!(cached.is_trusted("did:web:issuer.io").await.expect("registry answers"));

        clock.advance(trust_cache_ttl() + TimeDelta::try_seconds(1).unwrap_or_default());
        assert!(!cached.is_trusted("did:web:issuer.io").await.expect("registry answers"));
    }

    #[tokio::test]
    async fn registry_eviction_reflects_writes_immediately() {
        let registry = StubRegistry::default();
        registry.trust("did:web:issuer.io");

        let clock = TestClock::frozen();
        let cached = CachedRegistry::new(registry.clone(), clock, trust_cache_ttl());

        assert!(cached.is_trusted("did:web:issuer.io").await.expect("registry answers"));

        registry.distrust("did:web:issuer.io");
        cached.evict("did:web:issuer.io");
        assert!(!cached.is_trusted("did:web:issuer.io").await.expect("registry answers"));
    }

    #[tokio::test]
    async fn status_serves_stale_answers_within_ttl() {
        let authority = StubAuthority::default();
        let clock = TestClock::frozen();
        let cached = CachedStatusClient::new(authority.clone(), clock.clone(), status_cache_ttl());

        // unknown credentials are valid
        assert!(cached.is_valid("cred-1").await.expect("authority answers"));

        // a revocation is not seen until the TTL lapses
        authority.revoke("cred-1");
        assert!(cached.is_valid("cred-1").await.expect("authority answers"));

        clock.advance(status_cache_ttl() + TimeDelta::try_seconds(1).unwrap_or_default());
        assert!(!cached.is_valid("cred-1").await.expect("authority answers"));
    }
}
