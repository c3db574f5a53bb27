//! # Revocation Gate
//!
//! Checks a presented credential's validity with its issuing authority.
//! Deployments wrap their status client in a [`CachedStatusClient`] so
//! answers are cached briefly. The gate fails open by default: a status
//! authority outage degrades to accepting possibly-revoked credentials
//! rather than refusing all verification.
//!
//! [`CachedStatusClient`]: crate::provider::CachedStatusClient

use passtrust_openid::{Error, Result};

use crate::provider::{FailurePolicy, Provider, StatusClient};

// Deny if the credential is known to be revoked or suspended. Authority
// failures are resolved by the configured policy.
pub(crate) async fn gate(
    provider: &impl Provider, policy: FailurePolicy, credential_id: &str,
) -> Result<()> {
    match StatusClient::is_valid(provider, credential_id).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::VerificationFailed(format!(
            "credential {credential_id} is revoked or suspended"
        ))),
        Err(e) => match policy {
            FailurePolicy::FailOpen => {
                tracing::warn!("status authority unavailable, failing open: {e}");
                Ok(())
            }
            FailurePolicy::FailClosed => {
                Err(Error::UpstreamUnavailable(format!("status authority unavailable: {e}")))
            }
        },
    }
}
