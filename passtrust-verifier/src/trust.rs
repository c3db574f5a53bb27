//! # Trust Gate
//!
//! Answers whether a credential issuer is trusted. Deployments wrap their
//! registry in a [`CachedRegistry`] so answers are served from cache for an
//! hour. The gate fails closed by default: if the registry cannot be
//! reached, verification is denied rather than waved through.
//!
//! [`CachedRegistry`]: crate::provider::CachedRegistry

use passtrust_openid::{Error, Result};

use crate::provider::{FailurePolicy, Provider, TrustRegistry};

// Deny unless the issuer is affirmatively trusted. Registry failures are
// resolved by the configured policy.
pub(crate) async fn gate(
    provider: &impl Provider, policy: FailurePolicy, issuer_did: &str,
) -> Result<()> {
    match TrustRegistry::is_trusted(provider, issuer_did).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            Err(Error::UntrustedIssuer(format!("issuer {issuer_did} is not trusted")))
        }
        Err(e) => match policy {
            FailurePolicy::FailOpen => {
                tracing::warn!("trust registry unavailable, failing open: {e}");
                Ok(())
            }
            FailurePolicy::FailClosed => {
                Err(Error::UpstreamUnavailable(format!("trust registry unavailable: {e}")))
            }
        },
    }
}
