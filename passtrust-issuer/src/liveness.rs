//! # Liveness Gate
//!
//! Optional issuance gate over liveness capture evidence. When a request
//! carries a [`LivenessProof`] the claims are only attested if the capture
//! scored high enough, recently enough.

use chrono::{DateTime, TimeDelta, Utc};
use passtrust_openid::issuer::LivenessProof;
use passtrust_openid::{Error, Result};

/// Minimum acceptable liveness score.
pub const MIN_SCORE: f64 = 0.7;

/// Minimum acceptable capture confidence.
pub const MIN_CONFIDENCE: f64 = 0.6;

/// Maximum age of a capture before it goes stale.
pub fn max_age() -> TimeDelta {
    TimeDelta::try_minutes(5).unwrap_or_default()
}

/// Check liveness evidence against the gate's thresholds.
///
/// # Errors
///
/// Returns `AccessDenied` naming the failing threshold.
pub fn validate(proof: &LivenessProof, now: DateTime<Utc>) -> Result<()> {
    if !proof.is_live {
        return Err(Error::AccessDenied("liveness capture determined subject not live".into()));
    }
    if proof.score < MIN_SCORE {
        return Err(Error::AccessDenied(format!(
            "liveness score {} below minimum {MIN_SCORE}",
            proof.score
        )));
    }
    if proof.confidence < MIN_CONFIDENCE {
        return Err(Error::AccessDenied(format!(
            "liveness confidence {} below minimum {MIN_CONFIDENCE}",
            proof.confidence
        )));
    }
    if now - proof.captured_at > max_age() {
        return Err(Error::AccessDenied("liveness capture is stale".into()));
    }

    Ok(())
}
