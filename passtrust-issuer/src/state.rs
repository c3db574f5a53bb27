//! State is used by the library to persist request information between steps
//! in the issuance process.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use passtrust_openid::{Error, Result};

pub enum Expire {
    Access,
    Nonce,
}

impl Expire {
    pub fn duration(&self) -> TimeDelta {
        match self {
            Self::Access => TimeDelta::try_hours(1).unwrap_or_default(),
            Self::Nonce => TimeDelta::try_minutes(5).unwrap_or_default(),
        }
    }
}

/// State is used to persist request information between issuance steps.
/// Keyed by the access token's `jti`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct State {
    /// Time state should expire.
    pub expires_at: DateTime<Utc>,

    /// The pre-authorized code the access token was exchanged for.
    pub pre_authorized_code: String,

    /// The nonce to be used by the wallet when creating a proof of
    /// possession of its key material.
    pub c_nonce: String,

    /// Expiry time of the `c_nonce`.
    pub c_nonce_expires_at: DateTime<Utc>,
}

impl State {
    /// Serialize the state for storage.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        match serde_json::to_vec(self) {
            Ok(buf) => Ok(buf),
            Err(e) => Err(Error::ServerError(format!("issue serializing state: {e}"))),
        }
    }

    /// Deserialize state from storage.
    pub fn from_slice(value: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Self>(value) {
            Ok(state) => Ok(state),
            Err(e) => Err(Error::ServerError(format!("issue deserializing state: {e}"))),
        }
    }
}

impl TryFrom<&[u8]> for State {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        Self::from_slice(value)
    }
}

impl TryFrom<Vec<u8>> for State {
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        Self::from_slice(&value)
    }
}
