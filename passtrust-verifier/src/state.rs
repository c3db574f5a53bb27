//! State is used by the library to persist presentation session information
//! between the authorization request and the wallet's response.

use chrono::{DateTime, TimeDelta, Utc};
use passtrust_openid::{Error, Result};
use serde::{Deserialize, Serialize};

pub enum Expire {
    Session,
}

impl Expire {
    pub fn duration(&self) -> TimeDelta {
        match self {
            Self::Session => TimeDelta::try_minutes(10).unwrap_or_default(),
        }
    }
}

/// Presentation session state, keyed by session id.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct State {
    /// Time state should expire.
    pub expires_at: DateTime<Utc>,

    /// The nonce the wallet must embed in its presentation.
    pub nonce: String,
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
