use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user_id: Option<String>,
    pub obtained_at: i64,
}

impl TokenPair {
    /// `None` when `expires_in` is too large to be a point in time.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let expires_in = i64::try_from(self.expires_in).ok()?;
        DateTime::from_timestamp(self.obtained_at.checked_add(expires_in)?, 0)
    }
}

/// Payload of a successful token response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBody {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub userid: Option<serde_json::Value>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Withings wraps every answer in `{status, body, error}`; a bare token object is
/// accepted as well.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TokenEnvelope {
    Wrapped {
        status: i64,
        #[serde(default)]
        body: Option<serde_json::Value>,
        #[serde(default)]
        error: Option<String>,
    },
    Bare(TokenBody),
}

#[derive(Debug, Clone, Default)]
pub struct AuthOptions {
    pub scope: Option<String>,
    pub open_browser: bool,
    pub listen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackResult {
    pub code: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(CallbackResult),
    Denied(String),
}

/// Shared between the auth flow and the callback handler.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub state: String,
    pub outcome: Option<CallbackOutcome>,
}

impl PendingAuthorization {
    pub fn new(state: String) -> Self {
        PendingAuthorization {
            state,
            outcome: None,
        }
    }
}

pub type SharedAuthorization = Arc<Mutex<PendingAuthorization>>;

#[derive(Tabled)]
pub struct ConfigTableRow {
    pub key: String,
    pub source: String,
    pub value: String,
}
