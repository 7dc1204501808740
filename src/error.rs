use std::path::PathBuf;

/// Withings status code for "too many requests".
pub const STATUS_RATE_LIMITED: i64 = 601;

/// Everything that can stop an authorization or refresh run.
#[derive(Debug, thiserror::Error)]
pub enum WithingsError {
    // ── Configuration ───────────────────────────────────────────────────
    #[error("Missing configuration in {}: {}", path.display(), keys.join(", "))]
    MissingConfig { path: PathBuf, keys: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot parse {}: {source}", path.display())]
    EnvParse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Cannot read {}: {source}", path.display())]
    EnvRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Redirect handling ───────────────────────────────────────────────
    #[error("Malformed redirect URL: {0}")]
    MalformedRedirect(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Redirect URL has no authorization code")]
    MissingCode,

    #[error("State parameter does not match this authorization request")]
    StateMismatch,

    #[error("No callback received within {0} seconds")]
    CallbackTimeout(u64),

    #[error("Cannot start callback listener on {addr}: {source}")]
    Listener {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Upstream ────────────────────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Token endpoint answered HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Withings rejected the request (status {status}): {message}")]
    Rejected { status: i64, message: String },

    #[error("Withings rate limit reached: {0}")]
    RateLimited(String),

    #[error("Unexpected token response: {0}")]
    MalformedResponse(String),

    // ── Persistence ─────────────────────────────────────────────────────
    #[error("Cannot write {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WithingsError {
    /// Remediation advice shown below the error message.
    pub fn hint(&self) -> Option<String> {
        match self {
            WithingsError::MissingConfig { path, .. } => Some(format!(
                "Add the missing keys to {} (see .env.example) or export them.",
                path.display()
            )),
            WithingsError::MalformedRedirect(_) | WithingsError::MissingCode => Some(
                "Copy the complete address from the browser after approving access, \
                 including the ?code=... part."
                    .to_string(),
            ),
            WithingsError::StateMismatch => Some(
                "The pasted URL belongs to a different authorization request. Run auth again."
                    .to_string(),
            ),
            WithingsError::CallbackTimeout(_) => Some(
                "Approve access in the browser before the timeout, or run auth without --listen \
                 and paste the redirect URL."
                    .to_string(),
            ),
            WithingsError::Listener { .. } => Some(
                "WITHINGS_REDIRECT_URI must point at a free local host and port for --listen."
                    .to_string(),
            ),
            WithingsError::Rejected { status, .. } => Some(rejection_hint(*status).to_string()),
            WithingsError::RateLimited(_) => Some(
                "Withings limits token requests. Wait a minute before trying again.".to_string(),
            ),
            WithingsError::Persist { path, .. } => {
                Some(format!("Check that {} is writable.", path.display()))
            }
            _ => None,
        }
    }
}

fn rejection_hint(status: i64) -> &'static str {
    match status {
        100..=102 | 200 | 401 => "Check WITHINGS_CLIENT_ID and WITHINGS_CLIENT_SECRET.",
        _ => {
            "Authorization codes expire after about 30 seconds and work only once. \
             Run auth again, paste the redirect URL promptly and make sure \
             WITHINGS_REDIRECT_URI matches the registered callback exactly."
        }
    }
}
