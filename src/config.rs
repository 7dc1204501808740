//! Configuration management for the Withings collector.
//!
//! Settings are read from a `.env` style file and from the process environment:
//! 1. Environment variables (highest priority, ignored when empty)
//! 2. The `.env` file (see [`env_path`])
//! 3. Application defaults for endpoints, scope and timeouts
//!
//! Credentials have no default. [`Settings::from_sources`] reports every missing
//! credential key at once, before any network traffic happens.

use std::{env, path::PathBuf, time::Duration};

use crate::{Res, WithingsError, management::EnvFile, types::Credentials};

pub const CLIENT_ID_KEY: &str = "WITHINGS_CLIENT_ID";
pub const CLIENT_SECRET_KEY: &str = "WITHINGS_CLIENT_SECRET";
pub const REDIRECT_URI_KEY: &str = "WITHINGS_REDIRECT_URI";
pub const ACCESS_TOKEN_KEY: &str = "WITHINGS_ACCESS_TOKEN";
pub const REFRESH_TOKEN_KEY: &str = "WITHINGS_REFRESH_TOKEN";

pub const ACCOUNT_URL_KEY: &str = "WITHINGS_ACCOUNT_URL";
pub const API_URL_KEY: &str = "WITHINGS_API_URL";
pub const SCOPE_KEY: &str = "WITHINGS_SCOPE";
pub const HTTP_TIMEOUT_KEY: &str = "WITHINGS_HTTP_TIMEOUT";
pub const CALLBACK_TIMEOUT_KEY: &str = "WITHINGS_CALLBACK_TIMEOUT";

/// Overrides the default env file location.
pub const ENV_FILE_VAR: &str = "WITHINGS_ENV_FILE";

pub const DEFAULT_ACCOUNT_URL: &str = "https://account.withings.com";
pub const DEFAULT_API_URL: &str = "https://wbsapi.withings.net";
pub const DEFAULT_SCOPE: &str = "user.metrics,user.activity";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

const AUTHORIZE_ENDPOINT: &str = "/oauth2_user/authorize2";
const TOKEN_ENDPOINT: &str = "/v2/oauth2";

/// Keys shown by the `info` command, secrets flagged.
pub const RECOGNIZED_KEYS: [(&str, bool); 10] = [
    (CLIENT_ID_KEY, false),
    (CLIENT_SECRET_KEY, true),
    (REDIRECT_URI_KEY, false),
    (ACCESS_TOKEN_KEY, true),
    (REFRESH_TOKEN_KEY, true),
    (ACCOUNT_URL_KEY, false),
    (API_URL_KEY, false),
    (SCOPE_KEY, false),
    (HTTP_TIMEOUT_KEY, false),
    (CALLBACK_TIMEOUT_KEY, false),
];

/// Returns the path of the `.env` file to read and update.
///
/// An explicit path wins, then `WITHINGS_ENV_FILE`, then the platform-specific
/// local data directory:
/// - Linux: `~/.local/share/withings-collector/.env`
/// - macOS: `~/Library/Application Support/withings-collector/.env`
/// - Windows: `%LOCALAPPDATA%/withings-collector/.env`
pub fn env_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = env::var(ENV_FILE_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("withings-collector/.env");
    path
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Environment,
    EnvFile,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Environment => write!(f, "environment"),
            Source::EnvFile => write!(f, "env file"),
        }
    }
}

/// Looks a key up in the process environment first, then in the env file.
/// Empty values are treated as unset.
pub fn resolve<F>(env_file: &EnvFile, env_lookup: &F, key: &str) -> Option<(String, Source)>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env_lookup(key).filter(|v| !v.is_empty()) {
        return Some((value, Source::Environment));
    }
    env_file
        .get(key)
        .filter(|v| !v.is_empty())
        .map(|v| (v.to_string(), Source::EnvFile))
}

/// Process environment lookup used outside of tests.
pub fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub account_url: String,
    pub api_url: String,
    pub scope: String,
    pub http_timeout: Duration,
    pub callback_timeout: Duration,
}

impl Settings {
    /// Resolves settings from the env file and the process environment.
    pub fn load(env_file: &EnvFile) -> Res<Self> {
        Self::from_sources(env_file, &process_env)
    }

    /// Resolves settings with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// - [`WithingsError::MissingConfig`] listing every absent credential key
    /// - [`WithingsError::InvalidConfig`] for a non-numeric timeout
    pub fn from_sources<F>(env_file: &EnvFile, env_lookup: &F) -> Res<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| resolve(env_file, env_lookup, key).map(|(value, _)| value);

        let client_id = lookup(CLIENT_ID_KEY);
        let client_secret = lookup(CLIENT_SECRET_KEY);
        let redirect_uri = lookup(REDIRECT_URI_KEY);

        let (Some(client_id), Some(client_secret), Some(redirect_uri)) =
            (client_id.clone(), client_secret.clone(), redirect_uri.clone())
        else {
            let keys = [
                (CLIENT_ID_KEY, client_id.is_none()),
                (CLIENT_SECRET_KEY, client_secret.is_none()),
                (REDIRECT_URI_KEY, redirect_uri.is_none()),
            ]
            .into_iter()
            .filter(|(_, missing)| *missing)
            .map(|(key, _)| key.to_string())
            .collect();

            return Err(WithingsError::MissingConfig {
                path: env_file.path().to_path_buf(),
                keys,
            });
        };

        Ok(Settings {
            credentials: Credentials {
                client_id,
                client_secret,
                redirect_uri,
            },
            account_url: lookup(ACCOUNT_URL_KEY)
                .unwrap_or_else(|| DEFAULT_ACCOUNT_URL.to_string()),
            api_url: lookup(API_URL_KEY).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            scope: lookup(SCOPE_KEY).unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            http_timeout: parse_seconds(
                HTTP_TIMEOUT_KEY,
                lookup(HTTP_TIMEOUT_KEY),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            callback_timeout: parse_seconds(
                CALLBACK_TIMEOUT_KEY,
                lookup(CALLBACK_TIMEOUT_KEY),
                DEFAULT_CALLBACK_TIMEOUT_SECS,
            )?,
        })
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}{}",
            self.account_url.trim_end_matches('/'),
            AUTHORIZE_ENDPOINT
        )
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), TOKEN_ENDPOINT)
    }
}

fn parse_seconds(key: &str, value: Option<String>, default: u64) -> Res<Duration> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };

    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(WithingsError::InvalidConfig(format!(
            "{key} must be a positive whole number of seconds, got '{value}'"
        ))),
    }
}
