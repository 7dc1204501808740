//! # Withings Integration Module
//!
//! OAuth2 client for the Withings account and token endpoints.
//!
//! ```text
//! CLI Layer (auth, refresh)
//!          ↓
//! Withings OAuth2 (authorize URL, code exchange, refresh)
//!          ↓
//! reqwest → https://wbsapi.withings.net/v2/oauth2
//! ```
//!
//! ## Flow
//!
//! 1. [`auth::authorization_url`] builds the consent URL on
//!    `account.withings.com` with a random `state`
//! 2. The user approves access and is redirected to `WITHINGS_REDIRECT_URI`
//!    with `?code=...&state=...`
//! 3. The code arrives either as a pasted URL ([`auth::prompt_redirect_url`])
//!    or through the local listener in [`crate::server`]
//! 4. [`auth::exchange_code`] posts `action=requesttoken` with
//!    `grant_type=authorization_code`
//! 5. Tokens are written to the env file through
//!    [`crate::management::TokenManager`]
//!
//! ## Error Handling
//!
//! Withings answers most failures with HTTP 200 and a non-zero `status`;
//! status 601 means rate limited. No request is ever retried: codes are
//! single-use, so a second attempt with the same code cannot succeed.

pub mod auth;
