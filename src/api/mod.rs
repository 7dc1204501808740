//! # API Module
//!
//! HTTP handlers for the optional local callback listener started by
//! `withings-collector auth --listen`.
//!
//! ## Endpoints
//!
//! - [`callback`] - Mounted on the path of `WITHINGS_REDIRECT_URI`. Records the
//!   `code`/`state` (or the `error`) sent by Withings after consent into the
//!   shared [`crate::types::PendingAuthorization`]. It never talks to Withings
//!   itself; the auth flow performs the single token exchange.
//! - [`health`] - Returns status and version, handy to check that the listener
//!   is reachable at the registered address.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use withings_collector::server::router;
//!
//! let app = router("/callback", shared_state);
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
