//! # CLI Module
//!
//! User-facing commands of `withings-collector`. Each command loads the env
//! file, resolves settings, delegates to [`crate::withings`] and reports the
//! outcome with the crate's output macros.
//!
//! ## Commands
//!
//! - [`auth`] - Authorization code flow; stores access and refresh tokens
//! - [`refresh`] - Trades the stored refresh token for a new pair
//! - [`info`] - Shows the env file location and which keys are configured
//!
//! ## Error Handling
//!
//! Every failure ends the process with a non-zero exit code after printing
//! the error and, where one exists, a hint on how to fix it. Nothing is
//! retried automatically.
//!
//! ## Usage Patterns
//!
//! ```bash
//! withings-collector auth                 # paste the redirect URL
//! withings-collector auth --listen        # let a local listener catch it
//! withings-collector refresh
//! withings-collector --env-file ./.env info
//! ```

mod auth;
mod info;
mod refresh;

use std::path::PathBuf;

pub use auth::auth;
pub use info::info;
pub use refresh::refresh;

use crate::{WithingsError, config::Settings, error, management::EnvFile};

/// Prints the error with its remediation hint and exits with status 1.
pub fn fail(err: WithingsError) -> ! {
    match err.hint() {
        Some(hint) => error!("{}\n    {}", err, hint),
        None => error!("{}", err),
    }
}

async fn load_settings(env_path: PathBuf) -> (Settings, EnvFile) {
    let env_file = match EnvFile::load(env_path).await {
        Ok(env_file) => env_file,
        Err(e) => fail(e),
    };
    match Settings::load(&env_file) {
        Ok(settings) => (settings, env_file),
        Err(e) => fail(e),
    }
}
