//! Withings Collector Library
//!
//! This library bootstraps OAuth2 access to the Withings API: it builds the
//! authorization URL, captures the short-lived authorization code, exchanges it for
//! an access/refresh token pair and stores both in the local `.env` file.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the optional local callback listener
//! - `cli` - Command-line interface implementations
//! - `config` - Env file location and settings resolution
//! - `error` - Error type and remediation hints
//! - `management` - Env file store and token persistence
//! - `server` - Local HTTP server for OAuth callbacks
//! - `types` - Data structures and type definitions
//! - `utils` - Redirect URL parsing and small helpers
//! - `withings` - Withings OAuth2 client
//!
//! # Example
//!
//! ```
//! use withings_collector::{config, management::EnvFile};
//!
//! #[tokio::main]
//! async fn main() -> withings_collector::Res<()> {
//!     let env_file = EnvFile::load(config::env_path(None)).await?;
//!     let settings = config::Settings::load(&env_file)?;
//!     println!("{}", settings.token_url());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod types;
pub mod utils;
pub mod withings;

pub use error::WithingsError;

/// Result alias used throughout the crate.
///
/// # Example
///
/// ```
/// use withings_collector::Res;
///
/// fn scope() -> Res<String> {
///     Ok("user.metrics".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, WithingsError>;

/// Prints an informational message with a blue bullet point.
///
/// Creates a formatted output line with a distinctive blue "o" indicator
/// followed by the provided message. Used for general information and
/// status updates throughout the application.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// info!("Starting authorization...");
/// info!("Token expires in {} hours", hours);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// Creates a formatted output line with a green "✓" indicator to signify
/// successful completion of operations. Used to provide positive feedback
/// when operations complete successfully.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// success!("Tokens saved to {}", path.display());
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Creates a formatted error output with a red "!" indicator and immediately
/// terminates the program with exit code 1. Used for unrecoverable errors
/// that require immediate program termination.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Behavior
///
/// This macro will cause the program to exit immediately after printing
/// the error message. It should only be used for fatal errors where
/// recovery is not possible.
///
/// # Example
///
/// ```
/// error!("Token exchange failed: {}", err);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Creates a formatted output line with a yellow "!" indicator to highlight
/// potential issues or important notices that don't require program termination.
/// Used for recoverable issues or important information that users should notice.
///
/// # Arguments
///
/// The macro accepts the same arguments as `println!`, supporting format
/// strings and interpolation.
///
/// # Example
///
/// ```
/// warning!("Failed to open browser, open the URL manually");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
