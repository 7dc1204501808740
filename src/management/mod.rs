mod auth;
mod env_file;

pub use auth::TokenManager;
pub use env_file::EnvFile;
