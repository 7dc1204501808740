use std::path::PathBuf;

use crate::{info, success, withings};

use super::{fail, load_settings};

pub async fn refresh(env_path: PathBuf) {
    let (settings, mut env_file) = load_settings(env_path).await;

    match withings::auth::refresh(&settings, &mut env_file).await {
        Ok(token) => {
            success!("Tokens refreshed and saved to {}", env_file.path().display());
            match token.expires_at() {
                Some(at) => info!("Access token expires at {}", at.format("%Y-%m-%d %H:%M UTC")),
                None => info!("Access token expires in {} hours", token.expires_in / 3600),
            }
        }
        Err(e) => fail(e),
    }
}
