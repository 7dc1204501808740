use std::path::PathBuf;

use tokio::io::BufReader;

use crate::{info, success, types::AuthOptions, withings};

use super::{fail, load_settings};

pub async fn auth(env_path: PathBuf, options: AuthOptions) {
    let (settings, mut env_file) = load_settings(env_path).await;

    let stdin = BufReader::new(tokio::io::stdin());
    match withings::auth::auth(&settings, &mut env_file, &options, stdin).await {
        Ok(token) => {
            success!("Tokens saved to {}", env_file.path().display());
            info!("Access token expires in {} hours", token.expires_in / 3600);
            if let Some(user_id) = &token.user_id {
                info!("User ID: {}", user_id);
            }
        }
        Err(e) => fail(e),
    }
}
