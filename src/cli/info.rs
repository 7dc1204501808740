use std::path::PathBuf;

use tabled::Table;

use crate::{
    config::{self, RECOGNIZED_KEYS, Settings},
    info,
    management::EnvFile,
    types::ConfigTableRow,
    utils, warning,
};

use super::fail;

pub async fn info(env_path: PathBuf) {
    let exists = async_fs::metadata(&env_path).await.is_ok();
    let env_file = match EnvFile::load(env_path).await {
        Ok(env_file) => env_file,
        Err(e) => fail(e),
    };

    if exists {
        info!("Env file: {}", env_file.path().display());
    } else {
        warning!("Env file: {} (not created yet)", env_file.path().display());
    }

    println!("{}", Table::new(config_rows(&env_file)));

    match Settings::load(&env_file) {
        Ok(settings) => {
            info!("Authorize endpoint: {}", settings.authorize_url());
            info!("Token endpoint: {}", settings.token_url());
        }
        Err(e) => warning!("{}", e),
    }
}

fn config_rows(env_file: &EnvFile) -> Vec<ConfigTableRow> {
    RECOGNIZED_KEYS
        .iter()
        .map(
            |(key, secret)| match config::resolve(env_file, &config::process_env, key) {
                Some((value, source)) => ConfigTableRow {
                    key: key.to_string(),
                    source: source.to_string(),
                    value: if *secret {
                        utils::mask_secret(&value)
                    } else {
                        value
                    },
                },
                None => ConfigTableRow {
                    key: key.to_string(),
                    source: "-".to_string(),
                    value: "unset".to_string(),
                },
            },
        )
        .collect()
}
