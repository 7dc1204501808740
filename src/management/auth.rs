use crate::{
    Res, WithingsError,
    config::{self, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
    management::EnvFile,
    types::TokenPair,
};

pub struct TokenManager {
    token: TokenPair,
}

impl TokenManager {
    pub fn new(token: TokenPair) -> Self {
        TokenManager { token }
    }

    /// Stored refresh token, environment first, then the env file.
    pub fn load_refresh_token(env_file: &EnvFile) -> Res<String> {
        Self::load_refresh_token_with(env_file, &config::process_env)
    }

    pub fn load_refresh_token_with<F>(env_file: &EnvFile, env_lookup: &F) -> Res<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        config::resolve(env_file, env_lookup, REFRESH_TOKEN_KEY)
            .map(|(value, _)| value)
            .ok_or_else(|| WithingsError::MissingConfig {
                path: env_file.path().to_path_buf(),
                keys: vec![REFRESH_TOKEN_KEY.to_string()],
            })
    }

    /// Writes both tokens with a single file replacement.
    pub async fn persist(&self, env_file: &mut EnvFile) -> Res<()> {
        env_file.set(ACCESS_TOKEN_KEY, &self.token.access_token);
        env_file.set(REFRESH_TOKEN_KEY, &self.token.refresh_token);
        env_file.persist().await
    }

    pub fn current_token(&self) -> &TokenPair {
        &self.token
    }
}
