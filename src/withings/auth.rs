use std::{
    io::Write,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response, StatusCode, Url};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::Mutex,
};

use crate::{
    Res, WithingsError,
    config::Settings,
    error::STATUS_RATE_LIMITED,
    info,
    management::{EnvFile, TokenManager},
    server::start_callback_server,
    types::{
        AuthOptions, CallbackOutcome, PendingAuthorization, SharedAuthorization,
        TokenBody, TokenEnvelope, TokenPair,
    },
    utils, warning,
};

/// Runs the authorization code flow and stores the resulting tokens.
///
/// 1. Builds the authorization URL with a fresh `state`
/// 2. Opens it in the browser (or prints it for manual navigation)
/// 3. Reads the pasted redirect URL from `input`, or waits for the local
///    callback listener when `options.listen` is set
/// 4. Exchanges the code for tokens with a single request
/// 5. Writes `WITHINGS_ACCESS_TOKEN` and `WITHINGS_REFRESH_TOKEN` to `env_file`
///
/// Nothing is written unless the exchange succeeds. The code is never
/// resubmitted: Withings codes are single-use and expire after about 30 seconds.
pub async fn auth<R>(
    settings: &Settings,
    env_file: &mut EnvFile,
    options: &AuthOptions,
    input: R,
) -> Res<TokenPair>
where
    R: AsyncBufRead + Unpin,
{
    let state = utils::generate_state();
    let scope = options.scope.as_deref().unwrap_or(&settings.scope);
    let auth_url = authorization_url(settings, &state, scope)?;

    let code = if options.listen {
        code_from_listener(settings, &auth_url, &state, options.open_browser).await?
    } else {
        present_authorization_url(&auth_url, options.open_browser);
        let pasted = prompt_redirect_url(input).await?;
        utils::extract_code(&pasted, Some(&state))?
    };

    let client = http_client(settings)?;
    let pb = spinner("Exchanging authorization code for tokens...");
    let exchanged = exchange_code(&client, settings, &code).await;
    pb.finish_and_clear();

    let token_manager = TokenManager::new(exchanged?);
    token_manager.persist(env_file).await?;
    Ok(token_manager.current_token().clone())
}

/// Trades the stored refresh token for a new pair and stores it.
pub async fn refresh(settings: &Settings, env_file: &mut EnvFile) -> Res<TokenPair> {
    let stored = TokenManager::load_refresh_token(env_file)?;

    let client = http_client(settings)?;
    let pb = spinner("Refreshing access token...");
    let refreshed = refresh_token(&client, settings, &stored).await;
    pb.finish_and_clear();

    let token_manager = TokenManager::new(refreshed?);
    token_manager.persist(env_file).await?;
    Ok(token_manager.current_token().clone())
}

/// Builds the URL the user opens to grant access.
pub fn authorization_url(settings: &Settings, state: &str, scope: &str) -> Res<String> {
    let credentials = &settings.credentials;
    let url = Url::parse_with_params(
        &settings.authorize_url(),
        &[
            ("response_type", "code"),
            ("client_id", credentials.client_id.as_str()),
            ("state", state),
            ("scope", scope),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ],
    )
    .map_err(|e| {
        WithingsError::InvalidConfig(format!(
            "authorization URL '{}' is invalid: {e}",
            settings.authorize_url()
        ))
    })?;

    Ok(url.to_string())
}

/// Reads a single line holding the redirect URL.
pub async fn prompt_redirect_url<R>(mut input: R) -> Res<String>
where
    R: AsyncBufRead + Unpin,
{
    print!("Paste the full redirect URL here: ");
    let _ = std::io::stdout().flush();

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .await
        .map_err(|e| WithingsError::MalformedRedirect(format!("cannot read input: {e}")))?;
    if read == 0 || line.trim().is_empty() {
        return Err(WithingsError::MalformedRedirect(
            "nothing was pasted".to_string(),
        ));
    }

    Ok(line.trim().to_string())
}

pub fn http_client(settings: &Settings) -> Res<Client> {
    Ok(Client::builder().timeout(settings.http_timeout).build()?)
}

/// Exchanges an authorization code for a token pair.
///
/// The redirect URI is sent exactly as configured; Withings compares it
/// byte for byte with the registered one.
pub async fn exchange_code(client: &Client, settings: &Settings, code: &str) -> Res<TokenPair> {
    let credentials = &settings.credentials;
    let res = client
        .post(settings.token_url())
        .form(&[
            ("action", "requesttoken"),
            ("grant_type", "authorization_code"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", credentials.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    parse_token_response(res).await
}

/// Exchanges a refresh token for a new token pair.
pub async fn refresh_token(
    client: &Client,
    settings: &Settings,
    refresh_token: &str,
) -> Res<TokenPair> {
    let credentials = &settings.credentials;
    let res = client
        .post(settings.token_url())
        .form(&[
            ("action", "requesttoken"),
            ("grant_type", "refresh_token"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    parse_token_response(res).await
}

async fn parse_token_response(res: Response) -> Res<TokenPair> {
    let status = res.status();
    let body = res.text().await?;

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(WithingsError::RateLimited(body));
    }
    if !status.is_success() {
        return Err(WithingsError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    token_from_json(&body)
}

/// Interprets a token endpoint answer.
///
/// Withings reports failures with HTTP 200 and a non-zero `status` field.
pub fn token_from_json(text: &str) -> Res<TokenPair> {
    let envelope: TokenEnvelope = serde_json::from_str(text)
        .map_err(|e| WithingsError::MalformedResponse(format!("{e}: {text}")))?;

    let body = match envelope {
        TokenEnvelope::Bare(body) => body,
        TokenEnvelope::Wrapped {
            status: 0,
            body: Some(body),
            ..
        } => serde_json::from_value::<TokenBody>(body)
            .map_err(|e| WithingsError::MalformedResponse(format!("{e}: {text}")))?,
        TokenEnvelope::Wrapped { status: 0, .. } => {
            return Err(WithingsError::MalformedResponse(format!(
                "missing body: {text}"
            )));
        }
        TokenEnvelope::Wrapped {
            status: STATUS_RATE_LIMITED,
            error,
            ..
        } => {
            return Err(WithingsError::RateLimited(
                error.unwrap_or_else(|| "Too many requests".to_string()),
            ));
        }
        TokenEnvelope::Wrapped { status, error, .. } => {
            return Err(WithingsError::Rejected {
                status,
                message: error.unwrap_or_else(|| text.to_string()),
            });
        }
    };

    if body.access_token.is_empty() || body.refresh_token.is_empty() {
        return Err(WithingsError::MalformedResponse(format!(
            "empty token in response: {text}"
        )));
    }

    let user_id = match body.userid {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(TokenPair {
        access_token: body.access_token,
        refresh_token: body.refresh_token,
        expires_in: body.expires_in,
        user_id,
        obtained_at: Utc::now().timestamp(),
    })
}

async fn code_from_listener(
    settings: &Settings,
    auth_url: &str,
    state: &str,
    open_browser: bool,
) -> Res<String> {
    let pending: SharedAuthorization =
        Arc::new(Mutex::new(PendingAuthorization::new(state.to_string())));
    let (addr, server) =
        start_callback_server(&settings.credentials.redirect_uri, Arc::clone(&pending)).await?;
    info!("Waiting for the authorization callback on {}", addr);

    present_authorization_url(auth_url, open_browser);
    let outcome = wait_for_callback(pending, settings.callback_timeout).await;
    server.abort();

    match outcome? {
        // Unlike a pasted URL, a callback must echo the state back
        CallbackOutcome::Code(result) if result.state.as_deref() == Some(state) => {
            Ok(result.code)
        }
        CallbackOutcome::Code(_) => Err(WithingsError::StateMismatch),
        CallbackOutcome::Denied(reason) => Err(WithingsError::AuthorizationDenied(reason)),
    }
}

/// Polls the shared state until the callback handler stores an outcome.
pub async fn wait_for_callback(
    pending: SharedAuthorization,
    max_wait: Duration,
) -> Res<CallbackOutcome> {
    let pb = spinner("Waiting for authorization in the browser...");
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = pending.lock().await;
        if let Some(outcome) = lock.outcome.clone() {
            pb.finish_and_clear();
            return Ok(outcome);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    pb.finish_and_clear();
    Err(WithingsError::CallbackTimeout(max_wait.as_secs()))
}

fn present_authorization_url(auth_url: &str, open_browser: bool) {
    info!("Open the following URL and approve access:\n{}", auth_url);
    if open_browser && webbrowser::open(auth_url).is_err() {
        warning!("Failed to open browser. Please navigate to the URL above manually.");
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
