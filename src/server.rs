use std::net::SocketAddr;

use axum::{Extension, Router, routing::get};
use reqwest::Url;
use tokio::task::JoinHandle;

use crate::{
    Res, WithingsError, api, config::REDIRECT_URI_KEY, types::SharedAuthorization, warning,
};

/// Router serving the callback on the redirect URI's path plus `/health`.
pub fn router(callback_path: &str, state: SharedAuthorization) -> Router {
    let app = Router::new().route(callback_path, get(api::callback).layer(Extension(state)));
    if callback_path == "/health" {
        return app;
    }
    app.route("/health", get(api::health))
}

/// Binds the listener named by the redirect URI and serves it in the background.
///
/// Returns the bound address and the server task; abort the task once the
/// callback has been received.
pub async fn start_callback_server(
    redirect_uri: &str,
    state: SharedAuthorization,
) -> Res<(SocketAddr, JoinHandle<()>)> {
    let url = Url::parse(redirect_uri).map_err(|e| {
        WithingsError::InvalidConfig(format!("{REDIRECT_URI_KEY} is not a valid URL: {e}"))
    })?;
    let (Some(host), Some(port)) = (url.host_str(), url.port()) else {
        return Err(WithingsError::InvalidConfig(format!(
            "{REDIRECT_URI_KEY} must include host and port to use the local listener"
        )));
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let path = match url.path() {
        "" => "/",
        p => p,
    };

    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| WithingsError::Listener {
            addr: format!("{host}:{port}"),
            source: e,
        })?;
    let addr = listener
        .local_addr()
        .map_err(|e| WithingsError::Listener {
            addr: format!("{host}:{port}"),
            source: e,
        })?;

    let app = router(path, state);
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    Ok((addr, handle))
}
