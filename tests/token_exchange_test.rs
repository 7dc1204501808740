use std::{collections::HashMap, path::Path, sync::Arc};

use axum::{Form, Router, http::StatusCode, routing::post};
use tokio::sync::Mutex;
use withings_collector::WithingsError;
use withings_collector::config::Settings;
use withings_collector::management::EnvFile;
use withings_collector::types::AuthOptions;
use withings_collector::withings::auth;

type Requests = Arc<Mutex<Vec<HashMap<String, String>>>>;

const SUCCESS: &str = r#"{"status":0,"body":{"userid":"363","access_token":"A","refresh_token":"B","expires_in":10800,"scope":"user.metrics","token_type":"Bearer"}}"#;
const REDIRECT_URI: &str = "http://localhost:8080/callback/";

// Fake token endpoint recording every form it receives
async fn spawn_token_server(status: StatusCode, body: &'static str) -> (String, Requests) {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&requests);

    let app = Router::new().route(
        "/v2/oauth2",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let recorded = Arc::clone(&recorded);
            async move {
                recorded.lock().await.push(form);
                (status, body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), requests)
}

fn write_env(dir: &Path, api_url: &str, extra: &str) -> std::path::PathBuf {
    let path = dir.join(".env");
    let content = format!(
        "# local settings\n\
         WITHINGS_CLIENT_ID=cid\n\
         WITHINGS_CLIENT_SECRET=csecret\n\
         WITHINGS_REDIRECT_URI={REDIRECT_URI}\n\
         WITHINGS_API_URL={api_url}\n\
         OTHER_SERVICE_KEY=xyz\n\
         {extra}"
    );
    std::fs::write(&path, content).unwrap();
    path
}

async fn load(path: &Path) -> (Settings, EnvFile) {
    let env_file = EnvFile::load(path).await.unwrap();
    let settings = Settings::from_sources(&env_file, &|_: &str| None::<String>).unwrap();
    (settings, env_file)
}

fn paste_options() -> AuthOptions {
    AuthOptions {
        scope: None,
        open_browser: false,
        listen: false,
    }
}

#[tokio::test]
async fn test_auth_stores_tokens_and_keeps_other_keys() {
    let (api_url, requests) = spawn_token_server(StatusCode::OK, SUCCESS).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_env(dir.path(), &api_url, "");
    let (settings, mut env_file) = load(&path).await;

    let pasted: &[u8] = b"http://localhost:8080/callback/?foo=bar&code=ABC123&lang=en\n";
    let token = auth::auth(&settings, &mut env_file, &paste_options(), pasted)
        .await
        .unwrap();

    assert_eq!(token.access_token, "A");
    assert_eq!(token.refresh_token, "B");
    assert_eq!(token.expires_in, 10800);
    assert_eq!(token.user_id.as_deref(), Some("363"));

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.lines().any(|l| l == "WITHINGS_ACCESS_TOKEN=A"));
    assert!(written.lines().any(|l| l == "WITHINGS_REFRESH_TOKEN=B"));
    assert!(written.starts_with(&format!(
        "# local settings\nWITHINGS_CLIENT_ID=cid\nWITHINGS_CLIENT_SECRET=csecret\n\
         WITHINGS_REDIRECT_URI={REDIRECT_URI}\nWITHINGS_API_URL={api_url}\nOTHER_SERVICE_KEY=xyz\n"
    )));

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    let form = &requests[0];
    assert_eq!(form["action"], "requesttoken");
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["client_id"], "cid");
    assert_eq!(form["client_secret"], "csecret");
    assert_eq!(form["code"], "ABC123");
    // Sent exactly as configured, trailing slash included
    assert_eq!(form["redirect_uri"], REDIRECT_URI);
}

#[tokio::test]
async fn test_rejected_code_writes_nothing() {
    let (api_url, requests) = spawn_token_server(
        StatusCode::OK,
        r#"{"status":503,"body":{},"error":"Invalid Params: invalid code"}"#,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_env(dir.path(), &api_url, "WITHINGS_ACCESS_TOKEN=old\n");
    let before = std::fs::read_to_string(&path).unwrap();
    let (settings, mut env_file) = load(&path).await;

    let pasted: &[u8] = b"http://localhost:8080/callback/?code=USED\n";
    let err = auth::auth(&settings, &mut env_file, &paste_options(), pasted)
        .await
        .unwrap_err();

    assert!(matches!(err, WithingsError::Rejected { status: 503, .. }));
    assert!(err.hint().unwrap().contains("30 seconds"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert_eq!(requests.lock().await.len(), 1);
}

#[tokio::test]
async fn test_http_error_writes_nothing() {
    let (api_url, _) =
        spawn_token_server(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_env(dir.path(), &api_url, "");
    let before = std::fs::read_to_string(&path).unwrap();
    let (settings, mut env_file) = load(&path).await;

    let pasted: &[u8] = b"http://localhost:8080/callback/?code=ABC123\n";
    let err = auth::auth(&settings, &mut env_file, &paste_options(), pasted)
        .await
        .unwrap_err();

    match err {
        WithingsError::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let (api_url, requests) = spawn_token_server(
        StatusCode::OK,
        r#"{"status":601,"body":{},"error":"Too Many Request"}"#,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_env(dir.path(), &api_url, "");
    let before = std::fs::read_to_string(&path).unwrap();
    let (settings, mut env_file) = load(&path).await;

    let pasted: &[u8] = b"http://localhost:8080/callback/?code=ABC123\n";
    let err = auth::auth(&settings, &mut env_file, &paste_options(), pasted)
        .await
        .unwrap_err();

    assert!(matches!(err, WithingsError::RateLimited(_)));
    assert_eq!(requests.lock().await.len(), 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[tokio::test]
async fn test_bad_paste_never_reaches_token_endpoint() {
    let (api_url, requests) = spawn_token_server(StatusCode::OK, SUCCESS).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_env(dir.path(), &api_url, "");
    let (settings, mut env_file) = load(&path).await;

    let pastes = [
        "\n",
        "",
        "http://localhost:8080/callback/?state=abc\n",
        "http://localhost:8080/callback/?code=ABC123&state=forged\n",
    ];

    let mut errors = Vec::new();
    for pasted in pastes {
        let err = auth::auth(&settings, &mut env_file, &paste_options(), pasted.as_bytes())
            .await
            .unwrap_err();
        errors.push(err);
    }

    assert!(matches!(errors[0], WithingsError::MalformedRedirect(_)));
    assert!(matches!(errors[1], WithingsError::MalformedRedirect(_)));
    assert!(matches!(errors[2], WithingsError::MissingCode));
    assert!(matches!(errors[3], WithingsError::StateMismatch));
    assert!(requests.lock().await.is_empty());
}

#[tokio::test]
async fn test_missing_credentials_fail_before_network() {
    let (api_url, requests) = spawn_token_server(StatusCode::OK, SUCCESS).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(&path, format!("WITHINGS_API_URL={api_url}\nWITHINGS_CLIENT_ID=cid\n")).unwrap();

    let env_file = EnvFile::load(&path).await.unwrap();
    let err = Settings::from_sources(&env_file, &|_: &str| None::<String>).unwrap_err();

    assert!(matches!(
        err,
        WithingsError::MissingConfig { ref keys, .. }
            if keys == &vec!["WITHINGS_CLIENT_SECRET".to_string(), "WITHINGS_REDIRECT_URI".to_string()]
    ));
    assert!(requests.lock().await.is_empty());
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let (api_url, requests) = spawn_token_server(
        StatusCode::OK,
        r#"{"status":0,"body":{"access_token":"A2","refresh_token":"B2","expires_in":10800}}"#,
    )
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_env(
        dir.path(),
        &api_url,
        "WITHINGS_ACCESS_TOKEN=A1\nWITHINGS_REFRESH_TOKEN=B1\n",
    );
    let (settings, mut env_file) = load(&path).await;

    let token = auth::refresh(&settings, &mut env_file).await.unwrap();
    assert_eq!(token.access_token, "A2");

    let reloaded = EnvFile::load(&path).await.unwrap();
    assert_eq!(reloaded.get("WITHINGS_ACCESS_TOKEN"), Some("A2"));
    assert_eq!(reloaded.get("WITHINGS_REFRESH_TOKEN"), Some("B2"));
    assert_eq!(reloaded.get("OTHER_SERVICE_KEY"), Some("xyz"));

    let requests = requests.lock().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["grant_type"], "refresh_token");
    assert_eq!(requests[0]["refresh_token"], "B1");
    assert!(!requests[0].contains_key("code"));
}
