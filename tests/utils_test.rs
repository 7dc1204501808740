use reqwest::Url;
use withings_collector::WithingsError;
use withings_collector::config::Settings;
use withings_collector::management::EnvFile;
use withings_collector::utils::*;
use withings_collector::withings::auth::authorization_url;

fn test_settings(redirect_uri: &str) -> Settings {
    let content = format!(
        "WITHINGS_CLIENT_ID=client-123\nWITHINGS_CLIENT_SECRET=secret-456\nWITHINGS_REDIRECT_URI={redirect_uri}\n"
    );
    let env_file = EnvFile::parse("/tmp/withings-test.env", &content).unwrap();
    Settings::from_sources(&env_file, &|_: &str| None::<String>).unwrap()
}

#[test]
fn test_generate_state() {
    let state = generate_state();

    // Should be exactly 32 characters
    assert_eq!(state.len(), 32);

    // Should contain only alphanumeric characters
    assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated states should be different
    assert_ne!(state, generate_state());
}

#[test]
fn test_extract_code_plain() {
    let code = extract_code("http://localhost:8080/callback?code=ABC123", None).unwrap();
    assert_eq!(code, "ABC123");
}

#[test]
fn test_extract_code_ignores_other_params() {
    let urls = [
        "http://localhost:8080/callback?code=ABC123&state=xyz",
        "http://localhost:8080/callback?state=xyz&code=ABC123",
        "https://example.com/cb/?foo=1&code=ABC123&bar=2&state=xyz#fragment",
        "  http://localhost:8080/callback?code=ABC123&state=xyz\n",
    ];

    for url in urls {
        assert_eq!(extract_code(url, Some("xyz")).unwrap(), "ABC123", "{url}");
    }
}

#[test]
fn test_extract_code_decodes_value() {
    let code = extract_code("http://localhost/cb?code=a%2Bb%3D", None).unwrap();
    assert_eq!(code, "a+b=");
}

#[test]
fn test_extract_code_state_mismatch() {
    let err = extract_code("http://localhost/cb?code=ABC123&state=other", Some("mine")).unwrap_err();
    assert!(matches!(err, WithingsError::StateMismatch));
}

#[test]
fn test_extract_code_without_state_is_accepted() {
    let code = extract_code("http://localhost/cb?code=ABC123", Some("mine")).unwrap();
    assert_eq!(code, "ABC123");
}

#[test]
fn test_extract_code_missing_code() {
    assert!(matches!(
        extract_code("http://localhost/cb?state=xyz", None),
        Err(WithingsError::MissingCode)
    ));
    assert!(matches!(
        extract_code("http://localhost/cb?code=&state=xyz", None),
        Err(WithingsError::MissingCode)
    ));
}

#[test]
fn test_extract_code_denied() {
    let err = extract_code("http://localhost/cb?error=access_denied&state=xyz", None).unwrap_err();
    assert!(matches!(err, WithingsError::AuthorizationDenied(reason) if reason == "access_denied"));
}

#[test]
fn test_extract_code_malformed() {
    assert!(matches!(
        extract_code("code=ABC123", None),
        Err(WithingsError::MalformedRedirect(_))
    ));
    assert!(matches!(
        extract_code("   ", None),
        Err(WithingsError::MalformedRedirect(_))
    ));
}

#[test]
fn test_mask_secret() {
    assert_eq!(mask_secret("abcdef123456"), "abcd…");
    assert_eq!(mask_secret("abc"), "***");
    assert_eq!(mask_secret(""), "");
}

#[test]
fn test_authorization_url() {
    let settings = test_settings("http://localhost:8080/callback/");
    let url = authorization_url(&settings, "state-1", "user.metrics,user.activity").unwrap();
    let parsed = Url::parse(&url).unwrap();

    assert_eq!(parsed.host_str(), Some("account.withings.com"));
    assert_eq!(parsed.path(), "/oauth2_user/authorize2");

    let params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let get = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    assert_eq!(get("response_type"), Some("code"));
    assert_eq!(get("client_id"), Some("client-123"));
    assert_eq!(get("state"), Some("state-1"));
    assert_eq!(get("scope"), Some("user.metrics,user.activity"));
    // Trailing slash must survive untouched
    assert_eq!(get("redirect_uri"), Some("http://localhost:8080/callback/"));
    // The client secret never appears in the browser URL
    assert!(!url.contains("secret-456"));
}
