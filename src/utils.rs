use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;

use crate::{Res, WithingsError, types::CallbackResult};

pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Pulls `code` and `state` out of a redirect URL's query string.
pub fn parse_redirect_url(pasted: &str) -> Res<CallbackResult> {
    let pasted = pasted.trim();
    if pasted.is_empty() {
        return Err(WithingsError::MalformedRedirect("nothing was pasted".to_string()));
    }

    let url = Url::parse(pasted)
        .map_err(|e| WithingsError::MalformedRedirect(format!("{e}: {pasted}")))?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if code.is_none() => code = Some(value.into_owned()),
            "state" if state.is_none() => state = Some(value.into_owned()),
            "error" if error.is_none() => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(WithingsError::AuthorizationDenied(error));
    }

    match code.filter(|c| !c.is_empty()) {
        Some(code) => Ok(CallbackResult { code, state }),
        None => Err(WithingsError::MissingCode),
    }
}

/// Returns the authorization code from a pasted redirect URL.
///
/// A `state` that differs from `expected_state` is rejected; a redirect without
/// any `state` is accepted.
pub fn extract_code(pasted: &str, expected_state: Option<&str>) -> Res<String> {
    let result = parse_redirect_url(pasted)?;
    check_state(&result, expected_state)?;
    Ok(result.code)
}

pub fn check_state(result: &CallbackResult, expected_state: Option<&str>) -> Res<()> {
    match (result.state.as_deref(), expected_state) {
        (Some(got), Some(expected)) if got != expected => Err(WithingsError::StateMismatch),
        _ => Ok(()),
    }
}

/// Keeps the first four characters of a secret.
pub fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if value.chars().count() <= 4 {
        return "*".repeat(value.chars().count());
    }
    format!("{visible}…")
}
