use std::collections::HashMap;

use axum::{Extension, extract::Query, http::StatusCode, response::Html};

use crate::types::{CallbackOutcome, CallbackResult, SharedAuthorization};

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<SharedAuthorization>,
) -> (StatusCode, Html<&'static str>) {
    let mut pending = shared_state.lock().await;

    if let Some(error) = params.get("error") {
        pending.outcome = Some(CallbackOutcome::Denied(error.clone()));
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Authorization denied.</h4>"),
        );
    }

    let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing authorization code.</h4>"),
        );
    };

    let state = params.get("state").cloned();
    let state_matches = state.as_deref() == Some(pending.state.as_str());
    pending.outcome = Some(CallbackOutcome::Code(CallbackResult {
        code: code.clone(),
        state,
    }));

    if !state_matches {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>State mismatch. Authorization denied.</h4>"),
        );
    }

    (
        StatusCode::OK,
        Html("<h2>Authorization received.</h2><p>You may close this tab.</p>"),
    )
}
