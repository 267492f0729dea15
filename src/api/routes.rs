//! Route handlers for the callback service.
//!
//! Only client-input, configuration and provider errors reach the response.
//! Storage problems are logged and otherwise ignored, so a completed OAuth
//! exchange always lands on the success page.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::CallbackError;
use crate::fallback::FallbackRecord;
use crate::providers::TokenSet;
use crate::store::WriteOutcome;
use crate::{AppState, SharedState};

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Authorization complete</title></head>
  <body>
    <h1>Authorization complete</h1>
    <p>Your account has been linked successfully. You can close this window.</p>
  </body>
</html>
"#;

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/callback", get(callback))
        .route("/check", get(check))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn index() -> impl IntoResponse {
    "OAuth callback service is running."
}

// =============================================================================
// OAuth callback
// =============================================================================

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
}

/// GET /callback — exchange the code, resolve the user, store the tokens.
///
/// TODO: the `state` parameter is not checked; verifying it needs a value
/// issued when the authorization flow starts, which this service never sees.
async fn callback(
    State(state): State<SharedState>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> Result<Html<&'static str>, CallbackError> {
    // A malformed or duplicated query reads as a missing code.
    let code = query
        .ok()
        .and_then(|Query(q)| q.code)
        .filter(|c| !c.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let credentials = state.config.oauth.credentials().ok_or_else(|| {
        error!("REDIRECT_URI, CLIENT_ID and CLIENT_SECRET must all be set");
        CallbackError::NotConfigured
    })?;

    let debug = state.config.debug;

    let tokens = state
        .provider
        .exchange_code(&code, &credentials)
        .await
        .map_err(|e| CallbackError::from_provider(e, debug))?;

    let profile = state
        .provider
        .fetch_profile(&tokens.access_token)
        .await
        .map_err(|e| CallbackError::from_provider(e, debug))?;

    info!(user_id = %profile.user_id, "OAuth exchange completed");
    persist_tokens(&state, &profile.user_id, &tokens).await;

    Ok(Html(SUCCESS_PAGE))
}

/// Store tokens in the database, or the fallback file when the database is
/// disabled. Never fails.
async fn persist_tokens(state: &AppState, user_id: &str, tokens: &TokenSet) {
    let refresh_token = tokens.refresh_token.as_deref();

    match state
        .store
        .upsert_token(user_id, &tokens.access_token, refresh_token)
        .await
    {
        WriteOutcome::Stored => info!(user_id, "Tokens stored"),
        WriteOutcome::Failed(e) => error!(user_id, "Failed to store tokens: {e}"),
        WriteOutcome::Disabled => match &state.fallback {
            Some(writer) => {
                let record = FallbackRecord::new(user_id, &tokens.access_token, refresh_token);
                match writer.append(&record).await {
                    Ok(()) => info!(
                        user_id,
                        path = %writer.path().display(),
                        "Tokens written to fallback file"
                    ),
                    Err(e) => error!(user_id, "Fallback write failed: {e}"),
                }
            }
            None => warn!(user_id, "Persistence disabled, tokens were not stored"),
        },
    }
}

// =============================================================================
// Token check
// =============================================================================

#[derive(Deserialize)]
struct CheckQuery {
    user_id: Option<String>,
}

/// GET /check — always 200; lookup failures read as `false`.
async fn check(
    State(state): State<SharedState>,
    query: Result<Query<CheckQuery>, QueryRejection>,
) -> Json<serde_json::Value> {
    let user_id = query.ok().and_then(|Query(q)| q.user_id);

    let has_token = match user_id.as_deref() {
        Some(user_id) if !user_id.is_empty() => state.store.has_token(user_id).await,
        _ => false,
    };

    Json(json!({ "hasToken": has_token }))
}
