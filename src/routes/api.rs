use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{Value, json};
use tracing::instrument;

use crate::core::client::USER_GAMES_PATH;
use crate::core::error::Error;
use crate::core::state::AppState;
use crate::types::request::TestRequest;
use crate::types::token::TokenHealth;
use crate::utils::time::epoch_ms_to_iso;

#[instrument(skip(state))]
pub(crate) async fn status(State(state): State<AppState>) -> Result<Json<TokenHealth>, Error> {
    Ok(Json(state.store.health().await?))
}

#[instrument(skip(state))]
pub(crate) async fn refresh(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    let refreshed = state.client.refresh().await?;

    Ok(Json(json!({
        "ok": true,
        "expiresAt": epoch_ms_to_iso(refreshed.expires_at),
    })))
}

#[instrument(skip(state))]
pub(crate) async fn clear(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    state.store.clear().await?;

    Ok(Json(json!({ "ok": true, "message": "Token file deleted." })))
}

/// Reports token health plus a live API probe; probe failures keep the
/// health payload in the response instead of surfacing a bare error.
#[instrument(skip(state))]
pub(crate) async fn diagnostics(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let health = state.store.health().await?;

    match state.client.request(USER_GAMES_PATH, None).await {
        Ok(sample) => Ok((
            StatusCode::OK,
            Json(json!({ "ok": true, "health": health, "sample": sample })),
        )),
        Err(e) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "health": health, "error": e.to_string() })),
        )),
    }
}

#[instrument(skip(state, body))]
pub(crate) async fn test_request(
    State(state): State<AppState>,
    Json(body): Json<TestRequest>,
) -> Result<Json<Value>, Error> {
    let data = state.client.request(&body.path, body.params).await?;

    Ok(Json(json!({ "ok": true, "data": data })))
}
