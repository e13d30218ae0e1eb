pub(crate) mod stdio;

use std::collections::HashMap;

use serde_json::{Value, json};
use tracing::instrument;

use crate::core::client::USER_GAMES_PATH;
use crate::core::error::Error;
use crate::core::oauth::OauthClient;
use crate::core::state::AppState;
use crate::utils::time::epoch_ms_to_iso;

/// Tool catalog advertised to the agent host.
pub(crate) fn catalog() -> Value {
    json!([
        {
            "name": "oauth_status",
            "description": "Show whether a Yahoo OAuth token exists and whether it is expired.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
        {
            "name": "oauth_authorization_url",
            "description": "Generate a Yahoo OAuth authorization URL to start login in a browser.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "state": { "type": "string", "description": "Optional custom state value for CSRF protection." }
                },
                "additionalProperties": false
            }
        },
        {
            "name": "oauth_exchange_code",
            "description": "Exchange the authorization code from the Yahoo callback for access and refresh tokens.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "code": { "type": "string", "description": "OAuth authorization code from the callback URL." }
                },
                "required": ["code"],
                "additionalProperties": false
            }
        },
        {
            "name": "oauth_refresh",
            "description": "Refresh the current Yahoo access token using the saved refresh token.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
        {
            "name": "oauth_clear",
            "description": "Clear the locally saved Yahoo token file.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
        {
            "name": "fantasy_request",
            "description": "Call any Yahoo Fantasy API v2 path. Example path: /users;use_login=1/games or /league/{league_key}/standings",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Yahoo Fantasy path, with or without leading slash." },
                    "params": {
                        "type": "object",
                        "description": "Optional query string params.",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["path"],
                "additionalProperties": false
            }
        },
        {
            "name": "fantasy_user_games",
            "description": "Convenience endpoint: fetch games for the logged-in Yahoo user.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
        {
            "name": "diagnostics_run",
            "description": "Run basic checks: token status plus a live Yahoo Fantasy API request.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        }
    ])
}

#[instrument(skip(state, args))]
pub(crate) async fn dispatch(state: &AppState, name: &str, args: &Value) -> Result<Value, Error> {
    match name {
        "oauth_status" => Ok(serde_json::to_value(state.store.health().await?)?),
        "oauth_authorization_url" => {
            let value = match args.get("state").and_then(Value::as_str) {
                Some(custom) if !custom.is_empty() => custom.to_string(),
                _ => OauthClient::generate_state(),
            };

            Ok(json!({
                "state": value,
                "authorizationUrl": state.oauth.authorization_url(&value)?,
                "redirectUri": state.oauth.redirect_uri(),
            }))
        }
        "oauth_exchange_code" => {
            let code = required_str(args, "code")?;

            let token = state.oauth.exchange_code(code).await?;
            state.store.set(&token).await?;

            Ok(json!({
                "message": "OAuth code exchanged successfully.",
                "expiresAt": epoch_ms_to_iso(token.expires_at),
            }))
        }
        "oauth_refresh" => {
            let token = state.client.refresh().await?;

            Ok(json!({
                "message": "Token refreshed.",
                "expiresAt": epoch_ms_to_iso(token.expires_at),
            }))
        }
        "oauth_clear" => {
            state.store.clear().await?;
            Ok(json!({ "message": "Saved token cleared." }))
        }
        "fantasy_request" => {
            let path = required_str(args, "path")?;
            let params = match args.get("params") {
                Some(value) if !value.is_null() => Some(coerce_params(value)?),
                _ => None,
            };

            state.client.request(path, params).await
        }
        "fantasy_user_games" => state.client.request(USER_GAMES_PATH, None).await,
        "diagnostics_run" => diagnostics(state).await,
        other => Err(Error::UnknownTool(other.to_string())),
    }
}

async fn diagnostics(state: &AppState) -> Result<Value, Error> {
    let health = state.store.health().await?;

    if !health.has_token {
        return Ok(json!({
            "ok": false,
            "health": health,
            "checks": [{ "name": "live_api", "ok": false, "error": "No token found." }],
        }));
    }

    match state.client.request(USER_GAMES_PATH, None).await {
        Ok(sample) => Ok(json!({
            "ok": true,
            "health": health,
            "checks": [{ "name": "live_api", "ok": true }],
            "sample": sample,
        })),
        Err(e) => Ok(json!({
            "ok": false,
            "health": health,
            "checks": [{ "name": "live_api", "ok": false, "error": e.to_string() }],
        })),
    }
}

/// Query params arrive as JSON; scalars are stringified the way they would
/// appear in a query string, anything nested is rejected rather than
/// silently dropped.
fn coerce_params(value: &Value) -> Result<HashMap<String, String>, Error> {
    let object = value.as_object().ok_or(Error::InvalidParams)?;

    let mut params = HashMap::new();
    for (key, value) in object {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(Error::InvalidParams),
        };
        params.insert(key.clone(), value);
    }

    Ok(params)
}

fn required_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, Error> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(Error::MissingArgument(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::token::TokenRecord;
    use axum::Router;
    use axum::routing::post;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // points at closed ports; any outbound call fails loudly
    fn offline_state(dir: &tempfile::TempDir) -> AppState {
        AppState::for_tests(
            &dir.path().join("tokens.json"),
            "http://127.0.0.1:9/",
            "http://127.0.0.1:9",
        )
    }

    #[tokio::test]
    async fn test_oauth_status_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let value = dispatch(&state, "oauth_status", &json!({})).await.unwrap();

        assert_eq!(value, json!({ "hasToken": false, "isExpired": true }));
    }

    #[tokio::test]
    async fn test_authorization_url_generates_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let value = dispatch(&state, "oauth_authorization_url", &json!({}))
            .await
            .unwrap();

        let generated = value["state"].as_str().unwrap();
        assert_eq!(generated.len(), 32);
        assert!(
            value["authorizationUrl"]
                .as_str()
                .unwrap()
                .contains(generated)
        );
        assert_eq!(
            value["redirectUri"],
            json!("http://localhost:3476/auth/callback")
        );
    }

    #[tokio::test]
    async fn test_authorization_url_honors_custom_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let value = dispatch(
            &state,
            "oauth_authorization_url",
            &json!({ "state": "my-state" }),
        )
        .await
        .unwrap();

        assert_eq!(value["state"], json!("my-state"));
    }

    #[tokio::test]
    async fn test_exchange_code_requires_code() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        for args in [json!({}), json!({ "code": "" }), json!({ "code": "   " })] {
            let err = dispatch(&state, "oauth_exchange_code", &args)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::MissingArgument("code")));
        }
    }

    #[tokio::test]
    async fn test_exchange_code_persists_token() {
        let dir = tempfile::tempdir().unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let router = Router::new().route(
                "/",
                post(|| async {
                    axum::Json(json!({
                        "access_token": "A",
                        "refresh_token": "R",
                        "expires_in": 3600,
                        "token_type": "bearer",
                    }))
                }),
            );
            axum::serve(listener, router).await.unwrap();
        });

        let state = AppState::for_tests(
            &dir.path().join("tokens.json"),
            &format!("http://{addr}"),
            "http://127.0.0.1:9",
        );

        let before = Utc::now().timestamp_millis();
        let value = dispatch(&state, "oauth_exchange_code", &json!({ "code": "abc123" }))
            .await
            .unwrap();
        let after = Utc::now().timestamp_millis();

        assert_eq!(value["message"], json!("OAuth code exchanged successfully."));

        let token = state.store.get().await.unwrap().unwrap();
        assert_eq!(token.access_token, "A");
        assert_eq!(token.refresh_token, "R");
        assert!(token.expires_at >= before + 3_600_000);
        assert!(token.expires_at <= after + 3_600_000);
        assert_eq!(
            value["expiresAt"],
            json!(epoch_ms_to_iso(token.expires_at))
        );
    }

    #[tokio::test]
    async fn test_fantasy_request_forwards_scalar_params() {
        let dir = tempfile::tempdir().unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let router = Router::new().route(
                "/games",
                axum::routing::get(
                    |axum::extract::RawQuery(query): axum::extract::RawQuery| async move {
                        let query = query.unwrap_or_default();
                        assert!(query.contains("count=5"));
                        assert!(query.contains("flat=true"));
                        assert!(query.contains("format=json"));
                        "{}"
                    },
                ),
            );
            axum::serve(listener, router).await.unwrap();
        });

        let state = AppState::for_tests(
            &dir.path().join("tokens.json"),
            "http://127.0.0.1:9/",
            &format!("http://{addr}"),
        );
        state
            .store
            .set(&TokenRecord {
                access_token: String::from("access"),
                refresh_token: String::from("refresh"),
                expires_at: Utc::now().timestamp_millis() + 3_600_000,
                token_type: String::from("bearer"),
                scope: None,
                obtained_at: String::from("2026-01-01T00:00:00.000Z"),
            })
            .await
            .unwrap();

        dispatch(
            &state,
            "fantasy_request",
            &json!({ "path": "/games", "params": { "count": 5, "flat": true } }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_fantasy_request_rejects_nested_params() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        for params in [json!({ "filter": { "pos": "QB" } }), json!([1, 2])] {
            let err = dispatch(
                &state,
                "fantasy_request",
                &json!({ "path": "/games", "params": params }),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, Error::InvalidParams));
        }
    }

    #[tokio::test]
    async fn test_fantasy_request_requires_path() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let err = dispatch(&state, "fantasy_request", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingArgument("path")));
    }

    #[tokio::test]
    async fn test_oauth_refresh_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let err = dispatch(&state, "oauth_refresh", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::NoToken));
    }

    #[tokio::test]
    async fn test_oauth_clear_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let value = dispatch(&state, "oauth_clear", &json!({})).await.unwrap();
        assert_eq!(value, json!({ "message": "Saved token cleared." }));
    }

    #[tokio::test]
    async fn test_diagnostics_without_token_skips_live_call() {
        let dir = tempfile::tempdir().unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let router = Router::new().fallback(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "{}"
                }
            });
            axum::serve(listener, router).await.unwrap();
        });

        let state = AppState::for_tests(
            &dir.path().join("tokens.json"),
            "http://127.0.0.1:9/",
            &format!("http://{addr}"),
        );

        let value = dispatch(&state, "diagnostics_run", &json!({})).await.unwrap();

        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["health"]["hasToken"], json!(false));
        assert_eq!(value["checks"][0]["name"], json!("live_api"));
        assert_eq!(value["checks"][0]["ok"], json!(false));
        assert_eq!(value["checks"][0]["error"], json!("No token found."));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_diagnostics_reports_live_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        state
            .store
            .set(&TokenRecord {
                access_token: String::from("access"),
                refresh_token: String::from("refresh"),
                expires_at: Utc::now().timestamp_millis() + 3_600_000,
                token_type: String::from("bearer"),
                scope: None,
                obtained_at: String::from("2026-01-01T00:00:00.000Z"),
            })
            .await
            .unwrap();

        let value = dispatch(&state, "diagnostics_run", &json!({})).await.unwrap();

        assert_eq!(value["ok"], json!(false));
        assert_eq!(value["health"]["hasToken"], json!(true));
        assert_eq!(value["checks"][0]["ok"], json!(false));
        assert!(value["checks"][0]["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let dir = tempfile::tempdir().unwrap();
        let state = offline_state(&dir);

        let err = dispatch(&state, "no_such_tool", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(_)));
    }
}
