use serde::Deserialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::instrument;

use crate::core::error::ConfigError;
use crate::core::state::AppState;
use crate::tools;

/// One newline-delimited request from the agent host.
#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    id: Option<Value>,
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Serves tool calls over stdin/stdout until the host closes stdin.
/// Requests are `{"id"?, "name", "arguments"?}` JSON lines; results are
/// text-wrapped JSON so the host can relay them verbatim.
pub(crate) async fn serve(state: AppState) -> Result<(), ConfigError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = handle_line(&state, line).await;

        stdout.write_all(response.to_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    tracing::debug!("stdin closed, shutting down");

    Ok(())
}

#[instrument(skip_all)]
async fn handle_line(state: &AppState, line: &str) -> Value {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            // the id is unrecoverable from a line that failed to parse
            return json!({ "id": null, "error": { "message": format!("Invalid request: {e}") } });
        }
    };

    let id = request.id.unwrap_or(Value::Null);

    if request.name == "tools/list" {
        return json!({ "id": id, "result": { "tools": tools::catalog() } });
    }

    match tools::dispatch(state, &request.name, &request.arguments).await {
        Ok(value) => json!({ "id": id, "result": text_result(&value) }),
        Err(e) => json!({ "id": id, "error": { "message": e.to_string() } }),
    }
}

fn text_result(value: &Value) -> Value {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    json!({ "content": [{ "type": "text", "text": text }] })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(dir: &tempfile::TempDir) -> AppState {
        AppState::for_tests(
            &dir.path().join("tokens.json"),
            "http://127.0.0.1:9/",
            "http://127.0.0.1:9",
        )
    }

    #[tokio::test]
    async fn test_invalid_json_line() {
        let dir = tempfile::tempdir().unwrap();
        let response = handle_line(&state(&dir), "not json").await;

        assert_eq!(response["id"], json!(null));
        assert!(
            response["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request:")
        );
    }

    #[tokio::test]
    async fn test_tools_list() {
        let dir = tempfile::tempdir().unwrap();
        let response = handle_line(&state(&dir), r#"{"id": 1, "name": "tools/list"}"#).await;

        assert_eq!(response["id"], json!(1));
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"oauth_status"));
        assert!(names.contains(&"fantasy_request"));
        assert!(names.contains(&"diagnostics_run"));
    }

    #[tokio::test]
    async fn test_result_is_text_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let response = handle_line(&state(&dir), r#"{"id": 2, "name": "oauth_status"}"#).await;

        assert_eq!(response["id"], json!(2));
        let content = &response["result"]["content"][0];
        assert_eq!(content["type"], json!("text"));

        let text: Value = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
        assert_eq!(text, json!({ "hasToken": false, "isExpired": true }));
    }

    #[tokio::test]
    async fn test_error_carries_message() {
        let dir = tempfile::tempdir().unwrap();
        let response = handle_line(&state(&dir), r#"{"name": "oauth_refresh"}"#).await;

        assert_eq!(response["id"], json!(null));
        assert_eq!(
            response["error"]["message"],
            json!("No token found. Complete OAuth first.")
        );
    }
}
