use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::oauth::OauthClient;
use crate::core::state::AppState;
use crate::types::request::CallbackParams;
use crate::utils::time::epoch_ms_to_iso;

const PAGE_HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Yahoo Fantasy Broker Setup</title>
  <style>
    :root {
      --bg: #f7f3eb;
      --card: #ffffff;
      --ink: #1f2c3a;
      --accent: #117a65;
      --accent-2: #0f4c81;
      --muted: #667384;
      --border: #d7d9dd;
      --danger: #a73737;
    }
    * { box-sizing: border-box; }
    body {
      margin: 0;
      font-family: "Segoe UI", Tahoma, Geneva, Verdana, sans-serif;
      color: var(--ink);
      background:
        radial-gradient(1200px 600px at -10% -20%, #ffe7c8 0%, transparent 55%),
        radial-gradient(1000px 500px at 120% 0%, #d7f2ec 0%, transparent 50%),
        var(--bg);
      min-height: 100vh;
      padding: 1.5rem;
    }
    .wrap { max-width: 900px; margin: 0 auto; display: grid; gap: 1rem; }
    .card {
      background: var(--card);
      border: 1px solid var(--border);
      border-radius: 14px;
      padding: 1rem 1.2rem;
      box-shadow: 0 4px 18px rgba(17, 35, 63, 0.06);
    }
    h1 { margin: 0; font-size: 1.6rem; }
    h2 { margin: 0 0 0.5rem; font-size: 1.1rem; }
    p { margin: 0.4rem 0; color: var(--muted); }
    .row { display: flex; flex-wrap: wrap; gap: 0.6rem; margin-top: 0.8rem; }
    button, a.button {
      border: 0;
      border-radius: 10px;
      padding: 0.65rem 0.9rem;
      font-size: 0.95rem;
      cursor: pointer;
      color: #fff;
      background: linear-gradient(120deg, var(--accent), var(--accent-2));
      text-decoration: none;
      display: inline-block;
    }
    button.secondary { background: #4a5665; }
    button.danger { background: var(--danger); }
    input, textarea {
      width: 100%;
      border: 1px solid var(--border);
      border-radius: 8px;
      padding: 0.6rem;
      font-family: ui-monospace, Menlo, Consolas, monospace;
      font-size: 0.9rem;
    }
    code, pre { font-family: ui-monospace, Menlo, Consolas, monospace; font-size: 0.88rem; }
    pre {
      margin: 0;
      white-space: pre-wrap;
      background: #f6f8fa;
      border: 1px solid var(--border);
      border-radius: 8px;
      padding: 0.8rem;
      max-height: 420px;
      overflow: auto;
    }
    .ok { color: #0f7a4c; font-weight: 600; }
    .bad { color: var(--danger); font-weight: 600; }
  </style>
</head>
<body>
  <div class="wrap">
"#;

const PAGE_TAIL: &str = "  </div>\n</body>\n</html>";

const INDEX_SCRIPT: &str = r#"<script>
  const output = document.getElementById('output');
  function show(data) {
    output.textContent = typeof data === 'string' ? data : JSON.stringify(data, null, 2);
  }
  async function get(url) {
    try {
      const r = await fetch(url);
      show(await r.json());
    } catch (e) {
      show(String(e));
    }
  }
  async function post(url, body) {
    try {
      const r = await fetch(url, {
        method: 'POST',
        headers: {'Content-Type': 'application/json'},
        body: body ? JSON.stringify(body) : undefined
      });
      show(await r.json());
    } catch (e) {
      show(String(e));
    }
  }
  async function testRequest() {
    const path = document.getElementById('path').value;
    const raw = document.getElementById('params').value || '{}';
    let params;
    try {
      params = JSON.parse(raw);
    } catch {
      show({ok:false,error:'Params must be valid JSON.'});
      return;
    }
    await post('/api/test-request', { path, params });
  }
</script>"#;

fn page(content: &str) -> Html<String> {
    Html(format!("{PAGE_HEAD}{content}{PAGE_TAIL}"))
}

#[instrument(skip(state))]
pub(crate) async fn index(State(state): State<AppState>) -> Result<Html<String>, Error> {
    let health = state.store.health().await?;

    let status_text = if !health.has_token {
        r#"<span class="bad">No token saved yet.</span>"#
    } else if health.is_expired {
        r#"<span class="bad">Token exists, but expired.</span>"#
    } else {
        r#"<span class="ok">Token is healthy.</span>"#
    };

    let health_json = serde_json::to_string_pretty(&health)?;

    let content = format!(
        r#"<div class="card">
  <h1>Yahoo Fantasy Broker Setup</h1>
  <p>This page helps you connect your Yahoo app and test requests.</p>
</div>

<div class="card">
  <h2>1) OAuth Status</h2>
  <p>{status_text}</p>
  <pre>{health_json}</pre>
  <div class="row">
    <a class="button" href="/auth/start">Connect Yahoo Account</a>
    <button class="secondary" onclick="post('/api/refresh')">Refresh Token</button>
    <button class="danger" onclick="post('/api/clear')">Clear Token</button>
  </div>
</div>

<div class="card">
  <h2>2) Diagnostics</h2>
  <p>Checks token + live API call to <code>/users;use_login=1/games</code>.</p>
  <div class="row">
    <button onclick="get('/api/diagnostics')">Run Diagnostics</button>
  </div>
</div>

<div class="card">
  <h2>3) Test Any Endpoint</h2>
  <p>Use a path like <code>/league/423.l.12345/standings</code></p>
  <label>Path</label>
  <input id="path" value="/users;use_login=1/games" />
  <label style="margin-top:0.6rem;display:block;">Optional JSON query params</label>
  <textarea id="params" rows="5">{{}}</textarea>
  <div class="row">
    <button onclick="testRequest()">Send Request</button>
  </div>
</div>

<div class="card">
  <h2>Result</h2>
  <pre id="output">No request sent yet.</pre>
</div>
"#
    );

    Ok(page(&format!("{content}{INDEX_SCRIPT}")))
}

#[instrument(skip(state))]
pub(crate) async fn auth_start(State(state): State<AppState>) -> Result<Redirect, Error> {
    let value = OauthClient::generate_state();
    state.pending_states.insert(value.clone()).await;

    let url = state.oauth.authorization_url(&value)?;

    Ok(Redirect::temporary(&url))
}

#[instrument(skip(state, params))]
pub(crate) async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.error {
        return (
            StatusCode::BAD_REQUEST,
            page(&format!(
                r#"<div class="card"><h2>Yahoo returned an error</h2><pre>{error}</pre></div>"#
            )),
        );
    }

    let code = match params.code.filter(|c| !c.is_empty()) {
        Some(code) => code,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                page(
                    r#"<div class="card"><h2>Missing code</h2><p>Callback did not include an OAuth code.</p></div>"#,
                ),
            );
        }
    };

    let known_state = match params.state {
        Some(value) => state.pending_states.consume(&value).await,
        None => false,
    };

    if !known_state {
        return (
            StatusCode::BAD_REQUEST,
            page(
                r#"<div class="card"><h2>State validation failed</h2><p>Start login again from this app.</p></div>"#,
            ),
        );
    }

    match exchange_and_store(&state, &code).await {
        Ok(summary) => (
            StatusCode::OK,
            page(&format!(
                r#"<div class="card">
  <h2>Success</h2>
  <p>Your Yahoo token has been saved.</p>
  <pre>{summary}</pre>
  <div class="row"><a class="button" href="/">Back to Setup Page</a></div>
</div>"#
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            page(&format!(
                r#"<div class="card">
  <h2>Token exchange failed</h2>
  <pre>{e}</pre>
  <p>Runtime redirect URI:</p>
  <pre>{}</pre>
  <p>This must exactly match the Yahoo app redirect URI and the URL used for the current login attempt.</p>
</div>"#,
                state.oauth.redirect_uri()
            )),
        ),
    }
}

async fn exchange_and_store(state: &AppState, code: &str) -> Result<String, Error> {
    let token = state.oauth.exchange_code(code).await?;
    state.store.set(&token).await?;

    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "expiresAt": epoch_ms_to_iso(token.expires_at),
        "scope": token.scope,
    }))?)
}
