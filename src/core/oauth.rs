use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{SecondsFormat, Utc};
use reqwest::header;
use tracing::instrument;

use crate::core::config::Args;
use crate::core::error::Error;
use crate::types::token::{TokenRecord, TokenResponse};

const AUTH_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
const TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";

/// Client for Yahoo's OAuth2 endpoints. Holds no token state; callers
/// persist whatever it returns.
#[derive(Clone)]
pub(crate) struct OauthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
    token_url: String,
}

impl std::fmt::Debug for OauthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OauthClient")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

impl OauthClient {
    pub(crate) fn new(client: reqwest::Client, config: &Args) -> Self {
        Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            token_url: String::from(TOKEN_URL),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_token_url(mut self, url: &str) -> Self {
        self.token_url = url.to_string();
        self
    }

    pub(crate) fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// 16 random bytes, hex-encoded. Opaque comparison key only.
    pub(crate) fn generate_state() -> String {
        let bytes: [u8; 16] = rand::random();
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    pub(crate) fn authorization_url(&self, state: &str) -> Result<String, Error> {
        let query = serde_urlencoded::to_string([
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", self.scope.as_str()),
            ("state", state),
        ])?;

        Ok(format!("{AUTH_URL}?{query}"))
    }

    #[instrument(skip_all)]
    pub(crate) async fn exchange_code(&self, code: &str) -> Result<TokenRecord, Error> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("redirect_uri", &self.redirect_uri),
            ("code", code),
        ])
        .await
    }

    #[instrument(skip_all)]
    pub(crate) async fn refresh_token(&self, refresh_token: &str) -> Result<TokenRecord, Error> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("redirect_uri", &self.redirect_uri),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenRecord, Error> {
        let resp = self
            .client
            .post(&self.token_url)
            .header(header::AUTHORIZATION, self.basic_auth())
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;

        if !status.is_success() {
            return Err(Error::TokenEndpoint {
                status: status.as_u16(),
                body: raw,
            });
        }

        Ok(normalize(serde_json::from_str(&raw)?))
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(credentials))
    }
}

fn normalize(resp: TokenResponse) -> TokenRecord {
    let now = Utc::now();

    TokenRecord {
        access_token: resp.access_token,
        refresh_token: resp.refresh_token,
        expires_at: now.timestamp_millis() + resp.expires_in * 1000,
        token_type: resp.token_type,
        scope: resp.scope,
        obtained_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OauthClient {
        OauthClient::new(
            reqwest::Client::new(),
            &Args::for_tests("unused-tokens.json"),
        )
    }

    #[test]
    fn test_generate_state_shape() {
        let state = OauthClient::generate_state();

        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, OauthClient::generate_state());
    }

    #[test]
    fn test_authorization_url() {
        let url = client().authorization_url("feedface").unwrap();

        assert!(url.starts_with("https://api.login.yahoo.com/oauth2/request_auth?"));
        assert!(url.contains("client_id=test-client-id"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=fspt-r"));
        assert!(url.contains("state=feedface"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3476%2Fauth%2Fcallback"));
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(
            client().basic_auth(),
            // base64("test-client-id:test-client-secret")
            "Basic dGVzdC1jbGllbnQtaWQ6dGVzdC1jbGllbnQtc2VjcmV0"
        );
    }

    #[test]
    fn test_normalize_sets_expiry_from_now() {
        let before = Utc::now().timestamp_millis();
        let record = normalize(TokenResponse {
            access_token: String::from("A"),
            refresh_token: String::from("R"),
            expires_in: 3600,
            token_type: String::from("bearer"),
            scope: None,
        });
        let after = Utc::now().timestamp_millis();

        assert!(record.expires_at >= before + 3_600_000);
        assert!(record.expires_at <= after + 3_600_000);
        assert!(record.obtained_at.ends_with('Z'));
    }
}
