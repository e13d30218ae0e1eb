use std::collections::HashMap;

use chrono::Utc;
use reqwest::header;
use serde_json::{Value, json};
use tracing::instrument;

use crate::core::error::Error;
use crate::core::oauth::OauthClient;
use crate::core::store::TokenStore;
use crate::types::token::TokenRecord;

const FANTASY_BASE_URL: &str = "https://fantasysports.yahooapis.com/fantasy/v2";

/// Tokens within this many milliseconds of expiry are refreshed before use.
const REFRESH_MARGIN_MS: i64 = 45_000;

pub(crate) const USER_GAMES_PATH: &str = "/users;use_login=1/games";

pub(crate) fn normalize_path(path: &str) -> Result<String, Error> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(Error::EmptyPath);
    }

    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

/// Pass-through client for the Yahoo Fantasy API. Ensures a usable token
/// before every downstream call, refreshing lazily when the stored one is
/// inside the expiry margin.
#[derive(Clone)]
pub(crate) struct FantasyClient {
    client: reqwest::Client,
    base_url: String,
    store: TokenStore,
    oauth: OauthClient,
}

impl std::fmt::Debug for FantasyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FantasyClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl FantasyClient {
    pub(crate) fn new(client: reqwest::Client, store: TokenStore, oauth: OauthClient) -> Self {
        Self {
            client,
            base_url: String::from(FANTASY_BASE_URL),
            store,
            oauth,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    /// Returns the stored token, refreshing and re-persisting it first when
    /// it is within the expiry margin. Concurrent callers may both refresh;
    /// the store's last whole-file write wins.
    #[instrument(skip_all)]
    pub(crate) async fn valid_token(&self) -> Result<TokenRecord, Error> {
        let token = self.store.get().await?.ok_or(Error::NoToken)?;

        if token.expires_at - Utc::now().timestamp_millis() >= REFRESH_MARGIN_MS {
            return Ok(token);
        }

        tracing::debug!("access token expiring, refreshing");

        let refreshed = self.oauth.refresh_token(&token.refresh_token).await?;
        self.store.set(&refreshed).await?;

        Ok(refreshed)
    }

    /// Unconditional refresh, for the explicit user-triggered path.
    #[instrument(skip_all)]
    pub(crate) async fn refresh(&self) -> Result<TokenRecord, Error> {
        let token = self.store.get().await?.ok_or(Error::NoToken)?;

        let refreshed = self.oauth.refresh_token(&token.refresh_token).await?;
        self.store.set(&refreshed).await?;

        Ok(refreshed)
    }

    #[instrument(skip(self, params))]
    pub(crate) async fn request(
        &self,
        path: &str,
        params: Option<HashMap<String, String>>,
    ) -> Result<Value, Error> {
        let path = normalize_path(path)?;
        let token = self.valid_token().await?;

        // format defaults to json; caller params may override it, last
        // assignment per key wins
        let mut query = HashMap::new();
        query.insert("format", "json");
        if let Some(params) = &params {
            for (key, value) in params {
                query.insert(key.as_str(), value.as_str());
            }
        }

        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&query)
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.access_token),
            )
            .send()
            .await?;

        let status = resp.status();
        let raw = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: raw,
            });
        }

        // Yahoo occasionally returns non-JSON bodies on success
        Ok(serde_json::from_str(&raw).unwrap_or_else(|_| json!({ "raw": raw })))
    }
}
