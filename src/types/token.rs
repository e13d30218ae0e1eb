use serde::{Deserialize, Serialize};

/// The single persisted credential. Serialized camelCase to keep the
/// on-disk token file readable alongside other Yahoo tooling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRecord {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
    /// Absolute expiry instant, epoch milliseconds.
    pub(crate) expires_at: i64,
    pub(crate) token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) scope: Option<String>,
    /// Issuance timestamp, ISO-8601. Informational only.
    pub(crate) obtained_at: String,
}

/// Derived view of the stored token, computed fresh on every request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenHealth {
    pub(crate) has_token: bool,
    pub(crate) is_expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_at_iso: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seconds_remaining: Option<i64>,
}

/// Wire shape of the Yahoo token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
    /// Validity window in seconds from now.
    pub(crate) expires_in: i64,
    pub(crate) token_type: String,
    pub(crate) scope: Option<String>,
}
