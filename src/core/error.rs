use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No token found. Complete OAuth first.")]
    NoToken,
    #[error("Path is required.")]
    EmptyPath,
    #[error("`{0}` is required.")]
    MissingArgument(&'static str),
    #[error("`params` must be an object of scalar values.")]
    InvalidParams,
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Yahoo token request failed ({status}): {body}")]
    TokenEndpoint { status: u16, body: String },
    #[error("Yahoo API request failed ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Reqwest error: {0}")]
    HTTPClient(#[from] reqwest::Error),
    #[error("URL encoding error: {0}")]
    URLEncode(#[from] serde_urlencoded::ser::Error),
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!("{:?}", self);

        let status = match self {
            Error::NoToken => StatusCode::UNAUTHORIZED,
            Error::EmptyPath
            | Error::MissingArgument(_)
            | Error::InvalidParams
            | Error::UnknownTool(_) => StatusCode::BAD_REQUEST,
            Error::TokenEndpoint { .. } | Error::Api { .. } | Error::HTTPClient(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::URLEncode(_) | Error::IO(_) | Error::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "ok": false, "error": self.to_string() }));

        (status, body).into_response()
    }
}
