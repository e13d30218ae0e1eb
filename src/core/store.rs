use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::Utc;
use tracing::instrument;

use crate::core::error::Error;
use crate::types::token::{TokenHealth, TokenRecord};
use crate::utils::time::epoch_ms_to_iso;

/// File-backed store holding at most one token record. The file is the
/// source of truth; nothing is cached across requests.
#[derive(Clone, Debug)]
pub(crate) struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) async fn get(&self) -> Result<Option<TokenRecord>, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::IO(e)),
        }
    }

    #[instrument(skip_all)]
    pub(crate) async fn set(&self, record: &TokenRecord) -> Result<(), Error> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        tokio::fs::write(&self.path, serde_json::to_vec_pretty(record)?).await?;

        Ok(())
    }

    #[instrument(skip_all)]
    pub(crate) async fn clear(&self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::IO(e)),
        }
    }

    pub(crate) async fn health(&self) -> Result<TokenHealth, Error> {
        let token = match self.get().await? {
            Some(token) => token,
            None => {
                return Ok(TokenHealth {
                    has_token: false,
                    is_expired: true,
                    expires_at: None,
                    expires_at_iso: None,
                    seconds_remaining: None,
                });
            }
        };

        let now = Utc::now().timestamp_millis();

        Ok(TokenHealth {
            has_token: true,
            is_expired: token.expires_at <= now,
            expires_at: Some(token.expires_at),
            expires_at_iso: Some(epoch_ms_to_iso(token.expires_at)),
            seconds_remaining: Some((token.expires_at - now).div_euclid(1000)),
        })
    }
}
