use async_trait::async_trait;
use tracing::debug;

use crate::config::WatchConfig;
use crate::error::FetchError;
use crate::models::{Snapshot, StatusPayload};

/// Somewhere a full snapshot of tunnel status can be fetched from.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot, FetchError>;
}

/// Reads TCP proxy status from the frp dashboard API using basic auth.
pub struct FrpStatusSource {
    url: String,
    username: String,
    password: String,
    http_client: reqwest::Client,
}

impl FrpStatusSource {
    pub fn new(config: &WatchConfig, http_client: reqwest::Client) -> Self {
        Self {
            url: config.status_url(),
            username: config.username.clone(),
            password: config.password.clone(),
            http_client,
        }
    }
}

#[async_trait]
impl StatusSource for FrpStatusSource {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let response = self
            .http_client
            .get(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: StatusPayload = serde_json::from_str(&body)?;
        let snapshot = Snapshot::from_payload(payload);
        debug!("Fetched {} proxies from {}", snapshot.len(), self.url);
        Ok(snapshot)
    }
}
