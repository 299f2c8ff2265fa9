use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WatchConfig {
    /// Control-plane basic-auth user.
    #[serde(default, alias = "user_name")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Root of the frp dashboard, e.g. `https://frp.example.com`.
    #[serde(default)]
    pub base_url: String,

    /// Host of the chat gateway.
    #[serde(default, alias = "napcat_server_addr")]
    pub gateway_address: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Reserved; the watcher only talks HTTP.
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
    /// Static bearer token for the send-message endpoint.
    #[serde(default)]
    pub http_token: Option<String>,
    #[serde(default = "default_webui_port")]
    pub webui_port: u16,
    /// When set, a WebUI login handshake runs before delivery.
    #[serde(default)]
    pub webui_token: Option<String>,

    /// Recipient of change notifications.
    #[serde(default)]
    pub notify_user_id: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_http_port() -> u16 { 3000 }
fn default_ws_port() -> u16 { 3001 }
fn default_webui_port() -> u16 { 6099 }
fn default_poll_interval() -> u64 { 15 }
fn default_request_timeout() -> u64 { 10_000 }

impl WatchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: WatchConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would run with undefined credentials or targets.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("username", &self.username),
            ("password", &self.password),
            ("base_url", &self.base_url),
            ("gateway_address", &self.gateway_address),
            ("notify_user_id", &self.notify_user_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(field));
            }
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: format!("expected an http(s) URL, got {:?}", self.base_url),
            });
        }
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_secs",
                reason: "must be at least 1".into(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_ms",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn status_url(&self) -> String {
        format!("{}/api/proxy/tcp", self.base_url.trim_end_matches('/'))
    }

    pub fn send_url(&self) -> String {
        format!("http://{}:{}/send_private_msg", self.gateway_address, self.http_port)
    }

    pub fn webui_base(&self) -> String {
        format!("http://{}:{}", self.gateway_address, self.webui_port)
    }
}
