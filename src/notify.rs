//! Delivery of rendered messages to the OneBot HTTP gateway.

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::WatchConfig;
use crate::error::{AuthError, DeliveryError};
use crate::message::Message;

/// Somewhere a rendered message can be sent.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError>;
}

/// Hash the WebUI expects in place of the raw token.
pub fn login_hash(token: &str) -> String {
    hex::encode(Sha256::digest(format!("{token}.napcat").as_bytes()))
}

#[derive(Debug, Deserialize)]
struct GatewayReply<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "Credential")]
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginStatusData {
    #[serde(rename = "isLogin", default)]
    is_login: bool,
}

pub struct GatewayTransport {
    send_url: String,
    webui_base: String,
    webui_token: Option<String>,
    http_token: Option<String>,
    user_id: String,
    http_client: reqwest::Client,
    credential: RwLock<Option<String>>,
}

impl GatewayTransport {
    pub fn new(config: &WatchConfig, http_client: reqwest::Client) -> Self {
        Self {
            send_url: config.send_url(),
            webui_base: config.webui_base(),
            webui_token: config.webui_token.clone().filter(|t| !t.is_empty()),
            http_token: config.http_token.clone().filter(|t| !t.is_empty()),
            user_id: config.notify_user_id.clone(),
            http_client,
            credential: RwLock::new(None),
        }
    }

    pub fn requires_login(&self) -> bool {
        self.webui_token.is_some()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Exchange the WebUI token for a bearer credential and confirm the
    /// account behind the gateway is logged in. A no-op without a token.
    pub async fn login(&self) -> Result<(), AuthError> {
        let Some(token) = &self.webui_token else {
            return Ok(());
        };

        let response = self
            .http_client
            .post(format!("{}/api/auth/login", self.webui_base))
            .json(&serde_json::json!({ "hash": login_hash(token) }))
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(AuthError::Status(response.status().as_u16()));
        }
        let reply: GatewayReply<LoginData> = response.json().await?;
        let credential = reply
            .data
            .and_then(|d| d.credential)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredential)?;

        let response = self
            .http_client
            .post(format!("{}/api/QQLogin/CheckLoginStatus", self.webui_base))
            .bearer_auth(&credential)
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(AuthError::Status(response.status().as_u16()));
        }
        let reply: GatewayReply<LoginStatusData> = response.json().await?;
        if !reply.data.is_some_and(|d| d.is_login) {
            return Err(AuthError::NotLoggedIn);
        }

        *self.credential.write().await = Some(credential);
        info!("Gateway WebUI login successful");
        Ok(())
    }

    async fn bearer(&self) -> Option<String> {
        if let Some(token) = &self.http_token {
            return Some(token.clone());
        }
        if self.requires_login() && !self.is_authenticated().await {
            if let Err(e) = self.login().await {
                warn!("Gateway login failed, sending unauthenticated: {}", e);
            }
        }
        self.credential.read().await.clone()
    }
}

#[async_trait]
impl Transport for GatewayTransport {
    async fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        let body = serde_json::json!({
            "user_id": self.user_id,
            "message": message.render(),
        });

        let mut request = self.http_client.post(&self.send_url).json(&body);
        if let Some(bearer) = self.bearer().await {
            request = request.bearer_auth(bearer);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }
        let reply = response.text().await.unwrap_or_default();
        debug!("Gateway accepted message: {}", reply);
        Ok(())
    }
}
