#![allow(dead_code)]

use axum::Router;
use frp_watch::config::WatchConfig;
use std::net::SocketAddr;

/// Serve `app` on an ephemeral localhost port and return that port.
pub async fn serve(app: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Config pointing both the control plane and the gateway at `port`.
pub fn config_for(port: u16, webui_token: Option<&str>) -> WatchConfig {
    let mut config = WatchConfig::from_json(&format!(
        r#"{{
            "username": "admin",
            "password": "hunter2",
            "base_url": "http://127.0.0.1:{port}",
            "gateway_address": "127.0.0.1",
            "http_port": {port},
            "webui_port": {port},
            "notify_user_id": "10001",
            "request_timeout_ms": 2000
        }}"#
    ))
    .unwrap();
    config.webui_token = webui_token.map(String::from);
    config
}

pub fn client(config: &WatchConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .unwrap()
}
