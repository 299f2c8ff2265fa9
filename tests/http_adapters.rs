//! The reqwest-backed source and transport against fake axum servers.

mod common;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use common::{client, config_for, serve};
use frp_watch::error::{AuthError, DeliveryError, FetchError};
use frp_watch::message::{Message, Segment};
use frp_watch::models::EndpointStatus;
use frp_watch::notify::{login_hash, GatewayTransport, Transport};
use frp_watch::source::{FrpStatusSource, StatusSource};

const BASIC: &str = "Basic YWRtaW46aHVudGVyMg==";

fn auth_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

// ---- Control plane ----

async fn proxies(headers: HeaderMap) -> (StatusCode, String) {
    if auth_of(&headers).as_deref() != Some(BASIC) {
        return (StatusCode::UNAUTHORIZED, String::new());
    }
    let body = json!({
        "proxies": [
            { "name": "ssh", "type": "tcp", "status": "online", "last_start": "10-19 08:00:00", "last_close": "" },
            { "name": "web", "type": "tcp", "status": "offline" }
        ]
    });
    (StatusCode::OK, body.to_string())
}

#[tokio::test]
async fn fetch_reads_proxies_with_basic_auth() {
    let port = serve(Router::new().route("/api/proxy/tcp", get(proxies))).await;
    let config = config_for(port, None);
    let source = FrpStatusSource::new(&config, client(&config));

    let snapshot = source.fetch().await.unwrap();
    assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["ssh", "web"]);
    assert_eq!(snapshot.get("ssh").unwrap().last_start, "10-19 08:00:00");
    assert_eq!(snapshot.status_of("web"), Some(&EndpointStatus::Offline));
}

#[tokio::test]
async fn fetch_rejects_non_200() {
    let port = serve(Router::new().route("/api/proxy/tcp", get(proxies))).await;
    let mut config = config_for(port, None);
    config.password = "wrong".into();
    let source = FrpStatusSource::new(&config, client(&config));

    assert!(matches!(source.fetch().await, Err(FetchError::Status(401))));
}

#[tokio::test]
async fn fetch_rejects_malformed_json() {
    let app = Router::new().route("/api/proxy/tcp", get(|| async { "<html>login</html>" }));
    let port = serve(app).await;
    let config = config_for(port, None);
    let source = FrpStatusSource::new(&config, client(&config));

    assert!(matches!(source.fetch().await, Err(FetchError::Decode(_))));
}

#[tokio::test]
async fn fetch_reports_unreachable_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = config_for(port, None);
    let source = FrpStatusSource::new(&config, client(&config));
    assert!(matches!(source.fetch().await, Err(FetchError::Http(_))));
}

// ---- Gateway ----

#[derive(Debug, Clone)]
struct Sent {
    auth: Option<String>,
    body: Value,
}

type Outbox = Arc<Mutex<Vec<Sent>>>;

async fn login(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["hash"] == json!(login_hash("secret")) {
        Ok(Json(json!({ "code": 0, "data": { "Credential": "cred-1" } })))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn check_login(headers: HeaderMap) -> Json<Value> {
    let is_login = auth_of(&headers).as_deref() == Some("Bearer cred-1");
    Json(json!({ "code": 0, "data": { "isLogin": is_login } }))
}

async fn send(State(outbox): State<Outbox>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    outbox.lock().unwrap().push(Sent { auth: auth_of(&headers), body });
    Json(json!({ "status": "ok", "retcode": 0 }))
}

async fn gateway() -> (u16, Outbox) {
    let outbox = Outbox::default();
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/QQLogin/CheckLoginStatus", post(check_login))
        .route("/send_private_msg", post(send))
        .with_state(outbox.clone());
    (serve(app).await, outbox)
}

#[tokio::test]
async fn login_then_deliver_uses_bearer_and_onebot_body() {
    let (port, outbox) = gateway().await;
    let config = config_for(port, Some("secret"));
    let transport = GatewayTransport::new(&config, client(&config));

    transport.login().await.unwrap();
    assert!(transport.is_authenticated().await);

    let message = Message::new([Segment::text("p1: online -> offline")]);
    transport.deliver(&message).await.unwrap();

    let sent = outbox.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].auth.as_deref(), Some("Bearer cred-1"));
    assert_eq!(
        sent[0].body,
        json!({
            "user_id": "10001",
            "message": [{ "type": "text", "data": { "text": "p1: online -> offline" } }]
        })
    );
}

#[tokio::test]
async fn deliver_logs_in_lazily() {
    let (port, outbox) = gateway().await;
    let config = config_for(port, Some("secret"));
    let transport = GatewayTransport::new(&config, client(&config));

    transport.deliver(&Message::new([Segment::text("hi")])).await.unwrap();
    assert_eq!(outbox.lock().unwrap()[0].auth.as_deref(), Some("Bearer cred-1"));
}

#[tokio::test]
async fn failed_login_falls_back_to_unauthenticated_delivery() {
    let (port, outbox) = gateway().await;
    let config = config_for(port, Some("not-the-secret"));
    let transport = GatewayTransport::new(&config, client(&config));

    assert!(matches!(transport.login().await, Err(AuthError::Status(401))));
    transport.deliver(&Message::new([Segment::text("hi")])).await.unwrap();

    let sent = outbox.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].auth, None);
}

#[tokio::test]
async fn static_http_token_is_preferred() {
    let (port, outbox) = gateway().await;
    let mut config = config_for(port, None);
    config.http_token = Some("onebot-token".into());
    let transport = GatewayTransport::new(&config, client(&config));

    transport.deliver(&Message::new([Segment::text("hi")])).await.unwrap();
    assert_eq!(outbox.lock().unwrap()[0].auth.as_deref(), Some("Bearer onebot-token"));
}

#[tokio::test]
async fn gateway_error_is_a_delivery_error() {
    let app = Router::new().route("/send_private_msg", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let port = serve(app).await;
    let config = config_for(port, None);
    let transport = GatewayTransport::new(&config, client(&config));

    let result = transport.deliver(&Message::new([Segment::text("hi")])).await;
    assert!(matches!(result, Err(DeliveryError::Status(500))));
}
