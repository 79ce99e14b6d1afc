//! Shared fixtures for router-level tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, Response, StatusCode},
    Router,
};
use jsonwebtoken::Algorithm;
use serde_json::Value;
use taptosmile_api::{
    auth::hash_password,
    config::{Config, LogFormat},
    create_router,
    email::{NotificationSender, NotifyError},
    email_check::AcceptAllMailDomains,
    store::InMemoryCredentialStore,
    AppState,
};
use taptosmile_shared::{AdminAccount, Role};
use tower::ServiceExt;

pub const PASSWORD: &str = "pw123456";

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        public_url: "http://localhost:5173".to_string(),
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: "integration-secret-key-at-least-32-characters".to_string(),
        jwt_algorithm: Algorithm::HS256,
        access_token_expire_minutes: 60,
        session_cookie_secure: false,
        check_email_deliverability: false,
        resend_api_key: String::new(),
        resend_api_url: "http://127.0.0.1:9".to_string(),
        email_from: "Tap To Smile <noreply@localhost>".to_string(),
        app_name: "Tap To Smile".to_string(),
        log_format: LogFormat::Pretty,
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    /// (to, subject, body) of every message sent so far
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait for the background delivery task
    pub async fn wait_for(&self, count: usize) -> Vec<(String, String, String)> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    pub fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            test_config(),
            Arc::new(InMemoryCredentialStore::new()),
            notifier.clone(),
            Arc::new(AcceptAllMailDomains),
        );
        let router = create_router(state.clone());
        Self {
            state,
            router,
            notifier,
        }
    }

    pub async fn seed(&self, email: &str, role: Role) -> AdminAccount {
        let account = AdminAccount::new(email, hash_password(PASSWORD).unwrap(), role);
        self.state.store.insert(account.clone()).await.unwrap();
        account
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        let body = format!(
            "username={}&password={}",
            email.replace('@', "%40"),
            password
        );
        self.send(
            Request::builder()
                .method("POST")
                .uri("/api/admin/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Log in and return the bearer token
    pub async fn token(&self, email: &str) -> String {
        let response = self.login(email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string()
    }
}

pub fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn public_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
