//! Shared helpers for unit tests inside the api crate.
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use taptosmile_shared::{AdminAccount, Role};

use crate::{
    auth::hash_password,
    config::{Config, LogFormat},
    email::{NotificationSender, NotifyError},
    email_check::AcceptAllMailDomains,
    state::AppState,
    store::InMemoryCredentialStore,
};

pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        public_url: "http://localhost:5173".to_string(),
        cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        database_url: "postgres://unused".to_string(),
        database_max_connections: 1,
        jwt_secret: "test-secret-key-must-be-at-least-32-characters".to_string(),
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

/// Captures every message instead of delivering it
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMessage>>,
    /// Fail this many sends before succeeding
    pub failures_before_success: Mutex<u32>,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl RecordingNotifier {
    pub fn failing(times: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_before_success: Mutex::new(times),
        }
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        {
            let mut remaining = self.failures_before_success.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(NotifyError::Transport("connection refused".to_string()));
            }
        }
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html.to_string(),
        });
        Ok(())
    }
}

pub fn test_state() -> AppState {
    test_state_with_notifier(Arc::new(RecordingNotifier::default()))
}

pub fn test_state_with_notifier(notifier: Arc<dyn NotificationSender>) -> AppState {
    AppState::new(
        test_config(),
        Arc::new(InMemoryCredentialStore::new()),
        notifier,
        Arc::new(AcceptAllMailDomains),
    )
}

/// Insert an active account directly into the store
pub async fn seed_account(
    state: &AppState,
    email: &str,
    password: &str,
    role: Role,
) -> AdminAccount {
    let account = AdminAccount::new(email, hash_password(password).unwrap(), role);
    state.store.insert(account.clone()).await.unwrap();
    account
}
