//! Shared application state

use std::sync::Arc;

use crate::{
    auth::{JwtManager, RevocationList},
    config::Config,
    email::NotificationSender,
    email_check::MailDomainVerifier,
    store::CredentialStore,
};

/// Application state handed to every handler and to the auth middleware
///
/// All collaborators are injected at startup; tests swap in the in-memory
/// store and stub senders.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CredentialStore>,
    pub jwt: JwtManager,
    pub revocations: RevocationList,
    pub notifier: Arc<dyn NotificationSender>,
    pub mail_domains: Arc<dyn MailDomainVerifier>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn NotificationSender>,
        mail_domains: Arc<dyn MailDomainVerifier>,
    ) -> Self {
        let jwt = JwtManager::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            config.access_token_expire_minutes,
        );
        Self {
            config: Arc::new(config),
            store,
            jwt,
            revocations: RevocationList::new(),
            notifier,
            mail_domains,
        }
    }
}
