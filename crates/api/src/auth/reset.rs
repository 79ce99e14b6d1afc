//! Forgotten-password flow
//!
//! The caller always receives the same generic answer. Whether the email
//! belonged to an account, and whether the temporary password reached its
//! inbox, is only visible in the logs.

use std::sync::Arc;
use std::time::Duration;

use taptosmile_shared::AdminPatch;
use tokio::task::JoinHandle;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;

use crate::{
    audit::{self, auth_event, Severity},
    auth::password::{generate_temporary_password, hash_password, verify_against_dummy},
    email::{password_reset_message, EmailConfig, NotificationSender, NotifyError},
    state::AppState,
};

/// Message returned for every forgot-password request
pub const RESET_RESPONSE_MESSAGE: &str =
    "If this email is registered, a new password has been sent.";

/// Delivery attempts before the email is dropped
pub const MAX_DELIVERY_ATTEMPTS: usize = 3;

/// Delays between attempts: 200ms, then 2s
const RETRY_BASE_MILLIS: u64 = 10;
const RETRY_FACTOR: u64 = 20;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// Replace the password of the account behind `email` with a random
/// temporary one and mail it out in the background.
///
/// Returns the handle of the delivery task when one was started. Unknown
/// emails and store failures end silently. Tokens issued before the reset
/// stay valid until they expire.
pub async fn reset_forgotten_password(state: &AppState, email: &str) -> Option<JoinHandle<()>> {
    let account = match state.store.find_by_email(email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            tracing::debug!("Password reset requested for unknown email");
            // Spend about as long as hashing the temporary password would
            verify_against_dummy(email);
            return None;
        }
        Err(e) => {
            tracing::error!(error = %e, "Password reset lookup failed");
            return None;
        }
    };

    let temp_password = generate_temporary_password();
    let password_hash = match hash_password(&temp_password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e, "Failed to hash temporary password");
            return None;
        }
    };

    let patch = AdminPatch {
        password_hash: Some(password_hash),
        ..Default::default()
    };
    match state.store.update(account.id, patch).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::warn!(admin_id = %account.id, "Account vanished during password reset");
            return None;
        }
        Err(e) => {
            tracing::error!(admin_id = %account.id, error = %e, "Failed to store temporary password");
            return None;
        }
    }

    audit::record(
        auth_event::PASSWORD_RESET_REQUESTED,
        Severity::Info,
        None,
        Some(&account.email),
    );

    let (subject, body) =
        password_reset_message(&EmailConfig::from_config(&state.config), &temp_password);
    let notifier = state.notifier.clone();
    let admin_id = account.id;

    // Mail latency must not hold up the response
    Some(tokio::spawn(async move {
        match deliver_with_retry(notifier, &account.email, &subject, &body).await {
            Ok(()) => tracing::info!(admin_id = %admin_id, "Temporary password delivered"),
            Err(e) => tracing::error!(
                admin_id = %admin_id,
                error = %e,
                "Giving up on temporary password delivery"
            ),
        }
    }))
}

/// Send one message, retrying transient failures up to
/// `MAX_DELIVERY_ATTEMPTS` attempts in total
pub async fn deliver_with_retry(
    notifier: Arc<dyn NotificationSender>,
    to: &str,
    subject: &str,
    body: &str,
) -> Result<(), NotifyError> {
    let retry_strategy = ExponentialBackoff::from_millis(RETRY_BASE_MILLIS)
        .factor(RETRY_FACTOR)
        .max_delay(RETRY_MAX_DELAY)
        .take(MAX_DELIVERY_ATTEMPTS - 1)
        .map(jitter);

    Retry::spawn(retry_strategy, || async {
        let result = notifier.send(to, subject, body).await;
        match &result {
            Ok(()) => Ok(result),
            Err(e) if e.is_transient() => {
                tracing::debug!(error = %e, "Transient delivery error - will retry");
                Err(result)
            }
            // Wrapped in Ok to stop retrying
            Err(_) => Ok(result),
        }
    })
    .await
    .unwrap_or_else(|e| e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::test_helpers::{seed_account, test_state_with_notifier, RecordingNotifier};
    use taptosmile_shared::Role;

    #[tokio::test]
    async fn test_reset_rotates_password_and_mails_it() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = test_state_with_notifier(notifier.clone());
        seed_account(&state, "a@x.org", "pw123456", Role::Admin).await;

        let delivery = reset_forgotten_password(&state, "a@x.org").await.unwrap();
        delivery.await.unwrap();

        let messages = notifier.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "a@x.org");
        assert_eq!(messages[0].subject, "Password Reset - Tap To Smile");
        assert!(messages[0].body.contains("http://localhost:5173/admin/login"));

        let stored = state.store.find_by_email("a@x.org").await.unwrap().unwrap();
        assert!(!verify_password("pw123456", &stored.password_hash).unwrap());

        // The mailed password is the one now stored
        let mailed = messages[0]
            .body
            .split("<strong>")
            .nth(1)
            .and_then(|s| s.split("</strong>").next())
            .unwrap();
        assert_eq!(mailed.len(), 16);
        assert!(verify_password(mailed, &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_unknown_email_has_no_side_effects() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = test_state_with_notifier(notifier.clone());
        seed_account(&state, "a@x.org", "pw123456", Role::Admin).await;

        assert!(reset_forgotten_password(&state, "nobody@x.org").await.is_none());
        // Lookup is case-sensitive
        assert!(reset_forgotten_password(&state, "A@x.org").await.is_none());
        assert!(notifier.messages().is_empty());

        let stored = state.store.find_by_email("a@x.org").await.unwrap().unwrap();
        assert!(verify_password("pw123456", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_new_password() {
        let notifier = Arc::new(RecordingNotifier::failing(u32::MAX));
        let state = test_state_with_notifier(notifier.clone());
        seed_account(&state, "a@x.org", "pw123456", Role::Admin).await;

        let delivery = reset_forgotten_password(&state, "a@x.org").await.unwrap();
        delivery.await.unwrap();

        assert!(notifier.messages().is_empty());
        let stored = state.store.find_by_email("a@x.org").await.unwrap().unwrap();
        assert!(!verify_password("pw123456", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let notifier = Arc::new(RecordingNotifier::failing(1));
        deliver_with_retry(notifier.clone(), "a@x.org", "s", "b")
            .await
            .unwrap();
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let notifier = Arc::new(RecordingNotifier::failing(MAX_DELIVERY_ATTEMPTS as u32));
        let err = deliver_with_retry(notifier.clone(), "a@x.org", "s", "b")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
        assert!(notifier.messages().is_empty());
        // The sender was called exactly MAX_DELIVERY_ATTEMPTS times
        assert_eq!(*notifier.failures_before_success.lock().unwrap(), 0);
    }
}
