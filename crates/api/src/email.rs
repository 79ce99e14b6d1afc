//! Outbound email notifications
//!
//! Sends transactional emails via the Resend API. The password-reset flow is
//! the only consumer inside the authentication core.

use async_trait::async_trait;

use crate::config::Config;

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key; empty disables delivery
    pub resend_api_key: String,
    /// Resend API base URL
    pub api_url: String,
    /// From address for emails
    pub email_from: String,
    /// App name for branding
    pub app_name: String,
    /// Admin panel URL linked from emails
    pub admin_url: String,
}

impl EmailConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            resend_api_key: config.resend_api_key.clone(),
            api_url: config.resend_api_url.trim_end_matches('/').to_string(),
            email_from: config.email_from.clone(),
            app_name: config.app_name.clone(),
            admin_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }
}

/// Delivery contract consumed by the core: `send(to, subject, body)`
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Email delivery is not configured")]
    Disabled,
    #[error("Email provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Email transport error: {0}")]
    Transport(String),
}

impl NotifyError {
    /// Whether another attempt could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            NotifyError::Disabled => false,
            NotifyError::Rejected { status, .. } => *status == 429 || *status >= 500,
            NotifyError::Transport(_) => true,
        }
    }
}

/// Notification sender backed by the Resend HTTP API
#[derive(Clone)]
pub struct ResendNotifier {
    config: EmailConfig,
    client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationSender for ResendNotifier {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), NotifyError> {
        if !self.config.is_enabled() {
            tracing::warn!(subject = %subject, "Email not configured, skipping");
            return Err(NotifyError::Disabled);
        }

        let body = serde_json::json!({
            "from": self.config.email_from,
            "to": [to],
            "subject": subject,
            "html": html
        });

        let response = self
            .client
            .post(format!("{}/emails", self.config.api_url))
            .bearer_auth(&self.config.resend_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(subject = %subject, "Email sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Subject and HTML body of the temporary-password email
pub fn password_reset_message(config: &EmailConfig, temp_password: &str) -> (String, String) {
    let login_link = format!("{}/admin/login", config.admin_url);

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #D4AF37;">Password Reset</h2>
    <p>Hello,</p>
    <p>A password reset was requested for your {app_name} admin account. Your password has been replaced with the temporary password below.</p>
    <div style="background-color: #f9f9f9; border-left: 4px solid #D4AF37; padding: 16px; margin: 20px 0;">
        <p style="margin: 0;">Temporary password:</p>
        <p style="margin: 8px 0 0 0; font-family: monospace; font-size: 18px;"><strong>{temp_password}</strong></p>
    </div>
    <p>
        <a href="{login_link}" style="display: inline-block; padding: 12px 24px; background-color: #D4AF37; color: white; text-decoration: none; border-radius: 6px; font-weight: bold;">
            Log in to the Admin Panel
        </a>
    </p>
    <p style="color: #dc2626; font-size: 14px;">
        Change this password after logging in. If you did not request a reset, contact another administrator immediately.
    </p>
    <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
    <p style="color: #999; font-size: 12px;">{app_name}</p>
</body>
</html>"#,
        app_name = config.app_name,
        temp_password = temp_password,
        login_link = login_link,
    );

    (format!("Password Reset - {}", config.app_name), html)
}
