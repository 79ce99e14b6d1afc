//! Audit events for authentication and account management
//!
//! Events go to the `audit` tracing target so operators can route them
//! separately from request logs. Never pass passwords, hashes or tokens.

/// Authentication event names
pub mod auth_event {
    pub const LOGIN_SUCCESS: &str = "login_success";
    pub const LOGIN_FAILED: &str = "login_failed";
    pub const LOGOUT: &str = "logout";
    pub const PASSWORD_RESET_REQUESTED: &str = "password_reset_requested";
    pub const PASSWORD_CHANGED: &str = "password_changed";
    /// Authenticated caller refused by the role policy
    pub const ACCESS_DENIED: &str = "access_denied";
}

/// Account management event names
pub mod admin_event {
    pub const ADMIN_CREATED: &str = "admin_created";
    pub const ADMIN_UPDATED: &str = "admin_updated";
    pub const ADMIN_DELETED: &str = "admin_deleted";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// Emit one audit event
///
/// `actor` is who acted (if known), `subject` the account acted upon.
pub fn record(event: &str, severity: Severity, actor: Option<&str>, subject: Option<&str>) {
    match severity {
        Severity::Info => tracing::info!(
            target: "audit",
            event,
            actor = actor.unwrap_or("anonymous"),
            subject = subject.unwrap_or("-"),
            "audit event"
        ),
        Severity::Warning => tracing::warn!(
            target: "audit",
            event,
            actor = actor.unwrap_or("anonymous"),
            subject = subject.unwrap_or("-"),
            "audit event"
        ),
    }
}
