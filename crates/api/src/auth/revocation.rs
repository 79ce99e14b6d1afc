//! Deny-list of logged-out token ids
//!
//! Entries live until the token's own expiry (plus validation leeway),
//! after which the expiry check rejects the token anyway. The list is
//! process-local: a restart forgets it.

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Matches the clock-skew leeway applied by `JwtManager::validate`
const EXPIRY_LEEWAY_SECS: i64 = 60;

#[derive(Clone, Default)]
pub struct RevocationList {
    entries: Arc<RwLock<HashMap<String, i64>>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny `jti` until `expires_at` (unix seconds)
    pub async fn revoke(&self, jti: &str, expires_at: i64) {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let mut entries = self.entries.write().await;
        entries.retain(|_, keep_until| *keep_until > now);
        let keep_until = expires_at + EXPIRY_LEEWAY_SECS;
        if keep_until > now {
            entries.insert(jti.to_string(), keep_until);
        }
    }

    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.entries.read().await.contains_key(jti)
    }
}
