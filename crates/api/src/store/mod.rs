//! Credential store: persisted admin and superadmin accounts
//!
//! Email uniqueness is checked by callers before insert (query-before-insert)
//! and enforced again by the backend, which reports `StoreError::Duplicate`.
//! The same holds for the last active superadmin: `update` and `delete`
//! refuse, atomically with the write, to remove the final one
//! (`StoreError::LastSuperadmin`).

use async_trait::async_trait;
use taptosmile_shared::{AdminAccount, AdminId, AdminPatch};

mod memory;
mod postgres;

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Persistence contract for admin accounts.
///
/// Email comparison is case-sensitive.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AdminAccount>, StoreError>;

    async fn find_by_id(&self, id: AdminId) -> Result<Option<AdminAccount>, StoreError>;

    /// Persist a new account and return its id
    async fn insert(&self, account: AdminAccount) -> Result<AdminId, StoreError>;

    /// Apply a partial update. Returns the updated account, or `None` if no
    /// account has this id. Fails with `LastSuperadmin` rather than demote or
    /// deactivate the only active superadmin.
    async fn update(&self, id: AdminId, patch: AdminPatch)
        -> Result<Option<AdminAccount>, StoreError>;

    /// Delete an account, returning the number of rows removed. Fails with
    /// `LastSuperadmin` rather than remove the only active superadmin.
    async fn delete(&self, id: AdminId) -> Result<u64, StoreError>;

    /// All accounts, oldest first
    async fn list_all(&self) -> Result<Vec<AdminAccount>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;

    async fn count_active_superadmins(&self) -> Result<u64, StoreError>;

    /// Cheap reachability probe used by readiness checks
    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Email already registered")]
    Duplicate,
    #[error("At least one active superadmin must remain")]
    LastSuperadmin,
    #[error("Storage backend error: {0}")]
    Backend(String),
}
