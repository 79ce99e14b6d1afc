//! Role-based authorization rules layered on top of the authentication gate

use taptosmile_shared::{AdminAccount, AdminId, AdminPatch, Role};

use crate::{
    audit::{self, auth_event, Severity},
    auth::AuthUser,
    error::{ApiError, ApiResult},
    store::{CredentialStore, StoreError},
};

/// Listing, viewing, updating and deleting other accounts
pub fn require_superadmin(user: &AuthUser) -> ApiResult<()> {
    if user.is_superadmin() {
        return Ok(());
    }
    deny(user, "Superadmin privileges required")
}

/// Any authenticated caller may create `admin` accounts; only a superadmin
/// may hand out `superadmin`.
pub fn authorize_role_grant(user: &AuthUser, requested: Role) -> ApiResult<()> {
    if requested.is_superadmin() && !user.is_superadmin() {
        return deny(user, "Only a superadmin can create superadmin accounts");
    }
    Ok(())
}

/// Accounts may never delete themselves
pub fn ensure_not_self(user: &AuthUser, target: AdminId) -> ApiResult<()> {
    if user.id() == target {
        return Err(ApiError::validation("You cannot delete your own account."));
    }
    Ok(())
}

/// A pending change to an existing account
#[derive(Debug, Clone, Copy)]
pub enum AccountChange<'a> {
    Update(&'a AdminPatch),
    Delete,
}

impl AccountChange<'_> {
    /// Whether `target` stops being an active superadmin after this change
    fn revokes_superadmin(&self, target: &AdminAccount) -> bool {
        if !target.is_active_superadmin() {
            return false;
        }
        match self {
            AccountChange::Delete => true,
            AccountChange::Update(patch) => patch.demotes_superadmin(),
        }
    }
}

/// Refuse changes that would leave no active superadmin.
///
/// Early answer for the handlers; the store repeats the check under its own
/// lock when the write happens.
pub async fn ensure_superadmin_remains(
    store: &dyn CredentialStore,
    target: &AdminAccount,
    change: AccountChange<'_>,
) -> ApiResult<()> {
    if !change.revokes_superadmin(target) {
        return Ok(());
    }
    if store.count_active_superadmins().await? <= 1 {
        return Err(StoreError::LastSuperadmin.into());
    }
    Ok(())
}

fn deny(user: &AuthUser, reason: &'static str) -> ApiResult<()> {
    audit::record(
        auth_event::ACCESS_DENIED,
        Severity::Warning,
        Some(user.email()),
        None,
    );
    Err(ApiError::Forbidden(reason))
}
