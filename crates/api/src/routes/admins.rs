//! Admin account management routes
//!
//! Every handler here sits behind `require_auth`; role checks happen inside
//! the handlers.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use taptosmile_shared::{AdminId, AdminPatch, Role};

use crate::{
    accounts::{create_account, validate_new_email, AdminResponse, NewAccount},
    audit::{self, admin_event, Severity},
    auth::{
        authorize_role_grant, ensure_not_self, ensure_superadmin_remains, hash_password,
        require_superadmin, validate_password, AccountChange, AuthUser,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::auth::MessageResponse;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    /// Defaults to `admin`
    pub role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdminRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

fn parse_id(raw: &str) -> ApiResult<AdminId> {
    raw.parse().map_err(|_| ApiError::validation("Invalid ID"))
}

fn parse_role(raw: &str) -> ApiResult<Role> {
    raw.parse::<Role>()
        .map_err(|e| ApiError::validation(e.to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// List all admin accounts (superadmin only)
pub async fn list_admins(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<AdminResponse>>> {
    require_superadmin(&user)?;

    let admins = state.store.list_all().await?;
    Ok(Json(admins.into_iter().map(AdminResponse::from).collect()))
}

/// View one admin account (superadmin only)
pub async fn get_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(admin_id): Path<String>,
) -> ApiResult<Json<AdminResponse>> {
    require_superadmin(&user)?;
    let id = parse_id(&admin_id)?;

    let account = state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(account.into()))
}

/// Create an admin account.
///
/// Any authenticated caller may create `admin` accounts; `superadmin`
/// accounts require a superadmin caller.
pub async fn register(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateAdminRequest>,
) -> ApiResult<Json<AdminResponse>> {
    let role = match req.role.as_deref() {
        Some(raw) => parse_role(raw)?,
        None => Role::default(),
    };
    authorize_role_grant(&user, role)?;

    let account = create_account(
        state.store.as_ref(),
        state.mail_domains.as_ref(),
        NewAccount {
            email: req.email,
            password: req.password,
            role,
        },
    )
    .await?;

    tracing::info!(admin_id = %account.id, role = %account.role, "Admin account created");
    audit::record(
        admin_event::ADMIN_CREATED,
        Severity::Info,
        Some(user.email()),
        Some(&account.email),
    );

    Ok(Json(account.into()))
}

/// Partially update an admin account (superadmin only).
///
/// Only supplied fields change. Serves both PUT and PATCH.
pub async fn update_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(admin_id): Path<String>,
    Json(req): Json<UpdateAdminRequest>,
) -> ApiResult<Json<AdminResponse>> {
    require_superadmin(&user)?;
    let id = parse_id(&admin_id)?;

    let role = req.role.as_deref().map(parse_role).transpose()?;
    if let Some(password) = &req.password {
        validate_password(password).map_err(|e| ApiError::validation(e.to_string()))?;
    }

    let mut patch = AdminPatch {
        email: req.email,
        password_hash: None,
        role,
        is_active: req.is_active,
    };
    if patch.is_empty() && req.password.is_none() {
        return Err(ApiError::validation("No fields to update"));
    }

    let target = state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)?;

    if let Some(email) = &patch.email {
        if email != &target.email {
            validate_new_email(state.mail_domains.as_ref(), email).await?;
            if state.store.find_by_email(email).await?.is_some() {
                return Err(ApiError::EmailAlreadyExists);
            }
        }
    }

    ensure_superadmin_remains(state.store.as_ref(), &target, AccountChange::Update(&patch))
        .await?;

    if let Some(password) = &req.password {
        patch.password_hash = Some(hash_password(password)?);
    }

    let updated = state.store.update(id, patch).await?.ok_or(ApiError::NotFound)?;

    audit::record(
        admin_event::ADMIN_UPDATED,
        Severity::Info,
        Some(user.email()),
        Some(&updated.email),
    );

    Ok(Json(updated.into()))
}

/// Delete an admin account (superadmin only, never oneself)
pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(admin_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require_superadmin(&user)?;
    let id = parse_id(&admin_id)?;
    ensure_not_self(&user, id)?;

    let target = state.store.find_by_id(id).await?.ok_or(ApiError::NotFound)?;
    ensure_superadmin_remains(state.store.as_ref(), &target, AccountChange::Delete).await?;

    if state.store.delete(id).await? == 0 {
        return Err(ApiError::NotFound);
    }

    tracing::info!(admin_id = %id, "Admin account deleted");
    audit::record(
        admin_event::ADMIN_DELETED,
        Severity::Warning,
        Some(user.email()),
        Some(&target.email),
    );

    Ok(MessageResponse::new("Admin deleted successfully"))
}
