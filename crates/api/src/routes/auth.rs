//! Authentication routes: login, logout, profile, password management

use axum::{
    extract::{Extension, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use taptosmile_shared::AdminPatch;

use crate::{
    accounts::AdminResponse,
    audit::{self, auth_event, Severity},
    auth::{
        clear_session_cookie, extract_token, hash_password, reset_forgotten_password,
        session_cookie, validate_password, verify_against_dummy, verify_password, AuthUser,
        RESET_RESPONSE_MESSAGE,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

// =============================================================================
// Request/Response Types
// =============================================================================

/// OAuth2-style password grant; `username` carries the email
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Exchange email and password for an access token.
///
/// The token is returned in the body and set as the session cookie. Unknown
/// emails and wrong passwords produce the same error.
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> ApiResult<([(HeaderName, HeaderValue); 1], Json<TokenResponse>)> {
    let account = state.store.find_by_email(&form.username).await?;

    let password_ok = match &account {
        Some(account) => verify_password(&form.password, &account.password_hash).unwrap_or_else(
            |e| {
                tracing::error!(admin_id = %account.id, error = %e, "Stored password hash is unreadable");
                false
            },
        ),
        None => {
            verify_against_dummy(&form.password);
            false
        }
    };

    let account = match account {
        Some(account) if password_ok => account,
        _ => {
            audit::record(auth_event::LOGIN_FAILED, Severity::Warning, None, None);
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !account.is_active {
        audit::record(
            auth_event::LOGIN_FAILED,
            Severity::Warning,
            Some(&account.email),
            None,
        );
        return Err(ApiError::Forbidden("Account disabled"));
    }

    let issued = state.jwt.issue(&account.email, account.role)?;
    let cookie = session_cookie(
        &issued.token,
        state.jwt.ttl_seconds(),
        state.config.session_cookie_secure,
    )
    .ok_or(ApiError::Internal)?;

    audit::record(
        auth_event::LOGIN_SUCCESS,
        Severity::Info,
        Some(&account.email),
        None,
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token: issued.token,
            token_type: "bearer",
        }),
    ))
}

/// Clear the session cookie and deny-list the presented token, if any.
///
/// Always succeeds, with or without a valid token.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ([(HeaderName, HeaderValue); 1], Json<MessageResponse>) {
    if let Some(claims) = extract_token(&headers).and_then(|t| state.jwt.validate(&t).ok()) {
        state.revocations.revoke(&claims.jti, claims.exp).await;
        audit::record(auth_event::LOGOUT, Severity::Info, Some(&claims.sub), None);
    }

    (
        [(SET_COOKIE, clear_session_cookie(state.config.session_cookie_secure))],
        MessageResponse::new("Logged out successfully"),
    )
}

/// Profile of the calling account
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AdminResponse> {
    Json(user.account.into())
}

/// Rotate a forgotten password. The answer never depends on the email.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Json<MessageResponse> {
    // Delivery runs detached; the handle is only useful to tests
    let _ = reset_forgotten_password(&state, &req.email).await;
    MessageResponse::new(RESET_RESPONSE_MESSAGE)
}

/// Change the caller's own password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let valid = verify_password(&req.current_password, &user.account.password_hash)?;
    if !valid {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    validate_password(&req.new_password).map_err(|e| ApiError::validation(e.to_string()))?;

    let patch = AdminPatch {
        password_hash: Some(hash_password(&req.new_password)?),
        ..Default::default()
    };
    state
        .store
        .update(user.id(), patch)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    audit::record(
        auth_event::PASSWORD_CHANGED,
        Severity::Warning,
        Some(user.email()),
        Some(user.email()),
    );

    Ok(MessageResponse::new("Password changed successfully."))
}
