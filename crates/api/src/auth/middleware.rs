//! Authentication middleware

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use taptosmile_shared::{AdminAccount, AdminId, Role};

use crate::{
    auth::session::extract_token,
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Authenticated caller attached to the request by `require_auth`
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Account as loaded from the store on this request
    pub account: AdminAccount,
    /// Role carried by the token, used for policy decisions
    pub role: Role,
}

impl AuthUser {
    pub fn id(&self) -> AdminId {
        self.account.id
    }

    pub fn email(&self) -> &str {
        &self.account.email
    }

    pub fn is_superadmin(&self) -> bool {
        self.role.is_superadmin()
    }
}

/// Resolve the caller behind a request.
///
/// Terminal outcomes, in order:
/// 1. no token in header or cookie: `Unauthenticated`
/// 2. bad signature, malformed or expired token: `Unauthenticated`
/// 3. token revoked by logout, or no account for its subject: `Unauthenticated`
/// 4. account deactivated: `Forbidden`
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<AuthUser> {
    let token = extract_token(headers).ok_or(ApiError::Unauthenticated)?;

    let claims = state.jwt.validate(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        ApiError::Unauthenticated
    })?;

    if state.revocations.is_revoked(&claims.jti).await {
        tracing::debug!(jti = %claims.jti, "Rejected revoked access token");
        return Err(ApiError::Unauthenticated);
    }

    // A still-valid token for a deleted account must not grant access
    let account = state
        .store
        .find_by_email(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !account.is_active {
        return Err(ApiError::Forbidden("Account disabled"));
    }

    Ok(AuthUser {
        account,
        role: claims.role,
    })
}

/// Gate for protected routes: authenticates and inserts `AuthUser` as a
/// request extension
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state, request.headers()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{seed_account, test_state};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use taptosmile_shared::AdminPatch;
    use tower::ServiceExt;

    async fn whoami(Extension(user): Extension<AuthUser>) -> String {
        format!("{}:{}", user.email(), user.role)
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    fn get_with(name: header::HeaderName, value: &str) -> Request<Body> {
        Request::builder()
            .uri("/whoami")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let state = test_state();
        let response = app(state)
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_bearer_and_cookie_both_accepted() {
        let state = test_state();
        seed_account(&state, "a@x.org", "pw123456", Role::Superadmin).await;
        let token = state.jwt.issue("a@x.org", Role::Superadmin).unwrap().token;

        let response = app(state.clone())
            .oneshot(get_with(header::AUTHORIZATION, &format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(state)
            .oneshot(get_with(header::COOKIE, &format!("access_token={token}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_garbage_token_is_unauthenticated() {
        let state = test_state();
        let response = app(state)
            .oneshot(get_with(header::AUTHORIZATION, "Bearer not-a-jwt"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_deleted_account_is_unauthenticated() {
        let state = test_state();
        let account = seed_account(&state, "a@x.org", "pw123456", Role::Admin).await;
        let token = state.jwt.issue("a@x.org", Role::Admin).unwrap().token;

        state.store.delete(account.id).await.unwrap();

        let err = authenticate(&state, &bearer_headers(&token)).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_inactive_account_is_forbidden() {
        let state = test_state();
        let account = seed_account(&state, "a@x.org", "pw123456", Role::Admin).await;
        let token = state.jwt.issue("a@x.org", Role::Admin).unwrap().token;

        let patch = AdminPatch {
            is_active: Some(false),
            ..Default::default()
        };
        state.store.update(account.id, patch).await.unwrap();

        let response = app(state)
            .oneshot(get_with(header::AUTHORIZATION, &format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_revoked_token_is_unauthenticated() {
        let state = test_state();
        seed_account(&state, "a@x.org", "pw123456", Role::Admin).await;
        let issued = state.jwt.issue("a@x.org", Role::Admin).unwrap();

        assert!(authenticate(&state, &bearer_headers(&issued.token)).await.is_ok());

        state.revocations.revoke(&issued.jti, issued.expires_at).await;
        let err = authenticate(&state, &bearer_headers(&issued.token))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_role_comes_from_token_snapshot() {
        let state = test_state();
        seed_account(&state, "root@x.org", "pw123456", Role::Superadmin).await;
        let account = seed_account(&state, "a@x.org", "pw123456", Role::Superadmin).await;
        let token = state.jwt.issue("a@x.org", Role::Superadmin).unwrap().token;

        let patch = AdminPatch {
            role: Some(Role::Admin),
            ..Default::default()
        };
        state.store.update(account.id, patch).await.unwrap();

        let user = authenticate(&state, &bearer_headers(&token)).await.unwrap();
        assert_eq!(user.role, Role::Superadmin);
        assert_eq!(user.account.role, Role::Admin);
    }

    fn bearer_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        headers
    }
}
