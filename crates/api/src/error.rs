//! API error types and handling

use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{jwt::JwtError, password::PasswordError};
use crate::store::StoreError;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Could not validate credentials")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(&'static str),

    // Validation errors
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    EmailAlreadyExists,

    // Resource errors
    #[error("Admin not found")]
    NotFound,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", self.to_string()),
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", self.to_string()),
            ApiError::Forbidden(reason) => (StatusCode::FORBIDDEN, "FORBIDDEN", reason.to_string()),

            // Validation
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            ApiError::EmailAlreadyExists => (StatusCode::BAD_REQUEST, "EMAIL_EXISTS", self.to_string()),

            // Resources
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),

            // Internal
            ApiError::Database(detail) => {
                tracing::error!(detail = %detail, "Request failed with database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", "Internal server error".to_string())
            }
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", self.to_string()),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        let mut response = (status, body).into_response();
        if matches!(self, ApiError::InvalidCredentials | ApiError::Unauthenticated) {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ApiError::EmailAlreadyExists,
            err @ StoreError::LastSuperadmin => ApiError::validation(err.to_string()),
            StoreError::Backend(detail) => ApiError::Database(detail),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!(error = %err, "Password hashing failed");
        ApiError::Internal
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encoding(detail) => {
                tracing::error!(detail = %detail, "Token encoding failed");
                ApiError::Internal
            }
            _ => ApiError::Unauthenticated,
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_mapping() {
        assert_eq!(ApiError::Unauthenticated.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidCredentials.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("nope").into_response().status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::validation("bad").into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmailAlreadyExists.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_database_detail_is_not_exposed() {
        let response = ApiError::Database("relation \"admins\" does not exist".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(!body.to_string().contains("admins"));
    }

    #[tokio::test]
    async fn test_unauthenticated_sets_www_authenticate() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.headers().get(WWW_AUTHENTICATE).unwrap(), "Bearer");

        let response = ApiError::Forbidden("Account disabled").into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Account disabled");
    }

    #[test]
    fn test_store_error_conversion() {
        assert!(matches!(ApiError::from(StoreError::Duplicate), ApiError::EmailAlreadyExists));
        assert!(matches!(
            ApiError::from(StoreError::LastSuperadmin),
            ApiError::Validation(msg) if msg == "At least one active superadmin must remain"
        ));
        assert!(matches!(
            ApiError::from(StoreError::Backend("x".into())),
            ApiError::Database(_)
        ));
    }
}
