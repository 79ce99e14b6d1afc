//! API routes

pub mod admins;
pub mod auth;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{auth::require_auth, security::security_headers_middleware, state::AppState};

/// Request bodies here are small forms and JSON documents
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// CORS for the admin frontend; credentials allowed so the session cookie
/// travels with cross-origin requests
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Create all API routes
pub fn create_router(state: AppState) -> Router {
    // Health check routes (at root level for infrastructure monitoring)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    // Public admin routes (no auth required)
    let public_admin_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", post(auth::forgot_password));

    // Protected admin routes (auth required, role checks in handlers)
    let protected_admin_routes = Router::new()
        .route("/me", get(auth::me))
        .route("/change-password", post(auth::change_password))
        .route("/", get(admins::list_admins))
        .route("/register", post(admins::register))
        .route(
            "/:admin_id",
            get(admins::get_admin)
                .put(admins::update_admin)
                .patch(admins::update_admin)
                .delete(admins::delete_admin),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin_routes = Router::new()
        .merge(public_admin_routes)
        .merge(protected_admin_routes);

    // A nested "/" only matches "/api/admin"; the list also answers with the
    // trailing slash
    let list_with_slash = Router::new()
        .route("/api/admin/", get(admins::list_admins))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(health_routes)
        .nest("/api/admin", admin_routes)
        .merge(list_with_slash)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
