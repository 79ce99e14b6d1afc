//! Tap To Smile admin API
//!
//! Authentication and authorization core of the CMS admin panel: credential
//! storage, token issuance, the request gate, role policy and password reset.

pub mod accounts;
pub mod audit;
pub mod auth;
pub mod config;
pub mod email;
pub mod email_check;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
