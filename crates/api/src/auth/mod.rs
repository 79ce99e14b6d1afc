//! Authentication and authorization core

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod reset;
pub mod revocation;
pub mod session;

pub use jwt::{Claims, IssuedToken, JwtError, JwtManager};
pub use middleware::{authenticate, require_auth, AuthUser};
pub use password::{
    generate_temporary_password, hash_password, validate_password, verify_against_dummy,
    verify_password, PasswordError, PasswordValidationError,
};
pub use policy::{
    authorize_role_grant, ensure_not_self, ensure_superadmin_remains, require_superadmin,
    AccountChange,
};
pub use reset::{reset_forgotten_password, RESET_RESPONSE_MESSAGE};
pub use revocation::RevocationList;
pub use session::{clear_session_cookie, extract_token, session_cookie, SESSION_COOKIE_NAME};
