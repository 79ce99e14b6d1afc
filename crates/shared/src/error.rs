//! Error types shared across Tap To Smile crates

use thiserror::Error;

/// A role string outside the closed `admin` / `superadmin` set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid role '{0}': expected 'admin' or 'superadmin'")]
pub struct RoleParseError(pub String);
