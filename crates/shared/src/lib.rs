//! Tap To Smile Shared Types and Utilities
//!
//! Domain types and database helpers shared by the API server and its tools.

pub mod db;
pub mod error;
pub mod types;

pub use db::*;
pub use error::*;
pub use types::*;
