//! Shared types for the console
//!
//! Data model of granted menus, routes and principals, the DTOs exchanged
//! with the backend, and the unified error types.

pub mod client;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{
    MenuKind, MenuMeta, MenuNode, PrincipalIdentity, RouteDefinition, TIER_LABELS, TierValue, ViewRef,
    visit_all,
};
pub use serde::{Deserialize, Serialize};
