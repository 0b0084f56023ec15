//! Client-related types shared between the backend client and the guard
//!
//! Request/response DTOs of the auth and menu endpoints.

use serde::{Deserialize, Serialize};

use crate::models::{MenuNode, PrincipalIdentity};

pub use crate::error::ApiResponse;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PrincipalIdentity,
}

// =============================================================================
// Menu API DTOs
// =============================================================================

/// Granted menu tree, root level first
pub type MenuListResponse = Vec<MenuNode>;
