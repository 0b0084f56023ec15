//! Console Client - HTTP client for the console backend
//!
//! Authentication exchange and the "list my granted menus" query.

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::client::{ApiResponse, LoginResponse, MenuListResponse};
