//! Guard error types
//!
//! None of these escape the navigation guard as a panic or an `Err`: the
//! guard folds them into a navigation outcome and the router reports them to
//! the observer. They convert into [`AppError`] for hosts that surface them.

use shared::{AppError, ErrorCategory, ErrorCode};
use thiserror::Error;

/// Route table build failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No token to fetch the granted menus with
    #[error("not authenticated")]
    Unauthenticated,

    /// The granted menu query failed
    #[error("granted menu fetch failed: {0}")]
    FetchFailed(String),

    /// The backend refused the token; the session has to go
    #[error("token rejected ({code}): {message}")]
    TokenRejected { code: ErrorCode, message: String },

    /// The granted menu query returned nothing routable
    #[error("granted menu list is empty")]
    EmptyMenu,

    /// Duplicate ids or route names
    #[error("invalid menu data: {0}")]
    InvalidMenu(String),

    /// Logout or re-login happened while the build was in flight
    #[error("session changed while the route table was building")]
    SessionChanged,
}

impl BuildError {
    /// Classify a failed granted menu query
    pub fn from_fetch(err: AppError) -> Self {
        if err.code.category() == ErrorCategory::Auth {
            BuildError::TokenRejected {
                code: err.code,
                message: err.message,
            }
        } else {
            BuildError::FetchFailed(err.message)
        }
    }

    /// Whether a later navigation may try the build again
    pub fn is_retryable(&self) -> bool {
        matches!(self, BuildError::FetchFailed(_) | BuildError::EmptyMenu)
    }
}

impl From<BuildError> for AppError {
    fn from(err: BuildError) -> Self {
        let code = match &err {
            BuildError::Unauthenticated => ErrorCode::NotAuthenticated,
            BuildError::TokenRejected { code, .. } => *code,
            BuildError::FetchFailed(_) | BuildError::EmptyMenu => ErrorCode::TableBuildFailed,
            BuildError::InvalidMenu(_) => ErrorCode::InvalidMenu,
            BuildError::SessionChanged => ErrorCode::SessionChanged,
        };
        AppError::with_message(code, err.to_string()).with_detail("retryable", err.is_retryable())
    }
}

/// Why a navigation was aborted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("route table build failed: {0}")]
    TableBuildFailed(BuildError),

    #[error("failed to load view {view} for {path}: {reason}")]
    ViewLoadFailed {
        path: String,
        view: String,
        reason: String,
    },

    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("no namespace owns {0}")]
    UnknownNamespace(String),

    #[error("too many redirects navigating to {0}")]
    TooManyRedirects(String),
}

impl From<NavigationError> for AppError {
    fn from(err: NavigationError) -> Self {
        let code = match &err {
            NavigationError::TableBuildFailed(_) => ErrorCode::TableBuildFailed,
            NavigationError::ViewLoadFailed { .. } => ErrorCode::ViewLoadFailed,
            NavigationError::RouteNotFound(_) => ErrorCode::RouteNotFound,
            NavigationError::UnknownNamespace(_) => ErrorCode::UnknownNamespace,
            NavigationError::TooManyRedirects(_) => ErrorCode::TooManyRedirects,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Lazy view resolution failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ViewLoadError(pub String);

/// Key-value storage failure
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::storage(err.to_string())
    }
}

/// Permission tree editor failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("unknown tree node: {0}")]
    UnknownNode(i64),

    #[error("duplicate tree node: {0}")]
    DuplicateNode(i64),
}

impl From<TreeError> for AppError {
    fn from(err: TreeError) -> Self {
        AppError::validation(err.to_string())
    }
}
