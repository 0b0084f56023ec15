//! Granted permission state

pub mod codes;
pub mod store;

pub use codes::RequiredCodes;
pub use store::{GrantedPermissionSet, PermissionStore};
