//! Data models shared by the client and the guard

pub mod menu;
pub mod principal;
pub mod route;

pub use menu::{MenuKind, MenuMeta, MenuNode, visit_all};
pub use principal::{PrincipalIdentity, TIER_LABELS, TierValue};
pub use route::{RouteDefinition, ViewRef};
