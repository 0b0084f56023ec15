//! Route definitions derived from granted menu nodes

use serde::{Deserialize, Serialize};

use super::menu::MenuMeta;

/// Lazily-resolved view reference
///
/// Only the key is stored; the view itself is resolved on navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewRef(pub String);

impl ViewRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A navigable route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDefinition {
    /// Unique within one table; key for page-scoped permission checks
    pub name: String,
    /// Normalized absolute path
    pub path: String,
    pub view: ViewRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Rendered outside the layout frame
    #[serde(default)]
    pub full_screen: bool,
    /// Id of the menu node this route was derived from
    pub menu_id: i64,
    pub meta: MenuMeta,
    #[serde(default)]
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    /// Pre-order visit of this route and its nested routes
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a RouteDefinition),
    {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}
