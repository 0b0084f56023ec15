//! Granted menu model
//!
//! The tree returned by the backend's "list my granted menus" query. Field
//! names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Node kind
///
/// `Catalog` groups pages, `Menu` is a page, `Button` only carries codes for
/// its enclosing page and never becomes a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuKind {
    Catalog,
    #[default]
    Menu,
    Button,
}

/// Display and behaviour metadata carried from menu node to route
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuMeta {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Omitted from menu rendering; the route is still registered
    #[serde(default)]
    pub is_hidden: bool,
    /// Rendered outside the layout frame
    #[serde(default)]
    pub is_full: bool,
    /// Pinned as a non-closable tab
    #[serde(default)]
    pub is_affix: bool,
    #[serde(default)]
    pub is_keep_alive: bool,
    /// Menu entry to highlight while this (usually hidden) page is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_menu: Option<String>,
    #[serde(default, alias = "isLink", skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
}

/// One node of the granted menu tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    pub id: i64,
    /// Route name; unique across the tree
    pub name: String,
    #[serde(default)]
    pub kind: MenuKind,
    /// Absolute (`/operator/x`) or relative to the parent's path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// View key; defaults to the resolved path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub children: Vec<MenuNode>,
    #[serde(default)]
    pub button_codes: BTreeSet<String>,
    #[serde(default)]
    pub meta: MenuMeta,
}

impl MenuNode {
    /// Create a page node with an empty title
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: MenuKind::Menu,
            path: None,
            component: None,
            redirect: None,
            children: Vec::new(),
            button_codes: BTreeSet::new(),
            meta: MenuMeta::default(),
        }
    }

    pub fn with_kind(mut self, kind: MenuKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.meta.title = title.into();
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_button_codes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.button_codes = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_meta(mut self, meta: MenuMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.meta.is_hidden = true;
        self
    }

    pub fn external(mut self, url: impl Into<String>) -> Self {
        self.meta.external_link = Some(url.into());
        self
    }

    pub fn is_button(&self) -> bool {
        self.kind == MenuKind::Button
    }

    pub fn is_external(&self) -> bool {
        self.meta
            .external_link
            .as_deref()
            .is_some_and(|link| !link.is_empty())
    }

    /// Whether this node becomes a route
    pub fn is_routable(&self) -> bool {
        !self.is_button() && !self.is_external()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order depth-first visit of this node and its descendants
    pub fn visit<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a MenuNode),
    {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

/// Pre-order depth-first visit of a forest
pub fn visit_all<'a, F>(roots: &'a [MenuNode], mut f: F)
where
    F: FnMut(&'a MenuNode),
{
    for root in roots {
        root.visit(&mut f);
    }
}
