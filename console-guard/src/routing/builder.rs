//! RouteTableBuilder - 动态路由构建
//!
//! Converts the granted menu tree into route definitions, depth first, in
//! source order.

use shared::util::{join_path, normalize_path};
use shared::{MenuNode, RouteDefinition, ViewRef, visit_all};
use std::collections::HashSet;

use super::table::RouteTable;
use crate::error::BuildError;

/// Builds route definitions rooted at a namespace prefix
#[derive(Debug, Clone)]
pub struct RouteTableBuilder {
    base_path: String,
}

impl RouteTableBuilder {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: normalize_path(&base_path.into()),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Convert `menus` into nested route definitions
    ///
    /// Hidden nodes become routes. Button nodes and external links do not,
    /// nor does anything below them.
    pub fn build(&self, menus: &[MenuNode]) -> Result<Vec<RouteDefinition>, BuildError> {
        if menus.is_empty() {
            return Err(BuildError::EmptyMenu);
        }
        validate(menus)?;

        let routes: Vec<RouteDefinition> = menus
            .iter()
            .filter_map(|node| self.convert(node, &self.base_path))
            .collect();

        if routes.is_empty() {
            return Err(BuildError::EmptyMenu);
        }
        Ok(routes)
    }

    /// Build and register, replacing whatever `table` held
    ///
    /// On failure the table is left unregistered.
    pub fn build_and_register(
        &self,
        menus: &[MenuNode],
        table: &RouteTable,
    ) -> Result<usize, BuildError> {
        table.unregister_all();
        let routes = self.build(menus)?;
        table.register(routes)
    }

    fn convert(&self, node: &MenuNode, parent_path: &str) -> Option<RouteDefinition> {
        if node.is_button() {
            return None;
        }
        if node.is_external() {
            tracing::debug!(name = %node.name, "Skipping external link");
            return None;
        }

        let path = match node.path.as_deref() {
            Some(p) if !p.is_empty() => join_path(parent_path, p),
            _ => join_path(parent_path, &node.name),
        };
        if !path_within(&path, &self.base_path) {
            tracing::warn!(name = %node.name, path = %path, base = %self.base_path, "Route outside namespace prefix");
        }

        let view = node
            .component
            .as_deref()
            .filter(|c| !c.is_empty())
            .map(ViewRef::new)
            .unwrap_or_else(|| ViewRef::new(path.clone()));

        let children = node
            .children
            .iter()
            .filter_map(|child| self.convert(child, &path))
            .collect();

        Some(RouteDefinition {
            name: node.name.clone(),
            path,
            view,
            redirect: node.redirect.clone(),
            full_screen: node.meta.is_full,
            menu_id: node.id,
            meta: node.meta.clone(),
            children,
        })
    }
}

fn path_within(path: &str, base: &str) -> bool {
    base == "/" || path == base || path.starts_with(&format!("{}/", base))
}

/// Node ids unique across the tree, route names unique among the nodes
/// that become routes
fn validate(menus: &[MenuNode]) -> Result<(), BuildError> {
    let mut ids = HashSet::new();
    let mut problem = None;

    visit_all(menus, |node| {
        if problem.is_some() {
            return;
        }
        if !ids.insert(node.id) {
            problem = Some(format!("duplicate node id: {}", node.id));
        } else if node.name.trim().is_empty() {
            problem = Some(format!("node {} has no name", node.id));
        }
    });
    if let Some(msg) = problem {
        return Err(BuildError::InvalidMenu(msg));
    }

    unique_route_names(menus, &mut HashSet::new())
}

/// Same pruning as `convert`: nothing under a button or external link
fn unique_route_names<'a>(nodes: &'a [MenuNode], names: &mut HashSet<&'a str>) -> Result<(), BuildError> {
    for node in nodes.iter().filter(|n| n.is_routable()) {
        if !names.insert(node.name.as_str()) {
            return Err(BuildError::InvalidMenu(format!("duplicate route name: {}", node.name)));
        }
        unique_route_names(&node.children, names)?;
    }
    Ok(())
}
