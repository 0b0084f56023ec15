//! PermissionStore - 权限存储
//!
//! Granted menu tree of the signed-in principal and the code sets derived
//! from it. Readers always see either the previous or the next snapshot:
//! `load` and `clear` swap one `Arc` under a write lock.

use parking_lot::RwLock;
use shared::{MenuNode, visit_all};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::codes::RequiredCodes;

/// Route-scoped and global code sets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantedPermissionSet {
    by_route_name: HashMap<String, BTreeSet<String>>,
    global: BTreeSet<String>,
}

impl GrantedPermissionSet {
    /// Derive the sets from a granted tree
    ///
    /// Codes of a routable node are keyed by its name. Button nodes and
    /// external links have no route of their own; their codes, and a button's
    /// own name, attach to the nearest routable ancestor. Every code also
    /// lands in `global`.
    pub fn from_tree(tree: &[MenuNode]) -> Self {
        let mut set = Self::default();
        for root in tree {
            set.collect(root, None);
        }
        set
    }

    fn collect(&mut self, node: &MenuNode, route: Option<&str>) {
        let own_route = if node.is_routable() {
            Some(node.name.as_str())
        } else {
            route
        };

        let mut codes: BTreeSet<String> = node.button_codes.clone();
        if node.is_button() {
            codes.insert(node.name.clone());
        }

        self.global.extend(codes.iter().cloned());
        if let Some(route) = own_route {
            self.by_route_name
                .entry(route.to_string())
                .or_default()
                .extend(codes);
        }

        for child in &node.children {
            self.collect(child, own_route);
        }
    }

    pub fn by_route_name(&self) -> &HashMap<String, BTreeSet<String>> {
        &self.by_route_name
    }

    pub fn global(&self) -> &BTreeSet<String> {
        &self.global
    }

    pub fn route_codes(&self, route_name: &str) -> Option<&BTreeSet<String>> {
        self.by_route_name.get(route_name)
    }

    /// Conjunctive check against one route's codes
    pub fn has_route_code(&self, route_name: &str, codes: &RequiredCodes) -> bool {
        let granted = self.by_route_name.get(route_name);
        codes.all(|code| granted.is_some_and(|set| set.contains(code)))
    }

    /// Conjunctive check against the global union
    pub fn has_global_code(&self, codes: &RequiredCodes) -> bool {
        codes.all(|code| self.global.contains(code))
    }

    pub fn is_empty(&self) -> bool {
        self.by_route_name.is_empty() && self.global.is_empty()
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    menus: Vec<MenuNode>,
    granted: GrantedPermissionSet,
}

/// 权限存储
#[derive(Debug, Default)]
pub struct PermissionStore {
    inner: RwLock<Arc<Snapshot>>,
}

impl PermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.read().clone()
    }

    /// Replace everything with what `tree` grants
    pub fn load(&self, tree: &[MenuNode]) {
        let next = Arc::new(Snapshot {
            menus: tree.to_vec(),
            granted: GrantedPermissionSet::from_tree(tree),
        });
        tracing::debug!(
            routes = next.granted.by_route_name.len(),
            global = next.granted.global.len(),
            "Permission store loaded"
        );
        *self.inner.write() = next;
    }

    pub fn clear(&self) {
        *self.inner.write() = Arc::new(Snapshot::default());
        tracing::debug!("Permission store cleared");
    }

    pub fn is_loaded(&self) -> bool {
        !self.snapshot().menus.is_empty()
    }

    /// Copy of the current code sets
    pub fn granted(&self) -> GrantedPermissionSet {
        self.snapshot().granted.clone()
    }

    /// `code` or every code of a list must be granted on `route_name`
    pub fn has_route_code(&self, route_name: &str, codes: impl Into<RequiredCodes>) -> bool {
        self.snapshot()
            .granted
            .has_route_code(route_name, &codes.into())
    }

    /// `code` or every code of a list must be granted somewhere
    pub fn has_global_code(&self, codes: impl Into<RequiredCodes>) -> bool {
        self.snapshot().granted.has_global_code(&codes.into())
    }

    // ========== Menu views ==========

    /// The granted tree as loaded
    pub fn menu_tree(&self) -> Vec<MenuNode> {
        self.snapshot().menus.clone()
    }

    /// Pre-order flattening, children detached
    pub fn flat_menu_list(&self) -> Vec<MenuNode> {
        let snapshot = self.snapshot();
        let mut flat = Vec::new();
        visit_all(&snapshot.menus, |node| flat.push(detached(node)));
        flat
    }

    /// What a side menu renders: hidden subtrees and buttons removed
    pub fn show_menu_list(&self) -> Vec<MenuNode> {
        fn shown(nodes: &[MenuNode]) -> Vec<MenuNode> {
            nodes
                .iter()
                .filter(|n| !n.meta.is_hidden && !n.is_button())
                .map(|n| {
                    let mut node = detached(n);
                    node.children = shown(&n.children);
                    node
                })
                .collect()
        }
        shown(&self.snapshot().menus)
    }

    /// Chain of nodes from a root down to `route_name`, children detached
    pub fn breadcrumbs(&self, route_name: &str) -> Vec<MenuNode> {
        fn find(nodes: &[MenuNode], name: &str, trail: &mut Vec<MenuNode>) -> bool {
            for node in nodes {
                trail.push(detached(node));
                if node.name == name || find(&node.children, name, trail) {
                    return true;
                }
                trail.pop();
            }
            false
        }

        let mut trail = Vec::new();
        find(&self.snapshot().menus, route_name, &mut trail);
        trail
    }

    /// Pages pinned as non-closable tabs
    pub fn affix_routes(&self) -> Vec<MenuNode> {
        self.flat_menu_list()
            .into_iter()
            .filter(|n| n.meta.is_affix && n.is_routable())
            .collect()
    }

    /// Route names whose views are cached across navigation
    pub fn keep_alive_names(&self) -> Vec<String> {
        self.flat_menu_list()
            .into_iter()
            .filter(|n| n.meta.is_keep_alive && n.is_routable())
            .map(|n| n.name)
            .collect()
    }
}

fn detached(node: &MenuNode) -> MenuNode {
    MenuNode {
        children: Vec::new(),
        ..node.clone()
    }
}
