//! Registered route table

use parking_lot::RwLock;
use shared::RouteDefinition;
use shared::util::normalize_path;
use std::collections::{BTreeSet, HashMap};

use crate::error::BuildError;

#[derive(Debug, Default)]
struct TableState {
    roots: Vec<RouteDefinition>,
    /// name → route with children detached
    by_name: HashMap<String, RouteDefinition>,
    /// normalized path → name
    by_path: HashMap<String, String>,
}

/// The router's dynamic route table
///
/// Registered as a whole and unregistered as a whole. An empty table is
/// never registered, so "registered" always means "built".
#[derive(Debug, Default)]
pub struct RouteTable {
    inner: RwLock<Option<TableState>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly built table
    ///
    /// Fails without touching the current table when names repeat or the
    /// list is empty. Any previously registered table is replaced.
    pub fn register(&self, routes: Vec<RouteDefinition>) -> Result<usize, BuildError> {
        if routes.is_empty() {
            return Err(BuildError::EmptyMenu);
        }

        let mut state = TableState::default();
        let mut duplicate = None;
        for root in &routes {
            root.visit(&mut |route| {
                if duplicate.is_some() {
                    return;
                }
                let detached = RouteDefinition {
                    children: Vec::new(),
                    ..route.clone()
                };
                if state.by_name.insert(route.name.clone(), detached).is_some() {
                    duplicate = Some(route.name.clone());
                    return;
                }
                let path = normalize_path(&route.path);
                if let Some(existing) = state.by_path.get(&path) {
                    tracing::warn!(path = %path, kept = %existing, shadowed = %route.name, "Duplicate route path");
                } else {
                    state.by_path.insert(path, route.name.clone());
                }
            });
        }

        if let Some(name) = duplicate {
            return Err(BuildError::InvalidMenu(format!("duplicate route name: {}", name)));
        }

        let count = state.by_name.len();
        state.roots = routes;
        let mut inner = self.inner.write();
        if inner.is_some() {
            tracing::warn!("Replacing a registered route table");
        }
        *inner = Some(state);
        tracing::debug!(routes = count, "Route table registered");
        Ok(count)
    }

    /// Remove every dynamic route
    pub fn unregister_all(&self) {
        if self.inner.write().take().is_some() {
            tracing::debug!("Route table unregistered");
        }
    }

    pub fn is_registered(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Route whose path equals `path` (normalized)
    pub fn resolve(&self, path: &str) -> Option<RouteDefinition> {
        let path = normalize_path(path);
        let inner = self.inner.read();
        let state = inner.as_ref()?;
        state
            .by_path
            .get(&path)
            .and_then(|name| state.by_name.get(name))
            .cloned()
    }

    pub fn by_name(&self, name: &str) -> Option<RouteDefinition> {
        self.inner
            .read()
            .as_ref()
            .and_then(|state| state.by_name.get(name).cloned())
    }

    /// Every navigable path
    pub fn paths(&self) -> BTreeSet<String> {
        self.inner
            .read()
            .as_ref()
            .map(|state| state.by_path.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Registered routes, nested, in source order
    pub fn routes(&self) -> Vec<RouteDefinition> {
        self.inner
            .read()
            .as_ref()
            .map(|state| state.roots.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .as_ref()
            .map(|state| state.by_name.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
