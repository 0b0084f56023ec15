//! Lazy view resolution

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::ViewRef;
use std::collections::HashSet;

use crate::error::ViewLoadError;

/// A view that has been resolved and can be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
    pub key: ViewRef,
}

/// Resolves the lazy view reference of a route on navigation
#[async_trait]
pub trait ViewResolver: Send + Sync {
    async fn resolve(&self, view: &ViewRef) -> Result<ResolvedView, ViewLoadError>;
}

/// Resolver backed by the set of view modules the host ships
///
/// Resolution fails for keys that were never registered, which is what a
/// missing view module looks like at navigation time.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    known: RwLock<HashSet<String>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_views<I, S>(views: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: RwLock::new(views.into_iter().map(Into::into).collect()),
        }
    }

    pub fn register(&self, key: impl Into<String>) {
        self.known.write().insert(key.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.known.read().contains(key)
    }
}

#[async_trait]
impl ViewResolver for ViewRegistry {
    async fn resolve(&self, view: &ViewRef) -> Result<ResolvedView, ViewLoadError> {
        if self.contains(view.key()) {
            Ok(ResolvedView { key: view.clone() })
        } else {
            Err(ViewLoadError(format!("view module not found: {}", view)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_resolves_known_views_only() {
        let registry = ViewRegistry::with_views(["/home/index"]);
        registry.register("/finance/recharge");

        assert!(registry.resolve(&ViewRef::new("/home/index")).await.is_ok());
        assert!(registry.resolve(&ViewRef::new("/finance/recharge")).await.is_ok());
        assert!(registry.resolve(&ViewRef::new("/missing")).await.is_err());
    }
}
