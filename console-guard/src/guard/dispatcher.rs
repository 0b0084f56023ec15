//! Namespace dispatch
//!
//! Each principal kind lives under its own path prefix with its own guard.
//! A navigation goes to the guard whose prefix owns the target; the longest
//! owning prefix wins.

use std::sync::Arc;

use super::navigation::{NavigationGuard, NavigationOutcome};
use crate::error::NavigationError;

#[derive(Default)]
pub struct NavigationDispatcher {
    guards: Vec<Arc<NavigationGuard>>,
}

impl NavigationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_guard(mut self, guard: Arc<NavigationGuard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn guards(&self) -> &[Arc<NavigationGuard>] {
        &self.guards
    }

    /// Guard owning `path`, if any
    pub fn classify(&self, path: &str) -> Option<&Arc<NavigationGuard>> {
        self.guards
            .iter()
            .filter(|g| g.context().config().owns(path))
            .max_by_key(|g| g.context().config().prefix.len())
    }

    pub async fn check(&self, from: Option<&str>, to: &str) -> NavigationOutcome {
        match self.classify(to) {
            Some(guard) => guard.check(from, to).await,
            None => {
                tracing::warn!(path = %to, "No namespace owns navigation target");
                NavigationOutcome::Abort(NavigationError::UnknownNamespace(to.to_string()))
            }
        }
    }
}
