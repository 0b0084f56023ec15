//! ConsoleState - 控制台状态
//!
//! Wires one [`AuthContext`] per namespace, their guards, the dispatcher and
//! the router. Both namespaces run side by side and never share storage.

use std::sync::Arc;

use super::config::{GuardConfig, NamespaceConfig, NamespaceKind};
use crate::context::AuthContext;
use crate::error::StorageError;
use crate::gate::CapabilityGate;
use crate::guard::{NavigationDispatcher, NavigationGuard, NavigationObserver, NavigationReport, Router};
use crate::routing::ViewResolver;
use crate::session::{FileKvStore, KeyValueStore};
use crate::source::MenuSource;

#[derive(Clone)]
pub struct ConsoleState {
    config: GuardConfig,
    operator: Arc<AuthContext>,
    end_user: Arc<AuthContext>,
    router: Arc<Router>,
}

impl ConsoleState {
    /// File-backed sessions under `{work_dir}/auth`
    pub fn initialize(
        config: GuardConfig,
        source: Arc<dyn MenuSource>,
        views: Arc<dyn ViewResolver>,
        observer: Arc<dyn NavigationObserver>,
    ) -> Result<Self, StorageError> {
        let auth_dir = config.auth_dir();
        let operator_store = Arc::new(FileKvStore::open(auth_dir.join(&config.operator.storage_file))?);
        let end_user_store = Arc::new(FileKvStore::open(auth_dir.join(&config.end_user.storage_file))?);
        Self::with_stores(config, operator_store, end_user_store, source, views, observer)
    }

    /// Build on the given stores and restore whatever sessions they hold
    pub fn with_stores(
        config: GuardConfig,
        operator_store: Arc<dyn KeyValueStore>,
        end_user_store: Arc<dyn KeyValueStore>,
        source: Arc<dyn MenuSource>,
        views: Arc<dyn ViewResolver>,
        observer: Arc<dyn NavigationObserver>,
    ) -> Result<Self, StorageError> {
        let operator = restore(config.operator.clone(), operator_store)?;
        let end_user = restore(config.end_user.clone(), end_user_store)?;

        let dispatcher = NavigationDispatcher::new()
            .with_guard(Arc::new(NavigationGuard::new(operator.clone(), source.clone())))
            .with_guard(Arc::new(NavigationGuard::new(end_user.clone(), source)));
        let router = Router::new(dispatcher, views, observer).with_max_redirects(config.max_redirects);

        Ok(Self {
            config,
            operator,
            end_user,
            router: Arc::new(router),
        })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn context(&self, kind: NamespaceKind) -> &Arc<AuthContext> {
        match kind {
            NamespaceKind::Operator => &self.operator,
            NamespaceKind::EndUser => &self.end_user,
        }
    }

    pub fn gate(&self, kind: NamespaceKind) -> CapabilityGate {
        CapabilityGate::new(self.context(kind).clone())
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub async fn navigate(&self, from: Option<&str>, to: &str) -> NavigationReport {
        self.router.navigate(from, to).await
    }
}

fn restore(config: NamespaceConfig, store: Arc<dyn KeyValueStore>) -> Result<Arc<AuthContext>, StorageError> {
    let kind = config.kind;
    let context = Arc::new(AuthContext::new(config, store));
    let restored = context.init()?;
    tracing::info!(namespace = %kind, restored, "Namespace initialized");
    Ok(context)
}
