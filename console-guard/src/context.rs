//! AuthContext - 认证上下文
//!
//! Everything one namespace knows about its principal: the session, the
//! granted permissions, the built route table and the active route. Created
//! empty, populated by sign-in and a route table build, torn down by
//! sign-out. Injected into the navigation guard and the capability gate.
//!
//! Every sign-in and sign-out bumps a generation counter. A route table
//! build records the generation it started under and is discarded when it
//! finishes under another one.

use parking_lot::{Mutex, RwLock};
use shared::{AppResult, MenuNode, PrincipalIdentity, RouteDefinition, TierValue};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::config::NamespaceConfig;
use crate::error::{BuildError, StorageError};
use crate::permission::PermissionStore;
use crate::routing::RouteTable;
use crate::security_log;
use crate::session::{KeyValueStore, PrincipalSession};
use crate::source::AuthBackend;

/// 认证上下文
pub struct AuthContext {
    config: NamespaceConfig,
    session: PrincipalSession,
    permissions: PermissionStore,
    routes: RouteTable,
    active_route: RwLock<Option<String>>,
    generation: AtomicU64,
    /// Serializes build application against sign-in/sign-out
    lifecycle: Mutex<()>,
}

impl AuthContext {
    /// Empty (signed-out) context
    pub fn new(config: NamespaceConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let session = PrincipalSession::new(config.token_key.clone(), store);
        Self {
            config,
            session,
            permissions: PermissionStore::new(),
            routes: RouteTable::new(),
            active_route: RwLock::new(None),
            generation: AtomicU64::new(0),
            lifecycle: Mutex::new(()),
        }
    }

    /// Restore a persisted session; permissions and routes stay empty until
    /// the first guarded navigation builds them
    pub fn init(&self) -> Result<bool, StorageError> {
        let _lifecycle = self.lifecycle.lock();
        self.reset();
        self.session.restore(shared::util::now_secs())
    }

    /// Adopt a freshly issued token
    pub fn sign_in(&self, token: impl Into<String>, identity: PrincipalIdentity) -> Result<(), StorageError> {
        let _lifecycle = self.lifecycle.lock();
        self.reset();
        self.session.sign_in(token, identity)?;
        tracing::info!(namespace = %self.config.kind, "Principal signed in");
        Ok(())
    }

    /// Tear everything down
    ///
    /// In-memory state is cleared even when removing the persisted session
    /// fails; the storage error is still returned.
    pub fn sign_out(&self) -> Result<(), StorageError> {
        let _lifecycle = self.lifecycle.lock();
        self.reset();
        let result = self.session.sign_out();
        tracing::info!(namespace = %self.config.kind, "Principal signed out");
        result
    }

    /// Login against the backend and adopt the issued token
    pub async fn login(&self, backend: &dyn AuthBackend, username: &str, password: &str) -> AppResult<PrincipalIdentity> {
        let response = backend.login(username, password).await?;
        self.sign_in(response.token, response.user.clone())?;
        Ok(response.user)
    }

    /// Best-effort backend logout followed by local teardown
    pub async fn logout(&self, backend: &dyn AuthBackend) -> AppResult<()> {
        if let Some(token) = self.session.token() {
            if let Err(e) = backend.logout(&token).await {
                tracing::warn!(namespace = %self.config.kind, error = %e, "Backend logout failed");
            }
        }
        self.sign_out()?;
        Ok(())
    }

    /// Bump the generation and drop derived state; caller holds `lifecycle`
    fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.permissions.clear();
        self.routes.unregister_all();
        *self.active_route.write() = None;
    }

    /// Install the result of a route table build started under `generation`
    ///
    /// Stale results are discarded and leave the current state untouched.
    pub fn apply_build(
        &self,
        generation: u64,
        menus: &[MenuNode],
        routes: Vec<RouteDefinition>,
    ) -> Result<usize, BuildError> {
        let _lifecycle = self.lifecycle.lock();
        if self.generation() != generation {
            security_log!(
                "WARN",
                "stale_build_discarded",
                namespace = self.config.kind.as_str(),
                started = generation,
                current = self.generation()
            );
            return Err(BuildError::SessionChanged);
        }

        self.routes.unregister_all();
        let count = self.routes.register(routes)?;
        self.permissions.load(menus);
        tracing::info!(namespace = %self.config.kind, routes = count, "Route table built");
        Ok(count)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    pub fn session(&self) -> &PrincipalSession {
        &self.session
    }

    pub fn permissions(&self) -> &PermissionStore {
        &self.permissions
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Name of the route the guard last allowed
    pub fn active_route(&self) -> Option<String> {
        self.active_route.read().clone()
    }

    pub fn set_active_route(&self, name: Option<String>) {
        *self.active_route.write() = name;
    }

    pub fn tier(&self) -> TierValue {
        self.session.tier()
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("namespace", &self.config.kind)
            .field("session", &self.session)
            .field("routes", &self.routes.len())
            .field("generation", &self.generation())
            .finish()
    }
}
