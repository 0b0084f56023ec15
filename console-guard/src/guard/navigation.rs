//! NavigationGuard - 导航守卫
//!
//! Decides every navigation inside one namespace. Checks run in a fixed
//! order and the first one that applies wins:
//!
//! 1. login page: bounce signed-in principals back, otherwise drop any stale
//!    table and allow
//! 2. whitelisted page: allow
//! 3. no token: redirect to login (the intended target is not kept)
//! 4. no route table yet: build it once, then re-dispatch to the same target
//!    with a history-replacing redirect. A backend that rejects the token
//!    ends the session and sends the principal to login.
//! 5. resolve the route, record it as active, allow
//!
//! Concurrent navigations that find no table share a single in-flight
//! build. A build that finishes after sign-out or re-login is discarded.

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use shared::RouteDefinition;
use shared::util::{normalize_location, normalize_path, now_secs, split_location};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::AuthContext;
use crate::error::{BuildError, NavigationError};
use crate::routing::RouteTableBuilder;
use crate::security_log;
use crate::source::MenuSource;

type BuildFuture = Shared<BoxFuture<'static, Result<usize, BuildError>>>;

struct InflightBuild {
    id: u64,
    generation: u64,
    future: BuildFuture,
}

/// Where the namespace stands, derived from the context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    AuthenticatedNoTable,
    AuthenticatedReady,
}

/// 导航决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Proceed; `route` is absent for whitelisted and login pages
    Allow {
        path: String,
        route: Option<RouteDefinition>,
    },
    /// Navigate somewhere else instead
    Redirect { to: String, replace: bool },
    /// Stay on the current page
    Abort(NavigationError),
}

impl NavigationOutcome {
    fn redirect(to: impl Into<String>, replace: bool) -> Self {
        NavigationOutcome::Redirect {
            to: to.into(),
            replace,
        }
    }
}

/// 导航守卫
pub struct NavigationGuard {
    context: Arc<AuthContext>,
    source: Arc<dyn MenuSource>,
    builder: RouteTableBuilder,
    inflight: Mutex<Option<InflightBuild>>,
    next_build_id: AtomicU64,
}

impl NavigationGuard {
    pub fn new(context: Arc<AuthContext>, source: Arc<dyn MenuSource>) -> Self {
        let builder = RouteTableBuilder::new(context.config().prefix.clone());
        Self {
            context,
            source,
            builder,
            inflight: Mutex::new(None),
            next_build_id: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &Arc<AuthContext> {
        &self.context
    }

    pub fn state(&self) -> GuardState {
        if !self.context.session().has_token() {
            GuardState::Unauthenticated
        } else if !self.context.routes().is_registered() {
            GuardState::AuthenticatedNoTable
        } else {
            GuardState::AuthenticatedReady
        }
    }

    /// Decide a navigation from `from` to `to`
    ///
    /// Matching uses the path alone; redirects and allowed paths keep the
    /// query and fragment of the location they came from.
    pub async fn check(&self, from: Option<&str>, to: &str) -> NavigationOutcome {
        let config = self.context.config();
        let to = normalize_location(to);
        let path = split_location(&to).0;
        let from = from.map(normalize_location);
        let session = self.context.session();

        if session.has_token() && session.is_expired(now_secs()) {
            security_log!(
                "WARN",
                "token_expired",
                namespace = config.kind.as_str(),
                path = path.as_str()
            );
            if let Err(e) = self.context.sign_out() {
                tracing::warn!(error = %e, "Failed to drop expired session");
            }
        }

        // 1. login page
        if config.is_login(&path) {
            if session.has_token() {
                let back = match from {
                    Some(f) if !config.is_login(&f) => f,
                    _ => config.home_path.clone(),
                };
                return NavigationOutcome::redirect(back, false);
            }
            self.context.routes().unregister_all();
            self.context.set_active_route(None);
            return NavigationOutcome::Allow {
                path: to,
                route: None,
            };
        }

        // 2. whitelist
        if config.is_whitelisted(&path) {
            return NavigationOutcome::Allow {
                path: to,
                route: None,
            };
        }

        // 3. no token
        if !session.has_token() {
            security_log!(
                "INFO",
                "unauthenticated_navigation",
                namespace = config.kind.as_str(),
                path = path.as_str()
            );
            return NavigationOutcome::redirect(config.login_path.clone(), false);
        }

        // 4. build once, then re-dispatch
        if !self.context.routes().is_registered() {
            return match self.ensure_table().await {
                Ok(_) => NavigationOutcome::redirect(to, true),
                Err(BuildError::TokenRejected { code, message }) => {
                    security_log!(
                        "WARN",
                        "token_rejected",
                        namespace = config.kind.as_str(),
                        code = code.code(),
                        reason = message.as_str()
                    );
                    if let Err(e) = self.context.sign_out() {
                        tracing::warn!(error = %e, "Failed to drop rejected session");
                    }
                    NavigationOutcome::redirect(config.login_path.clone(), false)
                }
                Err(_) if !session.has_token() => {
                    NavigationOutcome::redirect(config.login_path.clone(), false)
                }
                // a new session took over mid-build; let it build its own table
                Err(BuildError::SessionChanged) => NavigationOutcome::redirect(to, true),
                Err(e) => {
                    tracing::warn!(
                        namespace = %config.kind,
                        error = %e,
                        retryable = e.is_retryable(),
                        "Route table build failed"
                    );
                    NavigationOutcome::Abort(NavigationError::TableBuildFailed(e))
                }
            };
        }

        // 5. resolve
        match self.context.routes().resolve(&path) {
            Some(route) => {
                self.context.set_active_route(Some(route.name.clone()));
                NavigationOutcome::Allow {
                    path: to,
                    route: Some(route),
                }
            }
            None => match &config.not_found_path {
                Some(not_found) if normalize_path(not_found) != path => {
                    NavigationOutcome::redirect(not_found.clone(), true)
                }
                _ => NavigationOutcome::Abort(NavigationError::RouteNotFound(path)),
            },
        }
    }

    /// Build the route table unless it already exists
    ///
    /// Callers arriving while a build for the same session is running await
    /// that build instead of starting another one.
    pub async fn ensure_table(&self) -> Result<usize, BuildError> {
        let routes = self.context.routes();
        if routes.is_registered() {
            return Ok(routes.len());
        }

        let generation = self.context.generation();
        let (id, future) = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some(build) if build.generation == generation => (build.id, build.future.clone()),
                _ => {
                    let id = self.next_build_id.fetch_add(1, Ordering::SeqCst);
                    let future = self.start_build(generation);
                    *slot = Some(InflightBuild {
                        id,
                        generation,
                        future: future.clone(),
                    });
                    (id, future)
                }
            }
        };

        let result = future.await;

        let mut slot = self.inflight.lock();
        if slot.as_ref().is_some_and(|build| build.id == id) {
            *slot = None;
        }
        result
    }

    fn start_build(&self, generation: u64) -> BuildFuture {
        let context = self.context.clone();
        let source = self.source.clone();
        let builder = self.builder.clone();
        tracing::debug!(namespace = %context.config().kind, generation, "Starting route table build");

        build_table(context, source, builder, generation).boxed().shared()
    }
}

async fn build_table(
    context: Arc<AuthContext>,
    source: Arc<dyn MenuSource>,
    builder: RouteTableBuilder,
    generation: u64,
) -> Result<usize, BuildError> {
    let token = context.session().token().ok_or(BuildError::Unauthenticated)?;
    let menus = source
        .granted_menus(&token)
        .await
        .map_err(BuildError::from_fetch)?;
    let routes = builder.build(&menus)?;
    context.apply_build(generation, &menus, routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::NamespaceConfig;
    use crate::session::MemoryKvStore;
    use async_trait::async_trait;
    use shared::{AppResult, MenuNode, PrincipalIdentity};
    use std::sync::atomic::AtomicUsize;

    struct StaticMenus {
        menus: Vec<MenuNode>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MenuSource for StaticMenus {
        async fn granted_menus(&self, _token: &str) -> AppResult<Vec<MenuNode>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.menus.clone())
        }
    }

    fn guard(menus: Vec<MenuNode>) -> (NavigationGuard, Arc<StaticMenus>) {
        let context = Arc::new(AuthContext::new(
            NamespaceConfig::operator(),
            Arc::new(MemoryKvStore::new()),
        ));
        let source = Arc::new(StaticMenus {
            menus,
            calls: AtomicUsize::new(0),
        });
        (NavigationGuard::new(context, source.clone()), source)
    }

    fn menus() -> Vec<MenuNode> {
        vec![MenuNode::new(1, "home").with_path("home/index")]
    }

    #[tokio::test]
    async fn test_login_page_without_token_is_allowed() {
        let (guard, _) = guard(menus());
        let outcome = guard.check(None, "/operator/login").await;
        assert_eq!(
            outcome,
            NavigationOutcome::Allow {
                path: "/operator/login".into(),
                route: None
            }
        );
    }

    #[tokio::test]
    async fn test_login_page_drops_table_of_cleared_session() {
        let (guard, _) = guard(menus());
        guard.context().sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();
        guard.ensure_table().await.unwrap();
        guard.check(None, "/operator/home/index").await;
        assert_eq!(guard.context().active_route().as_deref(), Some("home"));

        // the persisted session goes away without a context sign-out
        guard.context().session().sign_out().unwrap();
        assert!(guard.context().routes().is_registered());

        assert_eq!(
            guard.check(None, "/operator/login").await,
            NavigationOutcome::Allow {
                path: "/operator/login".into(),
                route: None
            }
        );
        assert!(!guard.context().routes().is_registered());
        assert_eq!(guard.context().active_route(), None);
    }

    #[tokio::test]
    async fn test_login_page_with_token_bounces_back() {
        let (guard, _) = guard(menus());
        guard.context().sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();

        assert_eq!(
            guard.check(Some("/operator/orders"), "/operator/login").await,
            NavigationOutcome::redirect("/operator/orders", false)
        );
        assert_eq!(
            guard.check(Some("/operator/login"), "/operator/login").await,
            NavigationOutcome::redirect("/operator/home/index", false)
        );
        assert_eq!(
            guard.check(None, "/operator/login").await,
            NavigationOutcome::redirect("/operator/home/index", false)
        );
        assert_eq!(
            guard.check(Some("/operator/orders?page=2"), "/operator/login").await,
            NavigationOutcome::redirect("/operator/orders?page=2", false)
        );
    }

    #[tokio::test]
    async fn test_whitelist_is_allowed_without_token() {
        let (guard, source) = guard(menus());
        assert!(matches!(
            guard.check(None, "/operator/403").await,
            NavigationOutcome::Allow { route: None, .. }
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_build_then_resolve() {
        let (guard, source) = guard(menus());
        guard.context().sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();
        assert_eq!(guard.state(), GuardState::AuthenticatedNoTable);

        assert_eq!(
            guard.check(None, "/operator/home/index").await,
            NavigationOutcome::redirect("/operator/home/index", true)
        );
        assert_eq!(guard.state(), GuardState::AuthenticatedReady);

        match guard.check(None, "/operator/home/index").await {
            NavigationOutcome::Allow { route: Some(route), .. } => assert_eq!(route.name, "home"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(guard.context().active_route().as_deref(), Some("home"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_and_fragment_survive_redispatch() {
        let (guard, _) = guard(menus());
        guard.context().sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();

        assert_eq!(
            guard.check(None, "/operator/home/index/?page=2#row5").await,
            NavigationOutcome::redirect("/operator/home/index?page=2#row5", true)
        );
        match guard.check(None, "/operator/home/index?page=2#row5").await {
            NavigationOutcome::Allow { path, route: Some(route) } => {
                assert_eq!(path, "/operator/home/index?page=2#row5");
                assert_eq!(route.name, "home");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_route_redirects_to_not_found() {
        let (guard, _) = guard(menus());
        guard.context().sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();
        guard.ensure_table().await.unwrap();

        assert_eq!(
            guard.check(None, "/operator/nowhere").await,
            NavigationOutcome::redirect("/operator/404", true)
        );
    }

    #[tokio::test]
    async fn test_unknown_route_aborts_without_not_found_page() {
        let context = Arc::new(AuthContext::new(
            NamespaceConfig::operator().with_not_found_path(None),
            Arc::new(MemoryKvStore::new()),
        ));
        context.sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();
        let source = Arc::new(StaticMenus {
            menus: menus(),
            calls: AtomicUsize::new(0),
        });
        let guard = NavigationGuard::new(context, source);
        guard.ensure_table().await.unwrap();

        assert_eq!(
            guard.check(None, "/operator/nowhere").await,
            NavigationOutcome::Abort(NavigationError::RouteNotFound("/operator/nowhere".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_menus_abort_and_leave_table_unregistered() {
        let (guard, source) = guard(Vec::new());
        guard.context().sign_in("t", PrincipalIdentity::new("1", "amy")).unwrap();

        let outcome = guard.check(None, "/operator/home/index").await;
        assert_eq!(
            outcome,
            NavigationOutcome::Abort(NavigationError::TableBuildFailed(BuildError::EmptyMenu))
        );
        assert_eq!(guard.state(), GuardState::AuthenticatedNoTable);

        // retry triggers a fresh build
        guard.check(None, "/operator/home/index").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
