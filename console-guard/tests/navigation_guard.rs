// console-guard/tests/navigation_guard.rs
// 导航守卫集成测试

use async_trait::async_trait;
use console_guard::{
    AuthContext, BuildError, ConsoleState, GuardConfig, GuardState, MemoryKvStore, MenuSource,
    NamespaceConfig, NamespaceKind, NavigationError, NavigationEvent, NavigationGuard,
    NavigationOutcome, RecordingObserver, ViewRegistry,
};
use shared::{AppError, AppResult, MenuKind, MenuNode, PrincipalIdentity};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Menu source that counts calls and can be held until released
struct GatedMenus {
    menus: Vec<MenuNode>,
    calls: AtomicUsize,
    hold: AtomicBool,
    release: Notify,
    failure: Mutex<Option<AppError>>,
}

impl GatedMenus {
    fn new(menus: Vec<MenuNode>) -> Arc<Self> {
        Arc::new(Self {
            menus,
            calls: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
            release: Notify::new(),
            failure: Mutex::new(None),
        })
    }

    fn held(menus: Vec<MenuNode>) -> Arc<Self> {
        let source = Self::new(menus);
        source.hold.store(true, Ordering::SeqCst);
        source
    }

    fn fail_with(&self, error: Option<AppError>) {
        *self.failure.lock().unwrap() = error;
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MenuSource for GatedMenus {
    async fn granted_menus(&self, _token: &str) -> AppResult<Vec<MenuNode>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.menus.clone())
    }
}

fn operator_menus() -> Vec<MenuNode> {
    vec![
        MenuNode::new(1, "home")
            .with_path("home/index")
            .with_component("home/index"),
        MenuNode::new(2, "finance")
            .with_kind(MenuKind::Catalog)
            .with_children(vec![
                MenuNode::new(3, "recharge")
                    .with_component("finance/recharge")
                    .with_button_codes(["FINANCE_RECHARGE"]),
                MenuNode::new(4, "approve")
                    .with_component("finance/approve")
                    .hidden(),
            ]),
    ]
}

fn operator_guard(source: Arc<GatedMenus>) -> NavigationGuard {
    let context = Arc::new(AuthContext::new(
        NamespaceConfig::operator(),
        Arc::new(MemoryKvStore::new()),
    ));
    NavigationGuard::new(context, source)
}

fn amy() -> PrincipalIdentity {
    PrincipalIdentity::new("1", "amy")
}

#[tokio::test]
async fn test_no_token_always_redirects_to_login() {
    let source = GatedMenus::new(operator_menus());
    let guard = operator_guard(source.clone());

    let froms = [None, Some("/operator/home/index"), Some("/operator/login"), Some("/enduser/index")];
    let targets = ["/operator/home/index", "/operator/finance/recharge", "/operator/anything/at/all"];

    for from in froms {
        for to in targets {
            assert_eq!(
                guard.check(from, to).await,
                NavigationOutcome::Redirect {
                    to: "/operator/login".into(),
                    replace: false
                },
                "from {from:?} to {to}"
            );
        }
    }
    assert_eq!(guard.state(), GuardState::Unauthenticated);
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn test_exactly_one_build_then_replace() {
    let source = GatedMenus::new(operator_menus());
    let guard = operator_guard(source.clone());
    guard.context().sign_in("token", amy()).unwrap();

    let first = guard.check(Some("/operator/home/index"), "/operator/finance/recharge").await;
    assert_eq!(
        first,
        NavigationOutcome::Redirect {
            to: "/operator/finance/recharge".into(),
            replace: true
        }
    );

    let second = guard.check(Some("/operator/home/index"), "/operator/finance/recharge").await;
    assert!(matches!(
        second,
        NavigationOutcome::Allow { route: Some(ref route), .. } if route.name == "recharge"
    ));

    // hidden routes are still navigable
    assert!(matches!(
        guard.check(None, "/operator/finance/approve").await,
        NavigationOutcome::Allow { route: Some(_), .. }
    ));
    assert_eq!(source.calls(), 1);
    assert!(guard.context().permissions().has_route_code("recharge", "FINANCE_RECHARGE"));
}

#[tokio::test]
async fn test_concurrent_navigations_share_one_build() {
    let source = GatedMenus::held(operator_menus());
    let guard = operator_guard(source.clone());
    guard.context().sign_in("token", amy()).unwrap();

    let (a, b, ()) = tokio::join!(
        guard.check(None, "/operator/home/index"),
        guard.check(None, "/operator/finance/recharge"),
        async {
            tokio::task::yield_now().await;
            source.release.notify_one();
        }
    );

    assert_eq!(
        a,
        NavigationOutcome::Redirect {
            to: "/operator/home/index".into(),
            replace: true
        }
    );
    assert_eq!(
        b,
        NavigationOutcome::Redirect {
            to: "/operator/finance/recharge".into(),
            replace: true
        }
    );
    assert_eq!(source.calls(), 1);
    assert_eq!(guard.state(), GuardState::AuthenticatedReady);
}

#[tokio::test]
async fn test_logout_during_build_discards_late_result() {
    let source = GatedMenus::held(operator_menus());
    let guard = operator_guard(source.clone());
    let context = guard.context().clone();
    context.sign_in("token", amy()).unwrap();

    let (outcome, ()) = tokio::join!(guard.check(None, "/operator/home/index"), async {
        tokio::task::yield_now().await;
        context.sign_out().unwrap();
        source.release.notify_one();
    });

    assert_eq!(
        outcome,
        NavigationOutcome::Redirect {
            to: "/operator/login".into(),
            replace: false
        }
    );
    assert!(!context.permissions().is_loaded());
    assert!(!context.permissions().has_route_code("recharge", "FINANCE_RECHARGE"));
    assert!(!context.routes().is_registered());
    assert_eq!(guard.state(), GuardState::Unauthenticated);
}

#[tokio::test]
async fn test_relogin_during_build_rebuilds_for_new_session() {
    let source = GatedMenus::held(operator_menus());
    let guard = operator_guard(source.clone());
    let context = guard.context().clone();
    context.sign_in("first", amy()).unwrap();

    let (outcome, ()) = tokio::join!(guard.check(None, "/operator/home/index"), async {
        tokio::task::yield_now().await;
        context.sign_in("second", amy()).unwrap();
        source.release.notify_one();
    });

    // the stale build is dropped and the navigation is re-dispatched
    assert_eq!(
        outcome,
        NavigationOutcome::Redirect {
            to: "/operator/home/index".into(),
            replace: true
        }
    );
    assert!(!context.routes().is_registered());

    source.hold.store(false, Ordering::SeqCst);
    guard.check(None, "/operator/home/index").await;
    assert_eq!(source.calls(), 2);
    assert_eq!(guard.state(), GuardState::AuthenticatedReady);
}

#[tokio::test]
async fn test_failed_fetch_aborts_with_retryable_error() {
    let source = GatedMenus::new(operator_menus());
    source.fail_with(Some(AppError::internal("menu service unavailable")));
    let guard = operator_guard(source.clone());
    guard.context().sign_in("token", amy()).unwrap();

    match guard.check(None, "/operator/home/index").await {
        NavigationOutcome::Abort(NavigationError::TableBuildFailed(e)) => {
            assert!(matches!(e, BuildError::FetchFailed(_)));
            assert!(e.is_retryable());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(guard.state(), GuardState::AuthenticatedNoTable);

    // the next navigation tries again
    source.fail_with(None);
    assert!(matches!(
        guard.check(None, "/operator/home/index").await,
        NavigationOutcome::Redirect { replace: true, .. }
    ));
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_rejected_token_ends_session() {
    let source = GatedMenus::new(operator_menus());
    source.fail_with(Some(AppError::token_expired()));
    let guard = operator_guard(source.clone());
    guard.context().sign_in("revoked", amy()).unwrap();

    assert_eq!(
        guard.check(None, "/operator/home/index").await,
        NavigationOutcome::Redirect {
            to: "/operator/login".into(),
            replace: false
        }
    );
    assert!(!guard.context().session().has_token());
    assert_eq!(guard.state(), GuardState::Unauthenticated);

    // the login page is reachable again instead of bouncing back
    assert!(matches!(
        guard.check(None, "/operator/login").await,
        NavigationOutcome::Allow { route: None, .. }
    ));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_redispatch_keeps_query_and_fragment() {
    let source = GatedMenus::new(operator_menus());
    let guard = operator_guard(source.clone());
    guard.context().sign_in("token", amy()).unwrap();

    assert_eq!(
        guard.check(None, "/operator/finance/recharge?page=2#row5").await,
        NavigationOutcome::Redirect {
            to: "/operator/finance/recharge?page=2#row5".into(),
            replace: true
        }
    );
    assert!(matches!(
        guard.check(None, "/operator/finance/recharge?page=2#row5").await,
        NavigationOutcome::Allow { ref path, route: Some(_) } if path == "/operator/finance/recharge?page=2#row5"
    ));

    assert_eq!(
        guard.check(Some("/operator/finance/recharge?page=2"), "/operator/login").await,
        NavigationOutcome::Redirect {
            to: "/operator/finance/recharge?page=2".into(),
            replace: false
        }
    );
}

#[tokio::test]
async fn test_expired_token_is_signed_out() {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

    let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"1","exp":1000}"#);
    let token = format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig");

    let source = GatedMenus::new(operator_menus());
    let guard = operator_guard(source.clone());
    guard.context().sign_in(token, amy()).unwrap();

    assert_eq!(
        guard.check(None, "/operator/home/index").await,
        NavigationOutcome::Redirect {
            to: "/operator/login".into(),
            replace: false
        }
    );
    assert!(!guard.context().session().has_token());
    assert_eq!(source.calls(), 0);
}

fn console(source: Arc<GatedMenus>, observer: Arc<RecordingObserver>) -> ConsoleState {
    let views = Arc::new(ViewRegistry::with_views(["home/index", "finance/recharge"]));
    ConsoleState::with_stores(
        GuardConfig::default(),
        Arc::new(MemoryKvStore::new()),
        Arc::new(MemoryKvStore::new()),
        source,
        views,
        observer,
    )
    .unwrap()
}

#[tokio::test]
async fn test_tokens_do_not_cross_namespaces() {
    let observer = Arc::new(RecordingObserver::new());
    let state = console(GatedMenus::new(operator_menus()), observer);
    state
        .context(NamespaceKind::Operator)
        .sign_in("operator-token", amy())
        .unwrap();

    let report = state.navigate(None, "/enduser/orders").await;
    assert_eq!(report.path(), Some("/enduser/login"));
    assert!(!state.context(NamespaceKind::EndUser).routes().is_registered());

    let report = state.navigate(None, "/operator/home/index").await;
    assert_eq!(report.path(), Some("/operator/home/index"));
}

#[tokio::test]
async fn test_view_load_failure_reaches_observer() {
    let observer = Arc::new(RecordingObserver::new());
    let state = console(GatedMenus::new(operator_menus()), observer.clone());
    state
        .context(NamespaceKind::Operator)
        .sign_in("operator-token", amy())
        .unwrap();

    let report = state.navigate(None, "/operator/finance/approve").await;
    assert!(matches!(report.error(), Some(NavigationError::ViewLoadFailed { .. })));
    assert!(matches!(
        observer.events().last(),
        Some(NavigationEvent::Failed { error: NavigationError::ViewLoadFailed { .. }, .. })
    ));

    // the guard keeps working afterwards
    let report = state.navigate(None, "/operator/home/index").await;
    assert!(report.is_completed());
}

#[tokio::test]
async fn test_unknown_namespace_is_reported() {
    let observer = Arc::new(RecordingObserver::new());
    let state = console(GatedMenus::new(operator_menus()), observer.clone());

    let report = state.navigate(None, "/nowhere").await;
    assert_eq!(
        report.error(),
        Some(&NavigationError::UnknownNamespace("/nowhere".into()))
    );
    assert_eq!(observer.failures().len(), 1);
}
