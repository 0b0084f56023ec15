// console-guard/tests/capability_gate.rs
// 权限门集成测试

use async_trait::async_trait;
use console_guard::{
    AuthContext, CapabilityGate, GateDirective, GateRequirement, MemoryKvStore, MenuSource,
    NamespaceConfig, NavigationGuard, NavigationOutcome, PermissionStore, is_permitted,
};
use serde_json::json;
use shared::{AppResult, ErrorCode, MenuKind, MenuNode, PrincipalIdentity, TierValue};
use std::sync::Arc;

struct FinanceMenus;

#[async_trait]
impl MenuSource for FinanceMenus {
    async fn granted_menus(&self, _token: &str) -> AppResult<Vec<MenuNode>> {
        Ok(vec![
            MenuNode::new(1, "approve")
                .with_path("finance/approve")
                .with_children(vec![
                    MenuNode::new(2, "FINANCE_APPROVE").with_kind(MenuKind::Button),
                ]),
            MenuNode::new(3, "ledger")
                .with_path("finance/ledger")
                .with_button_codes(["LEDGER_EXPORT"]),
        ])
    }
}

async fn signed_in(tier: TierValue) -> (Arc<AuthContext>, NavigationGuard) {
    let context = Arc::new(AuthContext::new(
        NamespaceConfig::operator(),
        Arc::new(MemoryKvStore::new()),
    ));
    context
        .sign_in("token", PrincipalIdentity::new("7", "finance-clerk").with_tier(tier))
        .unwrap();
    let guard = NavigationGuard::new(context.clone(), Arc::new(FinanceMenus));
    guard.ensure_table().await.unwrap();
    (context, guard)
}

#[tokio::test]
async fn test_global_conjunction_removes_element() {
    let (context, _guard) = signed_in(TierValue::default()).await;
    let gate = CapabilityGate::new(context);

    let approve = gate.mount(&GateRequirement::global("FINANCE_APPROVE"), || "approve-button");
    assert_eq!(approve, Some("approve-button"));

    let both = gate.mount(
        &GateRequirement::global(["FINANCE_APPROVE", "FINANCE_RECHARGE"]),
        || "approve-and-recharge-button",
    );
    assert_eq!(both, None);
}

#[tokio::test]
async fn test_page_mode_follows_active_route() {
    let (context, guard) = signed_in(TierValue::default()).await;
    let gate = CapabilityGate::new(context.clone());
    let export = GateRequirement::page("LEDGER_EXPORT");

    // nothing navigated yet
    assert!(!gate.check(&export));

    assert!(matches!(
        guard.check(None, "/operator/finance/ledger").await,
        NavigationOutcome::Allow { .. }
    ));
    assert!(gate.check(&export));

    assert!(matches!(
        guard.check(None, "/operator/finance/approve").await,
        NavigationOutcome::Allow { .. }
    ));
    assert!(!gate.check(&export));
    assert!(gate.check(&GateRequirement::page("FINANCE_APPROVE")));
}

#[tokio::test]
async fn test_level_mode_with_label_tier() {
    let (context, _guard) = signed_in(TierValue::from("v2")).await;
    let gate = CapabilityGate::new(context);

    let directive: GateDirective = serde_json::from_value(json!({"mode": "level", "value": 1})).unwrap();
    let requirement = directive.into_requirement().unwrap();
    assert_eq!(gate.mount(&requirement, || "vip-panel"), Some("vip-panel"));

    assert!(!gate.check(&GateRequirement::level(3)));
}

#[tokio::test]
async fn test_require_reports_denial_kind() {
    let (context, _guard) = signed_in(TierValue::from("v1")).await;
    let gate = CapabilityGate::new(context);

    assert!(gate.require(&GateRequirement::global("LEDGER_EXPORT")).is_ok());
    assert_eq!(
        gate.require(&GateRequirement::global("ORDER_VOID")).unwrap_err().code,
        ErrorCode::PermissionDenied
    );

    let err = gate.require(&GateRequirement::level(3)).unwrap_err();
    assert_eq!(err.code, ErrorCode::TierTooLow);
    assert_eq!(err.message, "Tier 3 required, principal has 1");
}

#[tokio::test]
async fn test_retain_filters_render_list() {
    let (context, _guard) = signed_in(TierValue::from(1u32)).await;
    let gate = CapabilityGate::new(context);

    let rendered = gate.retain(vec![
        (GateRequirement::global("LEDGER_EXPORT"), "export"),
        (GateRequirement::global("ORDER_VOID"), "void"),
        (GateRequirement::level(1), "tier-one"),
        (GateRequirement::level(2), "tier-two"),
    ]);
    assert_eq!(rendered, vec!["export", "tier-one"]);
}

#[tokio::test]
async fn test_signed_out_context_denies_codes() {
    let (context, _guard) = signed_in(TierValue::default()).await;
    let gate = CapabilityGate::new(context.clone());
    context.sign_out().unwrap();

    assert!(!gate.check(&GateRequirement::global("FINANCE_APPROVE")));
    assert!(gate.check(&GateRequirement::global(Vec::<String>::new())));
}

#[test]
fn test_predicate_without_context() {
    let store = PermissionStore::new();
    store.load(&[MenuNode::new(1, "orders").with_button_codes(["ORDER_VIEW"])]);

    let tier = TierValue::default();
    assert!(is_permitted(&store, &GateRequirement::page("ORDER_VIEW"), Some("orders"), &tier));
    assert!(!is_permitted(&store, &GateRequirement::page("ORDER_VIEW"), Some("other"), &tier));
}
