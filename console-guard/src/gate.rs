//! CapabilityGate - 按钮级权限控制
//!
//! Decides whether a renderable element is constructed at all.
//!
//! ## 模式
//! - `page` (默认): 当前路由的按钮码
//! - `global`: 全部已授权按钮码的并集
//! - `level`: 用户等级 >= 要求等级
//!
//! A denied element is never built, so it has no handlers that could fire.
//! The decision is taken once when the element mounts; permission changes
//! afterwards are not picked up until the next render pass.

use serde::{Deserialize, Serialize};
use shared::{AppError, AppResult, TierValue};
use std::sync::Arc;

use crate::context::AuthContext;
use crate::permission::{PermissionStore, RequiredCodes};

/// Which check a gate applies; always explicit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    #[default]
    Page,
    Global,
    Level,
}

/// A resolved gate requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRequirement {
    Page(RequiredCodes),
    Global(RequiredCodes),
    Level(u32),
}

impl GateRequirement {
    pub fn page(codes: impl Into<RequiredCodes>) -> Self {
        GateRequirement::Page(codes.into())
    }

    pub fn global(codes: impl Into<RequiredCodes>) -> Self {
        GateRequirement::Global(codes.into())
    }

    pub fn level(required: u32) -> Self {
        GateRequirement::Level(required)
    }

    pub fn mode(&self) -> GateMode {
        match self {
            GateRequirement::Page(_) => GateMode::Page,
            GateRequirement::Global(_) => GateMode::Global,
            GateRequirement::Level(_) => GateMode::Level,
        }
    }
}

/// Gate as written at the point of use, e.g. `{"mode": "global", "value": ["A", "B"]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDirective {
    #[serde(default)]
    pub mode: GateMode,
    pub value: serde_json::Value,
}

impl GateDirective {
    pub fn into_requirement(self) -> Result<GateRequirement, AppError> {
        let invalid = |e: serde_json::Error| AppError::validation(format!("invalid gate value: {}", e));
        Ok(match self.mode {
            GateMode::Page => GateRequirement::Page(serde_json::from_value(self.value).map_err(invalid)?),
            GateMode::Global => GateRequirement::Global(serde_json::from_value(self.value).map_err(invalid)?),
            GateMode::Level => {
                let tier: TierValue = serde_json::from_value(self.value).map_err(invalid)?;
                GateRequirement::Level(tier.ordinal())
            }
        })
    }
}

/// Pure capability check
///
/// `page` without an active route is denied.
pub fn is_permitted(
    store: &PermissionStore,
    requirement: &GateRequirement,
    current_route: Option<&str>,
    tier: &TierValue,
) -> bool {
    match requirement {
        GateRequirement::Page(codes) => {
            current_route.is_some_and(|route| store.has_route_code(route, codes.clone()))
        }
        GateRequirement::Global(codes) => store.has_global_code(codes.clone()),
        GateRequirement::Level(required) => tier.ordinal() >= *required,
    }
}

/// 权限门 - bound to one namespace's context
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    context: Arc<AuthContext>,
}

impl CapabilityGate {
    pub fn new(context: Arc<AuthContext>) -> Self {
        Self { context }
    }

    pub fn check(&self, requirement: &GateRequirement) -> bool {
        let route = self.context.active_route();
        let permitted = is_permitted(
            self.context.permissions(),
            requirement,
            route.as_deref(),
            &self.context.tier(),
        );
        if !permitted {
            tracing::trace!(mode = ?requirement.mode(), route = ?route, "Capability denied");
        }
        permitted
    }

    /// [`check`](Self::check) as an error for hosts guarding an action
    /// rather than an element
    pub fn require(&self, requirement: &GateRequirement) -> AppResult<()> {
        if self.check(requirement) {
            return Ok(());
        }
        Err(match requirement {
            GateRequirement::Level(required) => AppError::tier_too_low(*required, self.context.tier().ordinal()),
            GateRequirement::Page(codes) | GateRequirement::Global(codes) => {
                AppError::permission_denied(format!("requires {}", codes.codes().join(", ")))
            }
        })
    }

    /// Construct `element` only when permitted
    pub fn mount<T>(&self, requirement: &GateRequirement, element: impl FnOnce() -> T) -> Option<T> {
        self.check(requirement).then(element)
    }

    /// Drop denied elements from a render list
    pub fn retain<T>(&self, elements: Vec<(GateRequirement, T)>) -> Vec<T> {
        elements
            .into_iter()
            .filter_map(|(requirement, element)| self.check(&requirement).then_some(element))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::MenuNode;

    fn store() -> PermissionStore {
        let store = PermissionStore::new();
        store.load(&[
            MenuNode::new(1, "orders").with_button_codes(["ORDER_VIEW", "ORDER_EDIT"]),
            MenuNode::new(2, "finance").with_button_codes(["FINANCE_APPROVE"]),
        ]);
        store
    }

    #[test]
    fn test_page_mode_uses_current_route() {
        let store = store();
        let req = GateRequirement::page(["ORDER_VIEW", "ORDER_EDIT"]);
        let tier = TierValue::default();

        assert!(is_permitted(&store, &req, Some("orders"), &tier));
        assert!(!is_permitted(&store, &req, Some("finance"), &tier));
        assert!(!is_permitted(&store, &req, None, &tier));
    }

    #[test]
    fn test_global_mode_is_conjunctive() {
        let store = store();
        let tier = TierValue::default();

        assert!(is_permitted(&store, &GateRequirement::global("FINANCE_APPROVE"), None, &tier));
        assert!(!is_permitted(
            &store,
            &GateRequirement::global(["FINANCE_APPROVE", "FINANCE_RECHARGE"]),
            None,
            &tier
        ));
    }

    #[test]
    fn test_level_mode() {
        let store = PermissionStore::new();
        let req = GateRequirement::level(1);

        assert!(is_permitted(&store, &req, None, &TierValue::from("v2")));
        assert!(is_permitted(&store, &req, None, &TierValue::from(1u32)));
        assert!(!is_permitted(&store, &req, None, &TierValue::from("gold")));
        assert!(!is_permitted(&store, &req, None, &TierValue::Level(0)));
    }

    #[test]
    fn test_directive_parsing() {
        let directive: GateDirective = serde_json::from_value(json!({"value": "ORDER_VIEW"})).unwrap();
        assert_eq!(directive.into_requirement().unwrap(), GateRequirement::page("ORDER_VIEW"));

        let directive: GateDirective =
            serde_json::from_value(json!({"mode": "global", "value": ["A", "B"]})).unwrap();
        assert_eq!(directive.into_requirement().unwrap(), GateRequirement::global(["A", "B"]));

        let directive: GateDirective = serde_json::from_value(json!({"mode": "level", "value": "v3"})).unwrap();
        assert_eq!(directive.into_requirement().unwrap(), GateRequirement::level(3));

        let directive: GateDirective = serde_json::from_value(json!({"mode": "page", "value": 5})).unwrap();
        assert!(directive.into_requirement().is_err());
    }
}
