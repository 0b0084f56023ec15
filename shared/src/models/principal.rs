//! Principal identity and tier

use serde::{Deserialize, Serialize};

/// Tier labels accepted in place of a numeric tier
pub const TIER_LABELS: &[(&str, u32)] = &[("v0", 0), ("v1", 1), ("v2", 2), ("v3", 3)];

/// Principal tier as delivered by the backend: a number or a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TierValue {
    Level(i64),
    Label(String),
}

impl TierValue {
    /// Ordinal value; unknown labels and negative levels map to 0, levels
    /// past `u32::MAX` saturate
    pub fn ordinal(&self) -> u32 {
        match self {
            TierValue::Level(level) => u32::try_from((*level).max(0)).unwrap_or(u32::MAX),
            TierValue::Label(label) => {
                let label = label.trim().to_ascii_lowercase();
                TIER_LABELS
                    .iter()
                    .find(|(name, _)| *name == label)
                    .map(|(_, ordinal)| *ordinal)
                    .unwrap_or(0)
            }
        }
    }
}

impl Default for TierValue {
    fn default() -> Self {
        TierValue::Level(0)
    }
}

impl From<u32> for TierValue {
    fn from(level: u32) -> Self {
        TierValue::Level(i64::from(level))
    }
}

impl From<&str> for TierValue {
    fn from(label: &str) -> Self {
        TierValue::Label(label.to_string())
    }
}

/// Authenticated principal record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalIdentity {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub tier: TierValue,
}

impl PrincipalIdentity {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            display_name: None,
            tier: TierValue::default(),
        }
    }

    pub fn with_tier(mut self, tier: impl Into<TierValue>) -> Self {
        self.tier = tier.into();
        self
    }
}
