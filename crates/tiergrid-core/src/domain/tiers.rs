use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ScenarioId;

/// Tier payload value, tagged by kind.
///
/// Some tiers report a single number per scenario, others a series; the tag
/// makes the shape explicit instead of sniffing the JSON at use sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierValue {
    Single { value: f64 },
    Multi { values: Vec<f64> },
}

impl TierValue {
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single { .. })
    }
}

/// Tier descriptor from the tier list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub code: String,
    pub name: String,
}

/// Whole-document response of the tier list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierList {
    pub tiers: Vec<Tier>,
}

/// Per-scenario tier detail: tier code to value for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTiers {
    pub scenario: ScenarioId,
    pub tiers: BTreeMap<String, TierValue>,
}
