//! Domain payload schemas validated at the fetch boundary.

mod scenario;
mod tiers;

pub use scenario::{Scenario, ScenarioId, ScenarioList};
pub use tiers::{ScenarioTiers, Tier, TierList, TierValue};
