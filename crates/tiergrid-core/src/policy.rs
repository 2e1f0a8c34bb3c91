//! Per-resource-class revalidation policy.

use std::time::Duration;

/// Controls when a cached entry may be refetched after its first load.
///
/// The flags gate *triggers*; the single-flight and dedup-window guarantees
/// of the store hold regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevalidationPolicy {
    pub revalidate_on_focus: bool,
    pub revalidate_on_reconnect: bool,
    pub revalidate_if_stale: bool,
    /// Whether a later request for a key in the Error state starts a new
    /// fetch episode. The bounded backoff inside the fetch primitive has
    /// already run by the time an entry reaches Error.
    pub retry_on_error: bool,
}

impl Default for RevalidationPolicy {
    fn default() -> Self {
        Self {
            revalidate_on_focus: true,
            revalidate_on_reconnect: true,
            revalidate_if_stale: true,
            retry_on_error: true,
        }
    }
}

impl RevalidationPolicy {
    /// Static data: fetched once per session, never revalidated, but a
    /// failed first load may be retried.
    pub fn static_resource() -> Self {
        Self {
            revalidate_on_focus: false,
            revalidate_on_reconnect: false,
            revalidate_if_stale: false,
            retry_on_error: true,
        }
    }

    /// Volatile-but-bounded data (per-scenario tiers): no focus/reconnect
    /// churn, staleness still refetches after the dedup window.
    pub fn scenario_tiers() -> Self {
        Self {
            revalidate_on_focus: false,
            revalidate_on_reconnect: false,
            revalidate_if_stale: true,
            retry_on_error: true,
        }
    }
}

/// Staleness thresholds paired with a policy by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleConfig {
    /// Age beyond which a Ready entry is considered stale for
    /// `revalidate_if_stale`.
    pub stale_after: Duration,
}

impl Default for StaleConfig {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(300),
        }
    }
}
