//! Endpoint and cache-key registry.
//!
//! Pure identity mapping: each logical resource resolves to exactly one wire
//! path and one cache key, generated from the same source so the two can
//! never diverge. For API resources the cache key *is* the API-relative path;
//! the base-URL rule in [`resolve_url`] decides at request time whether a
//! path gets the configured API origin prepended.

use std::fmt::{Display, Formatter};

use crate::domain::ScenarioId;

/// Path prefix that marks a key as belonging to the remote scenario API.
pub const API_PREFIX: &str = "/api/";

/// Logical resource identity. Defined here once; callers never build wire
/// paths by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    TierList,
    ScenarioList,
    ScenarioTiers(ScenarioId),
    /// Local static JSON asset (e.g. geographic data), addressed verbatim.
    Asset(String),
}

impl Resource {
    /// Wire path for this resource, relative to the configured API origin
    /// for API resources and absolute for assets.
    pub fn path(&self) -> String {
        match self {
            Self::TierList => String::from("/api/tiers"),
            Self::ScenarioList => String::from("/api/scenarios"),
            Self::ScenarioTiers(id) => format!("/api/scenarios/{id}/tiers"),
            Self::Asset(path) => path.clone(),
        }
    }

    /// Cache key for this resource. Identical to [`Resource::path`] by
    /// construction, which is the registry's isomorphism invariant.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::Path(self.path())
    }
}

/// Unique identifier for a cacheable fetch result.
///
/// Batch results have no single scalar path, so their key is the ordered id
/// sequence itself; identity is structural, two batches are the same entry
/// only if their id lists match element for element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Path(String),
    Batch {
        marker: &'static str,
        ids: Vec<ScenarioId>,
    },
}

impl CacheKey {
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Key for a fan-out fetch over the given scenario ids.
    pub fn scenario_tiers_batch(ids: Vec<ScenarioId>) -> Self {
        Self::Batch {
            marker: "scenario-tiers",
            ids,
        }
    }
}

impl Display for CacheKey {
    // Display form is for logging only; map identity is structural.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Batch { marker, ids } => {
                write!(f, "{marker}:[")?;
                for (index, id) in ids.iter().enumerate() {
                    if index > 0 {
                        f.write_str(",")?;
                    }
                    f.write_str(id.as_str())?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Whether a path belongs to the remote scenario API.
pub fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

/// Resolve the request URL for a path.
///
/// API paths get the configured origin prepended; absolute URLs and local
/// asset paths are used verbatim. Evaluated once per request, never cached.
pub fn resolve_url(api_base: &str, path: &str) -> String {
    if is_api_path(path) && !api_base.is_empty() {
        format!("{api_base}{path}")
    } else {
        path.to_string()
    }
}
