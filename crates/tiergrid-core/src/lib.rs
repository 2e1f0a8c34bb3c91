//! # Tiergrid Core
//!
//! Resilient data-access layer for the tiergrid scenario explorer: fetches
//! JSON resources (remote scenario API and local static assets), retries
//! transient failures, deduplicates concurrent requests per cache key, and
//! exposes results through a stale-aware cache with per-resource
//! revalidation policy.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Typed resource fetchers (tier list, scenarios, fan-out batches, static assets) |
//! | [`domain`] | Payload schemas (`ScenarioId`, tier sum types) validated at the fetch boundary |
//! | [`endpoints`] | Endpoint/cache-key registry and base-URL resolution |
//! | [`error`] | Failure taxonomy with retryability classification |
//! | [`fetch`] | Fetch primitive: deadline, classification, backoff retry loop |
//! | [`http_client`] | HTTP transport seam (reqwest and scripted test transports) |
//! | [`policy`] | Per-resource revalidation policy |
//! | [`retry`] | Backoff strategies and retry budgets |
//! | [`store`] | Cache/revalidation coordinator with single-flight dedup |
//! | [`views`] | Memoized derived views over cached data |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiergrid_core::{
//!     QueryStore, Resource, RevalidationPolicy, ReqwestHttpClient, ScenarioApi, StoreConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let api = ScenarioApi::new(Arc::new(ReqwestHttpClient::new()), "https://api.example.org");
//!     let store = QueryStore::new(StoreConfig::default());
//!
//!     let api_for_store = api.clone();
//!     let snapshot = store
//!         .fetch(
//!             Some(Resource::TierList.cache_key()),
//!             RevalidationPolicy::static_resource(),
//!             move || {
//!                 let api = api_for_store.clone();
//!                 async move {
//!                     api.tier_list()
//!                         .await
//!                         .and_then(|list| {
//!                             serde_json::to_value(list).map_err(|e| {
//!                                 tiergrid_core::FetchError::decode("/api/tiers", e.to_string())
//!                             })
//!                         })
//!                 }
//!             },
//!         )
//!         .await;
//!
//!     if let Some(message) = snapshot.error_message() {
//!         eprintln!("tier list unavailable: {message}");
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │   UI consumers    │   (out of scope)
//! └─────────┬─────────┘
//!           │ snapshots
//!           ▼
//! ┌───────────────────┐     ┌──────────────────┐
//! │  DerivedView      │────▶│  QueryStore      │  single-flight, dedup,
//! │  (memoized)       │     │  (per-key FSM)   │  revalidation triggers
//! └───────────────────┘     └────────┬─────────┘
//!                                    │ fetchers
//!                                    ▼
//! ┌───────────────────┐     ┌──────────────────┐
//! │  Endpoint/Key     │────▶│  ScenarioApi     │  typed per-resource
//! │  registry         │     │  (fetchers)      │  composition
//! └───────────────────┘     └────────┬─────────┘
//!                                    ▼
//!                           ┌──────────────────┐     ┌─────────────────┐
//!                           │  JsonFetcher     │────▶│  HttpClient     │
//!                           │  (retry/timeout) │     │  (reqwest/test) │
//!                           └──────────────────┘     └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Only the fetch primitive retries; every layer above it propagates the
//! terminal [`FetchError`] unchanged. A failure is scoped to its cache key's
//! state and never affects other keys.

pub mod api;
pub mod domain;
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod policy;
pub mod retry;
pub mod store;
pub mod views;

pub use api::ScenarioApi;
pub use domain::{Scenario, ScenarioId, ScenarioList, ScenarioTiers, Tier, TierList, TierValue};
pub use endpoints::{is_api_path, resolve_url, CacheKey, Resource, API_PREFIX};
pub use error::{FetchError, FetchErrorKind, ValidationError};
pub use fetch::{FetchOptions, JsonFetcher};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, ScriptedHttpClient,
    ScriptedReply,
};
pub use policy::{RevalidationPolicy, StaleConfig};
pub use retry::{Backoff, RetryConfig};
pub use store::{QuerySnapshot, QueryState, QueryStore, StoreConfig};
pub use views::{tier_display_names, DerivedView};
