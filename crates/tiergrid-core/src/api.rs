//! Typed resource fetchers for the scenario API and local static assets.
//!
//! Each fetcher is a thin composition: resolve the endpoint through the
//! registry, call the fetch primitive, deserialize into the domain schema.
//! Failures propagate unchanged; nothing here retries or recovers locally.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::de::DeserializeOwned;

use crate::domain::{ScenarioId, ScenarioList, ScenarioTiers, TierList};
use crate::endpoints::{resolve_url, Resource};
use crate::error::FetchError;
use crate::fetch::{FetchOptions, JsonFetcher};
use crate::http_client::HttpClient;
use crate::retry::RetryConfig;

/// Client for the scenario API.
///
/// Holds the configured API origin separately from the fetch primitive: the
/// base-URL rule is applied per request from the resource's path, so API
/// paths get the origin prepended while asset paths pass through verbatim.
#[derive(Clone)]
pub struct ScenarioApi {
    fetcher: JsonFetcher,
    api_base: String,
}

impl ScenarioApi {
    pub fn new(http: Arc<dyn HttpClient>, api_base: impl Into<String>) -> Self {
        Self::with_options(http, api_base, FetchOptions::default())
    }

    pub fn with_options(
        http: Arc<dyn HttpClient>,
        api_base: impl Into<String>,
        options: FetchOptions,
    ) -> Self {
        // The primitive sees fully resolved URLs; its own base stays empty.
        let options = options.with_base_url("");
        Self {
            fetcher: JsonFetcher::new(http, options),
            api_base: api_base.into(),
        }
    }

    async fn fetch_resource<T: DeserializeOwned>(
        &self,
        resource: &Resource,
    ) -> Result<T, FetchError> {
        let url = resolve_url(&self.api_base, &resource.path());
        self.fetcher.fetch(&url).await
    }

    /// List of known tiers.
    pub async fn tier_list(&self) -> Result<TierList, FetchError> {
        self.fetch_resource(&Resource::TierList).await
    }

    /// List of selectable scenarios.
    pub async fn scenario_list(&self) -> Result<ScenarioList, FetchError> {
        self.fetch_resource(&Resource::ScenarioList).await
    }

    /// Tier detail for one scenario.
    pub async fn scenario_tiers(&self, id: &ScenarioId) -> Result<ScenarioTiers, FetchError> {
        self.fetch_resource(&Resource::ScenarioTiers(id.clone()))
            .await
    }

    /// Fan-out fetch of tier detail for several scenarios, all-or-nothing.
    ///
    /// Member fetches run concurrently with no cap and are all awaited; a
    /// failing member does not cancel its siblings, but any failure fails the
    /// whole batch with the first member error in id order. Callers needing
    /// partial tolerance use [`ScenarioApi::scenario_tiers_partial`].
    pub async fn scenario_tiers_batch(
        &self,
        ids: &[ScenarioId],
    ) -> Result<BTreeMap<ScenarioId, ScenarioTiers>, FetchError> {
        let results = join_all(ids.iter().map(|id| self.scenario_tiers(id))).await;

        let mut batch = BTreeMap::new();
        let mut first_error = None;
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(tiers) => {
                    batch.insert(id.clone(), tiers);
                }
                Err(err) => {
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(batch),
        }
    }

    /// Tolerant variant of the fan-out fetch: every id gets its own result.
    pub async fn scenario_tiers_partial(
        &self,
        ids: &[ScenarioId],
    ) -> BTreeMap<ScenarioId, Result<ScenarioTiers, FetchError>> {
        let results = join_all(ids.iter().map(|id| self.scenario_tiers(id))).await;
        ids.iter().cloned().zip(results).collect()
    }

    /// Local static JSON asset: same fetch semantics minus retry.
    pub async fn static_asset<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = resolve_url(&self.api_base, path);
        self.fetcher
            .fetch_with_retry(&url, RetryConfig::no_retry())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{ScriptedHttpClient, ScriptedReply};

    fn api(client: &ScriptedHttpClient) -> ScenarioApi {
        ScenarioApi::new(Arc::new(client.clone()), "https://api.example.test")
    }

    #[tokio::test]
    async fn tier_list_deserializes_into_domain_schema() {
        let client = ScriptedHttpClient::with_replies([ScriptedReply::ok(
            r#"{"tiers":[{"code":"co2","name":"CO2 intensity"}]}"#,
        )]);

        let list = api(&client).tier_list().await.expect("tier list");
        assert_eq!(list.tiers.len(), 1);
        assert_eq!(list.tiers[0].code, "co2");
    }

    #[tokio::test]
    async fn schema_violations_surface_as_decode_failures() {
        let client =
            ScriptedHttpClient::with_replies([ScriptedReply::ok(r#"{"tiers":"not-a-list"}"#)]);

        let err = api(&client).tier_list().await.expect_err("must fail");
        assert_eq!(err.kind(), crate::FetchErrorKind::Decode);
    }

    #[tokio::test]
    async fn static_assets_do_not_retry() {
        let client = ScriptedHttpClient::with_replies([ScriptedReply::status(503)]);

        let err = api(&client)
            .static_asset::<serde_json::Value>("/data/regions.geo.json")
            .await
            .expect_err("must fail");
        assert_eq!(err.status(), 503);
        assert_eq!(client.calls(), 1);
    }
}
