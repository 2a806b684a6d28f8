// src/catalog/client.rs
use futures::stream::{self, StreamExt};
use metrics::counter;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiKey, CatalogQuery, EndpointTemplate, FetchError, JsonFetcher, RawCatalogItem};

/// Thin layer over a `JsonFetcher` that knows where result arrays live and
/// how to fan out per-item detail requests.
#[derive(Clone)]
pub struct CatalogClient {
    fetcher: Arc<dyn JsonFetcher>,
}

impl CatalogClient {
    pub fn new(fetcher: Arc<dyn JsonFetcher>) -> Self {
        Self { fetcher }
    }

    /// Primary search: exactly one request. Items are read from the array at
    /// `results_at` (a JSON pointer); a missing array means "no results".
    pub async fn fetch_by_query(
        &self,
        query: &CatalogQuery,
        template: &EndpointTemplate,
        results_at: &str,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        if query.api_key.is_empty() {
            tracing::warn!(target: "catalog", endpoint = template.label, "api key not configured");
            return Err(FetchError::Unauthorized);
        }
        let endpoint = template.for_query(query)?;
        let body = self.fetcher.get_json(&endpoint).await?;
        extract_items(&body, results_at)
    }

    /// Like `fetch_by_query` for endpoints without a text query (lists, feeds).
    pub async fn fetch_list(
        &self,
        template: &EndpointTemplate,
        key: &ApiKey,
        results_at: &str,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        if key.is_empty() {
            tracing::warn!(target: "catalog", endpoint = template.label, "api key not configured");
            return Err(FetchError::Unauthorized);
        }
        let endpoint = template.for_key(key)?;
        let body = self.fetcher.get_json(&endpoint).await?;
        extract_items(&body, results_at)
    }

    /// Single document fetch (detail pages, lookups).
    pub async fn fetch_document(
        &self,
        template: &EndpointTemplate,
        id: Option<&str>,
        text: Option<&str>,
        key: &ApiKey,
    ) -> Result<Value, FetchError> {
        if key.is_empty() {
            return Err(FetchError::Unauthorized);
        }
        let endpoint = template.resolve(id, text, key)?;
        self.fetcher.get_json(&endpoint).await
    }

    /// Secondary fetch for each id, at most `concurrency` in flight. Output
    /// follows the order of `ids`; ids whose request fails are left out.
    pub async fn fetch_details(
        &self,
        ids: Vec<String>,
        template: &EndpointTemplate,
        key: &ApiKey,
        concurrency: usize,
    ) -> Vec<RawCatalogItem> {
        let total = ids.len();
        let results: Vec<Option<RawCatalogItem>> = stream::iter(ids)
            .map(|id| async move {
                match self.fetch_document(template, Some(&id), None, key).await {
                    Ok(doc) => Some(RawCatalogItem(doc)),
                    Err(e) => {
                        tracing::debug!(
                            target: "catalog",
                            endpoint = template.label,
                            %id,
                            error = %e,
                            "detail fetch failed; dropping item"
                        );
                        None
                    }
                }
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let kept: Vec<RawCatalogItem> = results.into_iter().flatten().collect();
        let dropped = total - kept.len();
        if dropped > 0 {
            counter!("catalog_enrichment_dropped_total").increment(dropped as u64);
        }
        kept
    }
}

/// Read the array at `pointer` out of a response body.
pub fn extract_items(body: &Value, pointer: &str) -> Result<Vec<RawCatalogItem>, FetchError> {
    match body.pointer(pointer) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().cloned().map(RawCatalogItem).collect()),
        Some(_) => Err(FetchError::Malformed(format!(
            "expected an array at {pointer}"
        ))),
    }
}
