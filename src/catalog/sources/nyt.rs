// src/catalog/sources/nyt.rs
use futures::stream::{self, StreamExt};
use metrics::counter;

use super::google_books::IsbnLookup;
use crate::catalog::{ApiKey, CatalogClient, EndpointTemplate, FetchError, RawCatalogItem};
use crate::config::CatalogSettings;

/// NYT bestseller list resolved to Google Books volumes via ISBN-13.
pub struct NytBestsellers {
    list: EndpointTemplate,
    isbn: IsbnLookup,
    concurrency: usize,
}

impl NytBestsellers {
    pub fn new(settings: &CatalogSettings) -> Self {
        let path = format!("/svc/books/v3/lists/current/{}.json", settings.bestseller_list);
        Self {
            list: EndpointTemplate::new("nyt.bestsellers", &settings.nyt_base_url, &path, "api-key"),
            isbn: IsbnLookup::new(settings),
            concurrency: settings.detail_concurrency,
        }
    }

    /// One list request, then one volume lookup per ISBN (in list order).
    /// Lookups that fail or find nothing are dropped. If nothing resolved and
    /// at least one lookup failed, the last lookup error is returned.
    pub async fn fetch(
        &self,
        client: &CatalogClient,
        nyt_key: &ApiKey,
        books_key: &ApiKey,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        let entries = client.fetch_list(&self.list, nyt_key, "/results/books").await?;
        let isbns: Vec<String> = entries
            .iter()
            .filter_map(|e| e.0.get("primary_isbn13").and_then(|v| v.as_str()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let total = isbns.len();

        let lookups: Vec<Result<Option<RawCatalogItem>, FetchError>> = stream::iter(isbns)
            .map(|isbn| async move {
                let res = self.isbn.lookup(client, &isbn, books_key).await;
                if let Err(e) = &res {
                    tracing::debug!(target: "catalog", %isbn, error = %e, "isbn lookup failed; dropping");
                }
                res
            })
            .buffered(self.concurrency.max(1))
            .collect()
            .await;

        let mut volumes = Vec::with_capacity(total);
        let mut last_err = None;
        for res in lookups {
            match res {
                Ok(Some(v)) => volumes.push(v),
                Ok(None) => {}
                Err(e) => last_err = Some(e),
            }
        }

        let dropped = total - volumes.len();
        if dropped > 0 {
            counter!("catalog_enrichment_dropped_total").increment(dropped as u64);
        }
        match last_err {
            Some(e) if volumes.is_empty() => Err(e),
            _ => Ok(volumes),
        }
    }
}
