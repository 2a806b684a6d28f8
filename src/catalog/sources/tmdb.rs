// src/catalog/sources/tmdb.rs
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::CatalogSource;
use crate::catalog::{
    ApiKey, CatalogClient, CatalogQuery, EndpointTemplate, FetchError, ProviderKind,
    RawCatalogItem,
};
use crate::config::CatalogSettings;

/// Genres the TV search is restricted to (animation, comedy, documentary,
/// drama, family, fantasy, history, music, mystery, romance, sci-fi).
pub const TV_GENRES: &str = "16,35,99,18,10751,14,36,10402,9648,10749,878";

/// TMDB search with a keywords round-trip per result. The search payload
/// carries no keywords, so every candidate is re-fetched as a detail document.
pub struct TmdbSource {
    kind: ProviderKind,
    search: EndpointTemplate,
    detail: EndpointTemplate,
    /// Only TV has a discovery feed.
    popular: Option<EndpointTemplate>,
    detail_concurrency: usize,
}

impl TmdbSource {
    pub fn tv(settings: &CatalogSettings) -> Self {
        let base = settings.tmdb_base_url.as_str();
        Self {
            kind: ProviderKind::TmdbTv,
            search: EndpointTemplate::new("tmdb.search.tv", base, "/search/tv", "api_key")
                .with_query_param("query")
                .with_param("with_genres", TV_GENRES)
                .with_param("certification_country", "US")
                .with_param("certification", "TV-PG"),
            detail: EndpointTemplate::new("tmdb.detail.tv", base, "/tv/{id}", "api_key")
                .with_param("append_to_response", "keywords"),
            popular: Some(
                EndpointTemplate::new("tmdb.popular.tv", base, "/tv/popular", "api_key")
                    .with_param("language", "en-US"),
            ),
            detail_concurrency: settings.detail_concurrency,
        }
    }

    pub fn movies(settings: &CatalogSettings) -> Self {
        let base = settings.tmdb_base_url.as_str();
        Self {
            kind: ProviderKind::TmdbMovie,
            search: EndpointTemplate::new("tmdb.search.movie", base, "/search/movie", "api_key")
                .with_query_param("query")
                .with_param("include_adult", "false"),
            detail: EndpointTemplate::new("tmdb.detail.movie", base, "/movie/{id}", "api_key")
                .with_param("append_to_response", "keywords"),
            popular: None,
            detail_concurrency: settings.detail_concurrency,
        }
    }

    /// Pages `1..=pages` of the popular listing, in page order. A failed page
    /// is skipped; the call fails only if no page came back.
    pub async fn popular(
        &self,
        client: &CatalogClient,
        key: &ApiKey,
        pages: u32,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        let Some(popular) = &self.popular else {
            return Err(FetchError::Unreachable(format!("{}: no popular listing", self.name())));
        };
        let pages: Vec<u32> = (1..=pages.max(1)).collect();
        let results: Vec<Result<Vec<RawCatalogItem>, FetchError>> = stream::iter(pages)
            .map(|page| {
                let template = popular.clone().with_param("page", page.to_string());
                async move { client.fetch_list(&template, key, "/results").await }
            })
            .buffered(self.detail_concurrency.max(1))
            .collect()
            .await;

        let mut out = Vec::new();
        let mut last_err = None;
        let mut ok_pages = 0usize;
        for res in results {
            match res {
                Ok(mut items) => {
                    ok_pages += 1;
                    out.append(&mut items);
                }
                Err(e) => {
                    tracing::debug!(target: "catalog", endpoint = popular.label, error = %e, "popular page failed");
                    last_err = Some(e);
                }
            }
        }
        match (ok_pages, last_err) {
            (0, Some(e)) => Err(e),
            _ => Ok(out),
        }
    }
}

#[async_trait]
impl CatalogSource for TmdbSource {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        match self.kind {
            ProviderKind::TmdbMovie => "tmdb-movies",
            _ => "tmdb-tv",
        }
    }

    async fn search(
        &self,
        client: &CatalogClient,
        query: &CatalogQuery,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        client.fetch_by_query(query, &self.search, "/results").await
    }

    async fn enrich(
        &self,
        client: &CatalogClient,
        query: &CatalogQuery,
        candidates: Vec<RawCatalogItem>,
    ) -> Vec<RawCatalogItem> {
        let ids: Vec<String> = candidates.iter().filter_map(RawCatalogItem::id).collect();
        client
            .fetch_details(ids, &self.detail, &query.api_key, self.detail_concurrency)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Endpoint, JsonFetcher};
    use serde_json::Value;
    use std::sync::Arc;

    struct NoNetwork;

    #[async_trait]
    impl JsonFetcher for NoNetwork {
        async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
            panic!("unexpected request to {endpoint}");
        }
    }

    #[tokio::test]
    async fn movies_have_no_popular_feed() {
        let client = CatalogClient::new(Arc::new(NoNetwork));
        let movies = TmdbSource::movies(&CatalogSettings::default());
        let err = movies.popular(&client, &ApiKey::new("k"), 3).await.unwrap_err();
        assert_eq!(err.kind(), "unreachable");
    }
}
