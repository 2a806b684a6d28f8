// src/search.rs
//! Query orchestrator: validate → fetch → enrich → normalize/filter → done.
//! Sources run concurrently; output keeps primary-search order, sources
//! concatenated in the order given.

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::catalog::sources::{BookField, CatalogSource, GoogleBooksSource, TmdbSource};
use crate::catalog::{
    ApiKey, CatalogClient, CatalogQuery, FetchError, MediaId, ProviderKind, RawCatalogItem,
};
use crate::config::{ApiKeys, CatalogSettings, SuitabilityPolicy};
use crate::filter::rejection;
use crate::normalize::{normalize, NormalizedMediaItem};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("search_requests_total", "Searches accepted by the orchestrator.");
        describe_counter!("search_empty_total", "Searches short-circuited on empty input.");
        describe_counter!(
            "search_fetch_errors_total",
            "Primary-search failures by error kind."
        );
        describe_counter!(
            "search_rejected_total",
            "Items removed by the suitability filter, by rule."
        );
        describe_counter!(
            "search_duplicates_total",
            "Items removed as cross-source duplicates."
        );
        describe_counter!(
            "catalog_enrichment_dropped_total",
            "Items dropped because their secondary fetch failed."
        );
        describe_histogram!("search_latency_ms", "End-to-end search time in milliseconds.");
    });
}

/// Short, non-reversible id for a query so logs never carry raw user text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Per-invocation state, used for tracing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Validating,
    Fetching,
    Enriching,
    Filtering,
    Done,
    Empty,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u8,
    /// Delay before the first retry; doubles on each further attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_settings(settings: &CatalogSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            backoff: settings.retry_backoff,
        }
    }

    /// Sleep before retry number `attempt` (1-based). Saturates instead of
    /// overflowing for large attempt counts.
    pub fn delay_for(&self, attempt: u8) -> Duration {
        let factor = 1u32
            .checked_shl(u32::from(attempt.saturating_sub(1)))
            .unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }
}

/// What the caller gets back. `error` is set when at least one primary
/// search failed; `items` then holds whatever the other sources produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub items: Vec<NormalizedMediaItem>,
    pub error: Option<FetchError>,
    /// Input was empty; no catalog was contacted.
    pub empty_query: bool,
}

impl SearchOutcome {
    pub fn empty_query() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            empty_query: true,
        }
    }
}

/// Media section of the UI; picks the sources and the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Tv,
    Movies,
    Books,
}

impl MediaKind {
    pub fn api_key<'a>(&self, keys: &'a ApiKeys) -> &'a ApiKey {
        match self {
            MediaKind::Tv | MediaKind::Movies => &keys.tmdb,
            MediaKind::Books => &keys.google_books,
        }
    }
}

/// The sources searched for each media kind. Books fan out to a title and
/// an author query.
pub struct SourceSet {
    pub tv: Vec<Arc<dyn CatalogSource>>,
    pub movies: Vec<Arc<dyn CatalogSource>>,
    pub books: Vec<Arc<dyn CatalogSource>>,
}

impl SourceSet {
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        Self {
            tv: vec![Arc::new(TmdbSource::tv(settings))],
            movies: vec![Arc::new(TmdbSource::movies(settings))],
            books: vec![
                Arc::new(GoogleBooksSource::new(settings, BookField::Title)),
                Arc::new(GoogleBooksSource::new(settings, BookField::Author)),
            ],
        }
    }

    pub fn for_kind(&self, kind: MediaKind) -> &[Arc<dyn CatalogSource>] {
        match kind {
            MediaKind::Tv => &self.tv,
            MediaKind::Movies => &self.movies,
            MediaKind::Books => &self.books,
        }
    }
}

pub struct QueryOrchestrator {
    client: CatalogClient,
    policy: Arc<SuitabilityPolicy>,
    retry: RetryPolicy,
}

impl QueryOrchestrator {
    pub fn new(client: CatalogClient, policy: Arc<SuitabilityPolicy>) -> Self {
        Self {
            client,
            policy,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub async fn search(
        &self,
        title: &str,
        api_key: &ApiKey,
        sources: &[Arc<dyn CatalogSource>],
    ) -> SearchOutcome {
        ensure_metrics_described();
        let t0 = Instant::now();
        let qid = anon_hash(title);

        tracing::trace!(target: "search", query = %qid, phase = ?SearchPhase::Validating);
        let title = title.trim();
        if title.is_empty() {
            counter!("search_empty_total").increment(1);
            tracing::trace!(target: "search", query = %qid, phase = ?SearchPhase::Empty);
            return SearchOutcome::empty_query();
        }
        counter!("search_requests_total").increment(1);

        let query = CatalogQuery::new(title, api_key.clone());
        let results = join_all(
            sources
                .iter()
                .map(|s| self.run_source(s.as_ref(), &query, &qid)),
        )
        .await;

        let mut batches = Vec::with_capacity(sources.len());
        let mut error = None;
        for (source, res) in sources.iter().zip(results) {
            match res {
                Ok(raws) => batches.push((source.kind(), raws)),
                Err(e) => {
                    tracing::warn!(
                        target: "search",
                        query = %qid,
                        source = source.name(),
                        error = %e,
                        "primary search failed"
                    );
                    counter!("search_fetch_errors_total", "kind" => e.kind()).increment(1);
                    error.get_or_insert(e);
                }
            }
        }

        tracing::trace!(target: "search", query = %qid, phase = ?SearchPhase::Filtering);
        let items = self.curate(batches);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("search_latency_ms").record(ms);
        tracing::info!(
            target: "search",
            query = %qid,
            phase = ?SearchPhase::Done,
            sources = sources.len(),
            kept = items.len(),
            failed = error.is_some(),
            ms,
            "search finished"
        );

        SearchOutcome {
            items,
            error,
            empty_query: false,
        }
    }

    async fn run_source(
        &self,
        source: &dyn CatalogSource,
        query: &CatalogQuery,
        qid: &str,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        tracing::trace!(target: "search", query = %qid, source = source.name(), phase = ?SearchPhase::Fetching);
        let candidates = self.primary_with_retry(source, query).await?;

        tracing::trace!(
            target: "search",
            query = %qid,
            source = source.name(),
            candidates = candidates.len(),
            phase = ?SearchPhase::Enriching
        );
        Ok(source.enrich(&self.client, query, candidates).await)
    }

    async fn primary_with_retry(
        &self,
        source: &dyn CatalogSource,
        query: &CatalogQuery,
    ) -> Result<Vec<RawCatalogItem>, FetchError> {
        let mut attempt: u8 = 0;
        loop {
            match source.search(&self.client, query).await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        target: "search",
                        source = source.name(),
                        attempt,
                        error = %e,
                        "retrying primary search"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Normalize, drop cross-source duplicates (first occurrence wins) and
    /// apply the suitability filter. Order is preserved throughout.
    pub fn curate(&self, batches: Vec<(ProviderKind, Vec<RawCatalogItem>)>) -> Vec<NormalizedMediaItem> {
        let mut seen: HashSet<(ProviderKind, MediaId)> = HashSet::new();
        let mut out = Vec::new();

        for (kind, raws) in batches {
            for raw in raws {
                let item = normalize(&raw, kind);

                let has_id = !matches!(&item.id, MediaId::Text(s) if s.is_empty());
                if has_id && !seen.insert((item.provider, item.id.clone())) {
                    counter!("search_duplicates_total").increment(1);
                    continue;
                }

                if let Some(r) = rejection(&item, &self.policy) {
                    counter!("search_rejected_total", "rule" => r.rule()).increment(1);
                    tracing::trace!(target: "search", id = %item.id, rule = r.rule(), "item rejected");
                    continue;
                }
                out.push(item);
            }
        }
        out
    }
}
