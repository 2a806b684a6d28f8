// src/discover.rs
//! Discovery feeds shown before the user types: popular TV and the NYT
//! bestseller list. Both go through the same normalize/filter pass as
//! search and are cached for `feed_ttl`.

use chrono::{DateTime, Utc};
use metrics::counter;

use crate::cache::TtlCache;
use crate::catalog::sources::{NytBestsellers, TmdbSource};
use crate::catalog::{FetchError, ProviderKind};
use crate::config::{ApiKeys, CatalogSettings};
use crate::normalize::NormalizedMediaItem;
use crate::search::QueryOrchestrator;

#[derive(Debug, Clone)]
pub struct FeedOutcome {
    pub items: Vec<NormalizedMediaItem>,
    pub error: Option<FetchError>,
    pub refreshed_at: DateTime<Utc>,
}

pub struct Discovery {
    popular_tv: TmdbSource,
    bestsellers: NytBestsellers,
    popular_pages: u32,
    tv_cache: TtlCache<(Vec<NormalizedMediaItem>, Option<FetchError>)>,
    books_cache: TtlCache<(Vec<NormalizedMediaItem>, Option<FetchError>)>,
}

impl Discovery {
    pub fn new(settings: &CatalogSettings) -> Self {
        Self {
            popular_tv: TmdbSource::tv(settings),
            bestsellers: NytBestsellers::new(settings),
            popular_pages: settings.popular_pages,
            tv_cache: TtlCache::new(settings.feed_ttl),
            books_cache: TtlCache::new(settings.feed_ttl),
        }
    }

    pub async fn popular_tv(&self, orch: &QueryOrchestrator, keys: &ApiKeys) -> FeedOutcome {
        let cached = self
            .tv_cache
            .get_or_refresh(
                || async {
                    tracing::info!(target: "discover", feed = "popular_tv", pages = self.popular_pages, "refreshing feed");
                    let res = self
                        .popular_tv
                        .popular(orch.client(), &keys.tmdb, self.popular_pages)
                        .await;
                    settle(orch, ProviderKind::TmdbTv, res, "popular_tv")
                },
                |(_, err)| err.is_none(),
            )
            .await;
        let (items, error) = cached.value;
        FeedOutcome {
            items,
            error,
            refreshed_at: cached.refreshed_at,
        }
    }

    pub async fn bestsellers(&self, orch: &QueryOrchestrator, keys: &ApiKeys) -> FeedOutcome {
        let cached = self
            .books_cache
            .get_or_refresh(
                || async {
                    tracing::info!(target: "discover", feed = "bestsellers", "refreshing feed");
                    let res = self
                        .bestsellers
                        .fetch(orch.client(), &keys.nytimes, &keys.google_books)
                        .await;
                    settle(orch, ProviderKind::GoogleBooks, res, "bestsellers")
                },
                |(_, err)| err.is_none(),
            )
            .await;
        let (items, error) = cached.value;
        FeedOutcome {
            items,
            error,
            refreshed_at: cached.refreshed_at,
        }
    }
}

fn settle(
    orch: &QueryOrchestrator,
    kind: ProviderKind,
    res: Result<Vec<crate::catalog::RawCatalogItem>, FetchError>,
    feed: &'static str,
) -> (Vec<NormalizedMediaItem>, Option<FetchError>) {
    match res {
        Ok(raws) => {
            let items = orch.curate(vec![(kind, raws)]);
            tracing::info!(target: "discover", feed, kept = items.len(), "feed refreshed");
            (items, None)
        }
        Err(e) => {
            tracing::warn!(target: "discover", feed, error = %e, "feed refresh failed");
            counter!("discover_refresh_failed_total", "feed" => feed).increment(1);
            (Vec::new(), Some(e))
        }
    }
}
