// src/api.rs
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::catalog::sources::{ImdbRating, OmdbRatings};
use crate::catalog::{CatalogClient, FetchError, JsonFetcher, ReqwestFetcher};
use crate::config::{ApiKeys, CatalogSettings, SuitabilityPolicy};
use crate::discover::{Discovery, FeedOutcome};
use crate::normalize::NormalizedMediaItem;
use crate::search::{MediaKind, QueryOrchestrator, RetryPolicy, SourceSet};
use crate::session::{SearchSessions, SESSION_HEADER};

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<QueryOrchestrator>,
    sources: Arc<SourceSet>,
    keys: Arc<ApiKeys>,
    discovery: Arc<Discovery>,
    ratings: Arc<OmdbRatings>,
    sessions: Arc<SearchSessions>,
}

impl AppState {
    pub fn new(
        settings: &CatalogSettings,
        keys: ApiKeys,
        policy: SuitabilityPolicy,
        fetcher: Arc<dyn JsonFetcher>,
    ) -> Self {
        let client = CatalogClient::new(fetcher);
        let orchestrator = QueryOrchestrator::new(client, Arc::new(policy))
            .with_retry(RetryPolicy::from_settings(settings));
        Self {
            orchestrator: Arc::new(orchestrator),
            sources: Arc::new(SourceSet::from_settings(settings)),
            ratings: Arc::new(OmdbRatings::new(settings, keys.omdb.clone())),
            keys: Arc::new(keys),
            discovery: Arc::new(Discovery::new(settings)),
            sessions: Arc::new(SearchSessions::default()),
        }
    }

    /// Production wiring: env settings and keys, policy file, reqwest.
    pub fn from_env(settings: &CatalogSettings) -> anyhow::Result<Self> {
        let keys = ApiKeys::from_env();
        let policy = SuitabilityPolicy::load_default().context("loading suitability policy")?;
        let fetcher = ReqwestFetcher::new(settings.request_timeout)?;
        Ok(Self::new(settings, keys, policy, Arc::new(fetcher)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/search/{kind}", get(search))
        .route("/api/tv/popular", get(popular_tv))
        .route("/api/books/bestsellers", get(bestsellers))
        .route("/api/ratings", get(ratings))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl From<&FetchError> for ErrorBody {
    fn from(e: &FetchError) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct TitleParams {
    #[serde(default)]
    title: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub items: Vec<NormalizedMediaItem>,
    pub error: Option<ErrorBody>,
    pub empty_query: bool,
    /// A newer search from the same session started before this one finished.
    pub stale: bool,
}

async fn search(
    State(state): State<AppState>,
    Path(kind): Path<MediaKind>,
    Query(params): Query<TitleParams>,
    headers: HeaderMap,
) -> Json<SearchResponse> {
    let session = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|id| state.sessions.get(id));
    let ticket = session.as_ref().map(|g| g.begin());

    let outcome = state
        .orchestrator
        .search(
            &params.title,
            kind.api_key(&state.keys),
            state.sources.for_kind(kind),
        )
        .await;

    let outcome = match (&session, ticket) {
        (Some(g), Some(t)) => match g.commit(t, outcome) {
            Some(outcome) => outcome,
            None => {
                counter!("search_stale_total").increment(1);
                tracing::debug!(target: "search", ?kind, "superseded by a newer search; discarding");
                return Json(SearchResponse {
                    items: Vec::new(),
                    error: None,
                    empty_query: false,
                    stale: true,
                });
            }
        },
        _ => outcome,
    };

    Json(SearchResponse {
        error: outcome.error.as_ref().map(ErrorBody::from),
        items: outcome.items,
        empty_query: outcome.empty_query,
        stale: false,
    })
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub items: Vec<NormalizedMediaItem>,
    pub error: Option<ErrorBody>,
    pub refreshed_at: DateTime<Utc>,
}

impl From<FeedOutcome> for FeedResponse {
    fn from(f: FeedOutcome) -> Self {
        Self {
            error: f.error.as_ref().map(ErrorBody::from),
            items: f.items,
            refreshed_at: f.refreshed_at,
        }
    }
}

async fn popular_tv(State(state): State<AppState>) -> Json<FeedResponse> {
    let feed = state
        .discovery
        .popular_tv(&state.orchestrator, &state.keys)
        .await;
    Json(feed.into())
}

async fn bestsellers(State(state): State<AppState>) -> Json<FeedResponse> {
    let feed = state
        .discovery
        .bestsellers(&state.orchestrator, &state.keys)
        .await;
    Json(feed.into())
}

#[derive(Serialize)]
pub struct RatingsResponse {
    pub rating: Option<ImdbRating>,
    pub error: Option<ErrorBody>,
}

async fn ratings(
    State(state): State<AppState>,
    Query(params): Query<TitleParams>,
) -> Json<RatingsResponse> {
    let res = state
        .ratings
        .lookup(state.orchestrator.client(), &params.title)
        .await;
    Json(match res {
        Ok(rating) => RatingsResponse {
            rating,
            error: None,
        },
        Err(e) => {
            tracing::warn!(target: "ratings", error = %e, "rating lookup failed");
            RatingsResponse {
                rating: None,
                error: Some(ErrorBody::from(&e)),
            }
        }
    })
}
