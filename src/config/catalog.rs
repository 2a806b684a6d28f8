// src/config/catalog.rs
use std::time::Duration;

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_GOOGLE_BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1";
pub const DEFAULT_NYT_BASE_URL: &str = "https://api.nytimes.com";
pub const DEFAULT_OMDB_BASE_URL: &str = "https://www.omdbapi.com";

/// Runtime knobs for the catalog pipeline. Base URLs are overridable so the
/// service can be pointed at a proxy or a local stub.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub tmdb_base_url: String,
    pub google_books_base_url: String,
    pub nyt_base_url: String,
    pub omdb_base_url: String,
    pub request_timeout: Duration,
    /// Max in-flight secondary (detail) requests per search.
    pub detail_concurrency: usize,
    /// Primary-search retries on transient failures (0 = single attempt).
    pub max_retries: u8,
    pub retry_backoff: Duration,
    /// TMDB popular pages pulled into the TV discovery feed.
    pub popular_pages: u32,
    pub feed_ttl: Duration,
    pub bestseller_list: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            tmdb_base_url: DEFAULT_TMDB_BASE_URL.to_string(),
            google_books_base_url: DEFAULT_GOOGLE_BOOKS_BASE_URL.to_string(),
            nyt_base_url: DEFAULT_NYT_BASE_URL.to_string(),
            omdb_base_url: DEFAULT_OMDB_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            detail_concurrency: 8,
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
            popular_pages: 20,
            feed_ttl: Duration::from_secs(60 * 60 * 24),
            bestseller_list: "hardcover-fiction".to_string(),
        }
    }
}

impl CatalogSettings {
    /// Defaults overridden by `CLICKNOTES_*` env vars. Unparseable values are
    /// ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Self::default();
        let text = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = text("CLICKNOTES_TMDB_BASE_URL") {
            s.tmdb_base_url = v;
        }
        if let Some(v) = text("CLICKNOTES_GOOGLE_BOOKS_BASE_URL") {
            s.google_books_base_url = v;
        }
        if let Some(v) = text("CLICKNOTES_NYT_BASE_URL") {
            s.nyt_base_url = v;
        }
        if let Some(v) = text("CLICKNOTES_OMDB_BASE_URL") {
            s.omdb_base_url = v;
        }
        if let Some(v) = text("CLICKNOTES_BESTSELLER_LIST") {
            s.bestseller_list = v;
        }
        if let Some(n) = parse_num::<u64>("CLICKNOTES_REQUEST_TIMEOUT_SECS", text("CLICKNOTES_REQUEST_TIMEOUT_SECS")) {
            s.request_timeout = Duration::from_secs(n.max(1));
        }
        if let Some(n) = parse_num::<usize>("CLICKNOTES_DETAIL_CONCURRENCY", text("CLICKNOTES_DETAIL_CONCURRENCY")) {
            s.detail_concurrency = n.clamp(1, 64);
        }
        if let Some(n) = parse_num::<u8>("CLICKNOTES_MAX_RETRIES", text("CLICKNOTES_MAX_RETRIES")) {
            s.max_retries = n.min(5);
        }
        if let Some(n) = parse_num::<u64>("CLICKNOTES_RETRY_BACKOFF_MS", text("CLICKNOTES_RETRY_BACKOFF_MS")) {
            s.retry_backoff = Duration::from_millis(n);
        }
        if let Some(n) = parse_num::<u32>("CLICKNOTES_POPULAR_PAGES", text("CLICKNOTES_POPULAR_PAGES")) {
            s.popular_pages = n.clamp(1, 500);
        }
        if let Some(n) = parse_num::<u64>("CLICKNOTES_FEED_TTL_SECS", text("CLICKNOTES_FEED_TTL_SECS")) {
            s.feed_ttl = Duration::from_secs(n);
        }
        s
    }
}

fn parse_num<T: std::str::FromStr>(name: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
