// src/catalog/sources/omdb.rs
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::catalog::{ApiKey, CatalogClient, EndpointTemplate, FetchError};
use crate::config::CatalogSettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImdbRating {
    pub imdb_id: String,
    pub title: String,
    pub year: String,
    /// `None` when OMDB reports "N/A".
    pub rating: Option<f64>,
}

/// IMDb rating lookup by title through OMDB, rotating over several keys.
pub struct OmdbRatings {
    by_title: EndpointTemplate,
    keys: Vec<ApiKey>,
    cursor: AtomicUsize,
}

impl OmdbRatings {
    pub fn new(settings: &CatalogSettings, keys: Vec<ApiKey>) -> Self {
        Self {
            by_title: EndpointTemplate::new("omdb.title", &settings.omdb_base_url, "/", "apikey")
                .with_query_param("t"),
            keys: keys.into_iter().filter(|k| !k.is_empty()).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// Try each key at most once, starting after the last one handed out.
    /// Rejected or rate-limited keys move on to the next; other errors stop.
    pub async fn lookup(
        &self,
        client: &CatalogClient,
        title: &str,
    ) -> Result<Option<ImdbRating>, FetchError> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(None);
        }
        if self.keys.is_empty() {
            return Err(FetchError::Unauthorized);
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        let mut last_err = FetchError::Unauthorized;
        for i in 0..self.keys.len() {
            let slot = (start + i) % self.keys.len();
            let key = &self.keys[slot];
            match client
                .fetch_document(&self.by_title, None, Some(title), key)
                .await
            {
                Ok(doc) => return Ok(parse_rating(&doc)),
                Err(e @ (FetchError::Unauthorized | FetchError::RateLimited)) => {
                    tracing::debug!(target: "ratings", slot, error = %e, "omdb key rejected; rotating");
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }
        tracing::warn!(target: "ratings", keys = self.keys.len(), "all omdb keys exhausted");
        Err(last_err)
    }
}

fn parse_rating(doc: &Value) -> Option<ImdbRating> {
    let field = |k: &str| doc.get(k).and_then(Value::as_str).unwrap_or_default();
    if !field("Response").eq_ignore_ascii_case("true") {
        return None;
    }
    Some(ImdbRating {
        imdb_id: field("imdbID").to_string(),
        title: field("Title").to_string(),
        year: field("Year").to_string(),
        rating: field("imdbRating").parse::<f64>().ok().filter(|r| r.is_finite()),
    })
}
