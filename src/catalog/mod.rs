// src/catalog/mod.rs
//! External catalog plumbing: credentials, queries, raw payloads, the typed
//! fetch failure, endpoint templates and the client that talks to them.

pub mod client;
pub mod endpoint;
pub mod fetcher;
pub mod sources;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::CatalogClient;
pub use endpoint::{Endpoint, EndpointTemplate};
pub use fetcher::{JsonFetcher, ReqwestFetcher};

/// Opaque credential for an external catalog. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ApiKey(<unset>)")
        } else {
            f.write_str("ApiKey(<redacted>)")
        }
    }
}

/// One search action: free-text title plus the key for the catalog it targets.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    pub title: String,
    pub api_key: ApiKey,
}

impl CatalogQuery {
    pub fn new(title: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            title: title.into(),
            api_key,
        }
    }
}

/// Provider-specific JSON payload, exactly as the catalog returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCatalogItem(pub serde_json::Value);

impl RawCatalogItem {
    /// Provider id as a string, whether the payload carries it as a number or text.
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    TmdbTv,
    TmdbMovie,
    GoogleBooks,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::TmdbTv => "tmdb_tv",
            ProviderKind::TmdbMovie => "tmdb_movie",
            ProviderKind::GoogleBooks => "google_books",
        }
    }
}

/// Provider-assigned identifier; TMDB uses integers, Google Books uses strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaId {
    Int(i64),
    Text(String),
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaId::Int(n) => write!(f, "{n}"),
            MediaId::Text(s) => f.write_str(s),
        }
    }
}

/// Failure of a single outbound catalog request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("catalog unreachable: {0}")]
    Unreachable(String),

    #[error("catalog rate limit exceeded")]
    RateLimited,

    #[error("catalog rejected the API key")]
    Unauthorized,

    #[error("catalog response malformed: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Stable identifier used in API responses and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Unreachable(_) => "unreachable",
            FetchError::RateLimited => "rate_limited",
            FetchError::Unauthorized => "unauthorized",
            FetchError::Malformed(_) => "malformed",
        }
    }

    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Unreachable(_) | FetchError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("  s3cr3t ");
        assert_eq!(key.expose(), "s3cr3t");
        let dbg = format!("{:?}", CatalogQuery::new("dune", key));
        assert!(!dbg.contains("s3cr3t"), "key leaked in {dbg}");
        assert!(dbg.contains("redacted"));
        assert_eq!(format!("{:?}", ApiKey::default()), "ApiKey(<unset>)");
    }

    #[test]
    fn raw_id_accepts_numbers_and_strings() {
        assert_eq!(RawCatalogItem(json!({"id": 42})).id().as_deref(), Some("42"));
        assert_eq!(
            RawCatalogItem(json!({"id": "zyTCAlFPjgYC"})).id().as_deref(),
            Some("zyTCAlFPjgYC")
        );
        assert_eq!(RawCatalogItem(json!({"id": ""})).id(), None);
        assert_eq!(RawCatalogItem(json!({"name": "x"})).id(), None);
    }

    #[test]
    fn media_id_serializes_untagged() {
        assert_eq!(serde_json::to_value(MediaId::Int(7)).unwrap(), json!(7));
        assert_eq!(
            serde_json::to_value(MediaId::Text("abc".into())).unwrap(),
            json!("abc")
        );
    }

    #[test]
    fn transient_errors_are_retryable() {
        assert!(FetchError::RateLimited.is_transient());
        assert!(FetchError::Unreachable("timeout".into()).is_transient());
        assert!(!FetchError::Unauthorized.is_transient());
        assert!(!FetchError::Malformed("eof".into()).is_transient());
        assert_eq!(FetchError::RateLimited.kind(), "rate_limited");
    }
}
