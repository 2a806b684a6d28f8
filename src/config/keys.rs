// src/config/keys.rs
use crate::catalog::ApiKey;

/// Credentials for every external catalog. Missing keys are kept as empty
/// values; requests against them fail fast with `Unauthorized`.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub tmdb: ApiKey,
    pub google_books: ApiKey,
    pub nytimes: ApiKey,
    /// OMDB's free tier is small, so several keys are rotated.
    pub omdb: Vec<ApiKey>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |names: &[&str]| {
            names
                .iter()
                .filter_map(|n| lookup(n))
                .map(ApiKey::new)
                .find(|k| !k.is_empty())
                .unwrap_or_default()
        };

        let keys = Self {
            tmdb: key(&["TMDB_API_KEY"]),
            google_books: key(&["GOOGLE_BOOKS_API_KEY", "GOOGLE_BOOKS_API_KEY_2", "GOOGLE_BOOKS_API_KEY_1"]),
            nytimes: key(&["NYTIMES_API_KEY"]),
            omdb: ["OMDB_API_KEY", "OMDB_API_KEY_1", "OMDB_API_KEY_2", "OMDB_API_KEY_3"]
                .iter()
                .filter_map(|n| lookup(n))
                .map(ApiKey::new)
                .filter(|k| !k.is_empty())
                .collect(),
        };

        // Safe diagnostics: presence only, never values.
        for (name, missing) in [
            ("TMDB_API_KEY", keys.tmdb.is_empty()),
            ("GOOGLE_BOOKS_API_KEY", keys.google_books.is_empty()),
            ("NYTIMES_API_KEY", keys.nytimes.is_empty()),
            ("OMDB_API_KEY_*", keys.omdb.is_empty()),
        ] {
            if missing {
                tracing::warn!(var = name, "catalog key not set, requests will be rejected");
            }
        }
        keys
    }
}
