// src/catalog/endpoint.rs
use reqwest::Url;
use std::fmt;

use super::{ApiKey, CatalogQuery, FetchError};

/// Describes how to reach one external endpoint. The template is static
/// configuration; `resolve` turns it into a concrete, encoded URL per request.
#[derive(Debug, Clone)]
pub struct EndpointTemplate {
    /// Short name used in logs and metrics, e.g. "tmdb.search.tv".
    pub label: &'static str,
    pub base_url: String,
    /// Path below `base_url`. A `{id}` segment is replaced by the item id.
    pub path: String,
    /// Query parameter carrying the user's text, if this endpoint takes one.
    pub query_param: Option<&'static str>,
    /// Prepended to the text, e.g. `inauthor:` or `isbn:`.
    pub query_prefix: &'static str,
    pub key_param: &'static str,
    pub extra: Vec<(&'static str, String)>,
}

impl EndpointTemplate {
    pub fn new(label: &'static str, base_url: &str, path: &str, key_param: &'static str) -> Self {
        Self {
            label,
            base_url: base_url.trim_end_matches('/').to_string(),
            path: path.to_string(),
            query_param: None,
            query_prefix: "",
            key_param,
            extra: Vec::new(),
        }
    }

    pub fn with_query_param(mut self, name: &'static str) -> Self {
        self.query_param = Some(name);
        self
    }

    pub fn with_query_prefix(mut self, prefix: &'static str) -> Self {
        self.query_prefix = prefix;
        self
    }

    pub fn with_param(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.extra.push((name, value.into()));
        self
    }

    /// Endpoint for a primary search with the user's title.
    pub fn for_query(&self, query: &CatalogQuery) -> Result<Endpoint, FetchError> {
        self.resolve(None, Some(&query.title), &query.api_key)
    }

    /// Endpoint for a per-item detail request.
    pub fn for_id(&self, id: &str, key: &ApiKey) -> Result<Endpoint, FetchError> {
        self.resolve(Some(id), None, key)
    }

    /// Endpoint with neither id nor text (lists, feeds); extra params still apply.
    pub fn for_key(&self, key: &ApiKey) -> Result<Endpoint, FetchError> {
        self.resolve(None, None, key)
    }

    /// Build the concrete URL. Every value goes through `Url`'s encoders.
    pub fn resolve(
        &self,
        id: Option<&str>,
        text: Option<&str>,
        key: &ApiKey,
    ) -> Result<Endpoint, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            FetchError::Unreachable(format!("{}: invalid base url: {e}", self.label))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                FetchError::Unreachable(format!("{}: base url cannot carry a path", self.label))
            })?;
            segments.pop_if_empty();
            for seg in self.path.split('/').filter(|s| !s.is_empty()) {
                if seg == "{id}" {
                    let id = id.ok_or_else(|| {
                        FetchError::Unreachable(format!("{}: missing item id", self.label))
                    })?;
                    segments.push(id);
                } else {
                    segments.push(seg);
                }
            }
        }

        {
            let mut pairs = url.query_pairs_mut();
            if let (Some(param), Some(text)) = (self.query_param, text) {
                pairs.append_pair(param, &format!("{}{}", self.query_prefix, text));
            }
            for (name, value) in &self.extra {
                pairs.append_pair(name, value);
            }
            pairs.append_pair(self.key_param, key.expose());
        }

        Ok(Endpoint {
            label: self.label,
            url,
        })
    }
}

/// A resolved request target. Carries the key inside its query string, so
/// `Debug`/`Display` only ever show the label and path.
#[derive(Clone)]
pub struct Endpoint {
    pub label: &'static str,
    url: Url,
}

impl Endpoint {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Value of a query parameter, for tests and stubs.
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("label", &self.label)
            .field("path", &self.url.path())
            .finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.url.path())
    }
}
