// tests/common/mod.rs
//
// Shared fixtures: a recording in-memory `JsonFetcher` and settings that
// point every catalog at a fake host.
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clicknotes::catalog::{Endpoint, FetchError, JsonFetcher};
use clicknotes::config::CatalogSettings;

type Reply = Result<Value, FetchError>;

struct Rule {
    label: &'static str,
    path: Option<String>,
    param: Option<(String, String)>,
    once: bool,
    delay: Option<Duration>,
    reply: Reply,
}

impl Rule {
    fn matches(&self, ep: &Endpoint) -> bool {
        ep.label == self.label
            && self.path.as_deref().map_or(true, |p| ep.path() == p)
            && self
                .param
                .as_ref()
                .map_or(true, |(k, v)| ep.query_value(k).as_deref() == Some(v.as_str()))
    }
}

/// Replies are picked by endpoint label, optionally narrowed by path or a
/// query parameter. The first matching rule wins; `once` rules are consumed.
/// Unmatched requests fail as `Unreachable`.
#[derive(Default)]
pub struct MockFetcher {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Endpoint>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, rule: Rule) -> Self {
        self.rules.lock().unwrap().push(rule);
        self
    }

    pub fn on(self, label: &'static str, reply: Reply) -> Self {
        self.push(Rule { label, path: None, param: None, once: false, delay: None, reply })
    }

    pub fn on_path(self, label: &'static str, path: &str, reply: Reply) -> Self {
        self.push(Rule {
            label,
            path: Some(path.to_string()),
            param: None,
            once: false,
            delay: None,
            reply,
        })
    }

    pub fn on_param(self, label: &'static str, key: &str, value: &str, reply: Reply) -> Self {
        self.push(Rule {
            label,
            path: None,
            param: Some((key.to_string(), value.to_string())),
            once: false,
            delay: None,
            reply,
        })
    }

    pub fn once(self, label: &'static str, reply: Reply) -> Self {
        self.push(Rule { label, path: None, param: None, once: true, delay: None, reply })
    }

    /// Hold the reply of the most recently added rule for `delay`.
    pub fn delay_last(self, delay: Duration) -> Self {
        if let Some(r) = self.rules.lock().unwrap().last_mut() {
            r.delay = Some(delay);
        }
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, label: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|e| e.label == label).count()
    }
}

#[async_trait]
impl JsonFetcher for MockFetcher {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(endpoint.clone());

        let picked = {
            let mut rules = self.rules.lock().unwrap();
            match rules.iter().position(|r| r.matches(endpoint)) {
                Some(i) if rules[i].once => {
                    let r = rules.remove(i);
                    Some((r.delay, r.reply))
                }
                Some(i) => Some((rules[i].delay, rules[i].reply.clone())),
                None => None,
            }
        };

        match picked {
            Some((delay, reply)) => {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                reply
            }
            None => Err(FetchError::Unreachable(format!("no mock for {endpoint}"))),
        }
    }
}

pub fn test_settings() -> CatalogSettings {
    CatalogSettings {
        tmdb_base_url: "http://tmdb.test".into(),
        google_books_base_url: "http://books.test".into(),
        nyt_base_url: "http://nyt.test".into(),
        omdb_base_url: "http://omdb.test".into(),
        detail_concurrency: 4,
        popular_pages: 2,
        feed_ttl: Duration::from_secs(3600),
        ..CatalogSettings::default()
    }
}

/// TMDB TV detail document with keywords appended.
pub fn tv_detail(id: i64, name: &str, vote: f64, overview: &str, keywords: &[&str]) -> Value {
    let kws: Vec<Value> = keywords
        .iter()
        .enumerate()
        .map(|(i, k)| json!({"id": i, "name": k}))
        .collect();
    json!({
        "id": id,
        "name": name,
        "original_name": name,
        "overview": overview,
        "vote_average": vote,
        "first_air_date": "2020-01-01",
        "poster_path": format!("/p{id}.jpg"),
        "keywords": {"results": kws},
    })
}

/// TMDB search listing carrying just the ids.
pub fn tv_search(ids: &[i64]) -> Value {
    let results: Vec<Value> = ids.iter().map(|id| json!({"id": id, "name": format!("show {id}")})).collect();
    json!({"page": 1, "results": results})
}

pub fn volume(id: &str, title: &str, rating: Option<f64>) -> Value {
    let mut info = json!({
        "title": title,
        "authors": ["A. Writer"],
        "description": "<p>A story.</p>",
        "publishedDate": "2021",
    });
    if let Some(r) = rating {
        info["averageRating"] = json!(r);
    }
    json!({"id": id, "volumeInfo": info})
}

pub fn volumes(items: &[Value]) -> Value {
    json!({"kind": "books#volumes", "totalItems": items.len(), "items": items})
}
