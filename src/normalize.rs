// src/normalize.rs
//! Result normalizer: maps provider-specific JSON into `NormalizedMediaItem`.
//! Pure functions only; missing fields become empty/absent, never errors.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::catalog::{MediaId, ProviderKind, RawCatalogItem};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedMediaItem {
    pub id: MediaId,
    pub provider: ProviderKind,
    pub name: String,
    /// Original-language title (TMDB) or subtitle (books). Empty if absent.
    pub original_name: String,
    pub overview: String,
    /// 0..=10; books are rescaled from their 1..=5 stars.
    pub vote_average: Option<f64>,
    pub keywords: BTreeSet<String>,
    /// Unmodified provider date, e.g. `2011-04-17` or `2004`.
    pub release_or_air_date: String,
    pub image: Option<String>,
    pub authors: Vec<String>,
}

pub fn normalize(raw: &RawCatalogItem, kind: ProviderKind) -> NormalizedMediaItem {
    match kind {
        ProviderKind::TmdbTv => normalize_tmdb(&raw.0, kind, "name", "original_name", "first_air_date", "/keywords/results"),
        ProviderKind::TmdbMovie => normalize_tmdb(&raw.0, kind, "title", "original_title", "release_date", "/keywords/keywords"),
        ProviderKind::GoogleBooks => normalize_google_book(&raw.0),
    }
}

fn normalize_tmdb(
    v: &Value,
    kind: ProviderKind,
    name_field: &str,
    original_field: &str,
    date_field: &str,
    keywords_at: &str,
) -> NormalizedMediaItem {
    NormalizedMediaItem {
        id: media_id(v.get("id")),
        provider: kind,
        name: text_field(v, name_field).trim().to_string(),
        original_name: text_field(v, original_field).trim().to_string(),
        overview: clean_text(text_field(v, "overview")),
        vote_average: rating(v.get("vote_average"), 1.0),
        keywords: keyword_set(v.pointer(keywords_at), Some("name")),
        release_or_air_date: text_field(v, date_field).to_string(),
        image: non_empty(v.get("poster_path")),
        authors: Vec::new(),
    }
}

fn normalize_google_book(v: &Value) -> NormalizedMediaItem {
    let info = v.get("volumeInfo").unwrap_or(&Value::Null);
    NormalizedMediaItem {
        id: media_id(v.get("id")),
        provider: ProviderKind::GoogleBooks,
        name: text_field(info, "title").trim().to_string(),
        original_name: text_field(info, "subtitle").trim().to_string(),
        overview: clean_text(text_field(info, "description")),
        vote_average: rating(info.get("averageRating"), 2.0),
        keywords: keyword_set(info.get("categories"), None),
        release_or_air_date: text_field(info, "publishedDate").to_string(),
        image: non_empty(info.pointer("/imageLinks/thumbnail")),
        authors: info
            .get("authors")
            .and_then(Value::as_array)
            .map(|a| {
                a.iter()
                    .filter_map(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn media_id(v: Option<&Value>) -> MediaId {
    match v {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => MediaId::Int(i),
            None => MediaId::Text(n.to_string()),
        },
        Some(Value::String(s)) => MediaId::Text(s.clone()),
        _ => MediaId::Text(String::new()),
    }
}

fn text_field<'a>(v: &'a Value, field: &str) -> &'a str {
    v.get(field).and_then(Value::as_str).unwrap_or_default()
}

fn non_empty(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric rating scaled onto 0..=10; non-numbers and non-finite values are absent.
fn rating(v: Option<&Value>, scale: f64) -> Option<f64> {
    let n = v?.as_f64()?;
    if !n.is_finite() {
        return None;
    }
    Some((n * scale).clamp(0.0, 10.0))
}

/// Keywords from an array of strings or of objects carrying `field`.
fn keyword_set(v: Option<&Value>, field: Option<&str>) -> BTreeSet<String> {
    let Some(items) = v.and_then(Value::as_array) else {
        return BTreeSet::new();
    };
    items
        .iter()
        .filter_map(|it| match field {
            Some(f) => it.get(f).and_then(Value::as_str),
            None => it.as_str(),
        })
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Decode entities, strip tags and collapse whitespace. Book descriptions
/// arrive as HTML fragments.
pub fn clean_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}
