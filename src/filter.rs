// src/filter.rs
//! Suitability filter. Three independent rules; an item is kept only if none
//! of them rejects it.

use crate::config::SuitabilityPolicy;
use crate::normalize::NormalizedMediaItem;

/// Which rule rejected an item.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Rating present and at or below the floor.
    QualityFloor { vote_average: f64 },
    /// A keyword equals a denylisted term.
    Keyword { term: String },
    /// A denylisted term occurs inside a title or overview.
    Substring { field: &'static str, term: String },
}

impl Rejection {
    pub fn rule(&self) -> &'static str {
        match self {
            Rejection::QualityFloor { .. } => "quality_floor",
            Rejection::Keyword { .. } => "keyword",
            Rejection::Substring { .. } => "substring",
        }
    }
}

pub fn is_suitable(item: &NormalizedMediaItem, policy: &SuitabilityPolicy) -> bool {
    rejection(item, policy).is_none()
}

/// First rule that rejects `item`, checked in rule order.
pub fn rejection(item: &NormalizedMediaItem, policy: &SuitabilityPolicy) -> Option<Rejection> {
    if let Some(v) = item.vote_average {
        if v <= policy.min_vote_average() {
            return Some(Rejection::QualityFloor { vote_average: v });
        }
    }

    // Keywords are stored lower-cased, as are policy terms.
    if let Some(term) = item
        .keywords
        .iter()
        .find(|k| policy.denylist().contains(k.to_lowercase().as_str()))
    {
        return Some(Rejection::Keyword { term: term.clone() });
    }

    for (field, text) in [
        ("name", &item.name),
        ("original_name", &item.original_name),
        ("overview", &item.overview),
    ] {
        if text.is_empty() {
            continue;
        }
        let lower = text.to_lowercase();
        if let Some(term) = policy.denylist().iter().find(|t| lower.contains(t.as_str())) {
            return Some(Rejection::Substring {
                field,
                term: term.clone(),
            });
        }
    }

    None
}
