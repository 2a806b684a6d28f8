// src/catalog/fetcher.rs
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::{Endpoint, FetchError};

/// One outbound GET returning a JSON document. Implementations perform exactly
/// one request per call; callers own any retry policy.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, FetchError>;
}

/// Production fetcher on top of a shared `reqwest::Client`.
pub struct ReqwestFetcher {
    http: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("clicknotes/0.1 (+github.com/drensokoli/clicknotes)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self { http })
    }
}

/// Map an HTTP status to the catalog failure taxonomy. `None` means success.
pub fn classify_status(status: StatusCode) -> Option<FetchError> {
    if status.is_success() {
        return None;
    }
    Some(match status.as_u16() {
        401 | 403 => FetchError::Unauthorized,
        429 => FetchError::RateLimited,
        _ => FetchError::Unreachable(format!("http status {}", status.as_u16())),
    })
}

#[async_trait]
impl JsonFetcher for ReqwestFetcher {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        let t0 = std::time::Instant::now();

        // reqwest errors embed the full URL (and therefore the key); strip it.
        let resp = match self.http.get(endpoint.url().clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                let e = e.without_url();
                tracing::warn!(target: "catalog", endpoint = endpoint.label, error = %e, "catalog request failed");
                counter!("catalog_requests_failed_total", "endpoint" => endpoint.label).increment(1);
                return Err(FetchError::Unreachable(e.to_string()));
            }
        };

        let status = resp.status();
        if let Some(err) = classify_status(status) {
            tracing::warn!(
                target: "catalog",
                endpoint = endpoint.label,
                status = status.as_u16(),
                "catalog api error"
            );
            counter!("catalog_requests_failed_total", "endpoint" => endpoint.label).increment(1);
            return Err(err);
        }

        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Malformed(e.without_url().to_string()))?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("catalog_request_ms", "endpoint" => endpoint.label).record(ms);
        tracing::debug!(target: "catalog", endpoint = endpoint.label, ms, "catalog request ok");
        Ok(body)
    }
}
