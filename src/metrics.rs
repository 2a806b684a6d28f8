// src/metrics.rs
use anyhow::Context;
use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::config::CatalogSettings;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static GLOBAL: OnceCell<Metrics> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder (once per process) and publish the
    /// static configuration gauges.
    pub fn init(settings: &CatalogSettings) -> anyhow::Result<&'static Self> {
        let m = GLOBAL.get_or_try_init(|| -> anyhow::Result<Metrics> {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .context("prometheus: install recorder")?;
            Ok(Metrics { handle })
        })?;

        gauge!("discover_feed_ttl_seconds").set(settings.feed_ttl.as_secs_f64());
        gauge!("catalog_detail_concurrency").set(settings.detail_concurrency as f64);
        Ok(m)
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
