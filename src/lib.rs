// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod discover;
pub mod filter;
pub mod metrics;
pub mod normalize;
pub mod search;
pub mod session;

pub use crate::api::{router, AppState};
pub use crate::search::{QueryOrchestrator, SearchOutcome};

use axum::Router;

/// `DEBUG_ROUTES=1` mounts `/metrics`.
pub fn debug_routes_enabled() -> bool {
    std::env::var("DEBUG_ROUTES").ok().is_some_and(|v| v.trim() == "1")
}

/// Full application router wired from the environment.
pub async fn app() -> anyhow::Result<Router> {
    let settings = config::CatalogSettings::from_env();
    let state = AppState::from_env(&settings)?;
    let mut router = router(state);
    if debug_routes_enabled() {
        let m = metrics::Metrics::init(&settings)?;
        router = router.merge(m.router());
    }
    tracing::info!(debug_routes = debug_routes_enabled(), "router ready");
    Ok(router)
}
