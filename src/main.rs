//! ClickNotes catalog service: binary entrypoint.
//! Boots the Axum HTTP server under Shuttle.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs. `RUST_LOG` wins when set; otherwise the pipeline
/// targets log at info. Skipped if the runtime already installed a subscriber.
fn enable_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("catalog=info,search=info,discover=info,ratings=info,clicknotes=info,warn")
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_tracing();

    let router = clicknotes::app().await?;
    Ok(router.into())
}
