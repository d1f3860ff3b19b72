use anyhow::{Context, Result};
use sportsbook_ev_api::config::Settings;
use sportsbook_ev_api::routes::router;
use sportsbook_ev_api::{build_state, build_store};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Loads .env as well
    let settings = Settings::from_env()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sportsbook_ev_api=debug")),
        )
        .init();

    info!(
        "Starting Sportsbook EV Analyzer API ({} environment)",
        settings.environment
    );

    let store = build_store(&settings)?;
    info!("Serving odds from {}", store.describe());

    let app = router(build_state(&settings, store));

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down...");
        })
        .await
        .context("Server error")?;

    Ok(())
}
