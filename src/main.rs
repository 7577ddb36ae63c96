//! Quizbolt Back binary entrypoint wiring the REST surface, the session
//! store and the collaborator seeds.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizbolt_back::collab::{self, StaticCatalog, StaticTokens};
use quizbolt_back::config::AppConfig;
use quizbolt_back::dao::SessionStore;
use quizbolt_back::dao::store::{file::FileStore, memory::MemoryStore};
use quizbolt_back::routes;
use quizbolt_back::state::{AppState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();

    let (tokens, catalog) = match &config.catalog_path {
        Some(path) => collab::load_seed(path).context("loading collaborator seed")?,
        None => {
            warn!("no catalog seed configured; starting with empty token and quiz tables");
            (StaticTokens::new(), StaticCatalog::new())
        }
    };

    let store: Arc<dyn SessionStore> = match &config.data_path {
        Some(path) => {
            info!(path = %path.display(), "persisting sessions to disk");
            Arc::new(FileStore::new(path.clone()))
        }
        None => {
            warn!("no data path configured; sessions are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let app_state = AppState::new(store, Arc::new(tokens), Arc::new(catalog));
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let Ok(mut term) = signal(SignalKind::terminate()) else {
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
