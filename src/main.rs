//! Matchday Back binary entrypoint wiring the REST procedures, trigger
//! endpoints, and the record store supervisor.

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new();

    #[cfg(feature = "mongo-store")]
    tokio::spawn(mongo::run_supervisor(
        app_state.clone(),
        config.mongo_uri.clone(),
        config.mongo_db.clone(),
    ));

    #[cfg(not(feature = "mongo-store"))]
    {
        use dao::record_store::memory::MemoryRecordStore;
        use std::sync::Arc;
        tracing::warn!("built without a database backend; records live in process memory only");
        app_state
            .install_record_store(Arc::new(MemoryRecordStore::new()))
            .await;
    }

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "mongo-store")]
mod mongo {
    use std::{sync::Arc, time::Duration};

    use tokio::time::sleep;
    use tracing::{info, warn};

    use crate::{dao::record_store::mongodb::MongoRecordStore, state::SharedState};

    /// Supervise the MongoDB connection by retrying in the background and
    /// toggling degraded mode when connectivity changes.
    pub async fn run_supervisor(state: SharedState, uri: String, db_name: Option<String>) {
        let initial_delay_ms = 1000;
        let mut delay = Duration::from_millis(initial_delay_ms);
        let max_delay = Duration::from_secs(10);

        loop {
            if let Some(store) = state.record_store().await {
                match store.health_check().await {
                    Ok(_) => {
                        // Healthy connection: reset the retry backoff and avoid
                        // hammering the database with pings.
                        delay = Duration::from_millis(initial_delay_ms);
                        sleep(Duration::from_secs(5)).await;
                    }
                    Err(err) => {
                        // Existing connection failed: drop it, flip to degraded
                        // mode, and retry with exponential backoff.
                        warn!(error = %err, "record store ping failed; entering degraded mode");
                        state.clear_record_store().await;
                        sleep(delay).await;
                        delay = (delay * 2).min(max_delay);
                    }
                }
                continue;
            }

            match MongoRecordStore::connect(&uri, db_name.as_deref()).await {
                Ok(store) => {
                    // Fresh connection with indexes ready: install it and leave
                    // degraded mode.
                    info!("connected to MongoDB; leaving degraded mode");
                    state.install_record_store(Arc::new(store)).await;
                    delay = Duration::from_millis(initial_delay_ms);
                }
                Err(err) => {
                    // Could not reach MongoDB at all: wait and retry with
                    // exponential backoff.
                    warn!(error = %err, "MongoDB connection attempt failed");
                    sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                }
            }
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
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
