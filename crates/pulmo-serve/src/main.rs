//! pulmo-serve entry point.
//!
//! This file is intentionally thin: it sets up tracing, reads the runtime
//! environment, builds the shared state, spawns the background model loader,
//! wires middleware, and starts the HTTP server. All route handlers live in
//! `routes.rs`; all shared state types live in `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{bail, Context};
use axum::http::{HeaderValue, Method};
use pulmo_config::EnvConfig;
use pulmo_registry::{HttpRegistry, Stage};
use pulmo_serve::{loader, routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let env = EnvConfig::from_env().context("invalid runtime environment")?;
    let model_name = env
        .model_name
        .clone()
        .context("PULMO_MODEL_NAME must be set for serving")?;

    let preferred_stage = match env.serving_stage.as_str() {
        "current-serving" => Stage::CurrentServing,
        "experiment" => Stage::Experiment,
        other => bail!("CONFIG_INVALID: PULMO_SERVING_STAGE={other}"),
    };

    let registry = Arc::new(HttpRegistry::new(env.registry_url.clone()));
    let shared = Arc::new(state::AppState::new(
        registry,
        model_name,
        preferred_stage,
        env.poll_timeout,
        env.poll_interval,
    ));

    // The server starts accepting requests immediately; until the loader
    // installs a model, prediction endpoints answer 503.
    loader::spawn_loader(Arc::clone(&shared));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr = bind_addr_from_env().unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 5001)));
    info!("pulmo-serve listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

/// Resolves on Ctrl-C / SIGINT; in-flight requests drain before exit.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, draining connections");
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn bind_addr_from_env() -> Option<SocketAddr> {
    std::env::var("PULMO_SERVE_ADDR").ok()?.parse().ok()
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
