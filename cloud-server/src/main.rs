//! URLGuard API Server
//!
//! HTTP surface for phishing analysis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    URLGUARD SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌─────────────────┐  ┌──────────────────┐  │
//! │  │  Router   │→ │  Body parsing   │→ │  Analyzer        │  │
//! │  │  (Axum)   │  │  (field errors) │  │  (blocking pool) │  │
//! │  └───────────┘  └─────────────────┘  └────────┬─────────┘  │
//! │                                               ▼            │
//! │                              ┌──────────────────────────┐  │
//! │                              │ ModelHandle (read-only)  │  │
//! │                              └──────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
#![recursion_limit = "256"]

mod config;
mod error;
mod extract;
mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use urlguard_core::{Analyzer, ModelHandle, TrustedDomains};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging (JSON lines in production)
    let fmt_layer = if config.is_production() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "urlguard_server=debug,urlguard_core=info,tower_http=debug".into()))
        .with(fmt_layer)
        .init();

    tracing::info!("URLGuard server starting ({})", config.environment);

    let models = ModelHandle::load(&config.model_path)
        .with_context(|| format!("failed to load model from {}", config.model_path))?;
    let trusted = TrustedDomains::new(&config.trusted_domains);
    tracing::info!("Trusted domains: {}", trusted.domains().join(", "));

    // Build application state
    let state = AppState {
        analyzer: Arc::new(Analyzer::new(models, trusted)),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let cors = if state.config.is_production() {
        CorsLayer::new()
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/model", get(handlers::model::info))
        .route("/analyze", post(handlers::analyze::analyze))
        .route("/analyze_batch", post(handlers::analyze::analyze_batch))
        .route("/analyze_page", post(handlers::analyze::analyze_page))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %uuid::Uuid::new_v4(),
            )
        }))
        .layer(cors)
        .with_state(state)
}
