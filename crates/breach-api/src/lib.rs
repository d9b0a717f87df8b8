//! BREACH API: web surface over the extract/solve pipeline
//!
//! `POST /` runs a submit through the pipeline and redirects to
//! `GET /?dataToken=..&breachToken=..`, which consumes the cached results
//! and renders them.
pub mod backend;
pub mod config;
pub mod form;
pub mod handlers;
pub mod metrics;
pub mod middleware;

pub use backend::HttpBackend;
pub use config::{AppConfig, ConfigError};

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use breach_core::{BackendClient, PipelineOrchestrator, ResultStore};
use breach_out::{PageRenderer, ViewAssembler};
use metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ResultStore>,
    pub orchestrator: Arc<PipelineOrchestrator>,
    pub views: Arc<ViewAssembler>,
    pub pages: Arc<PageRenderer>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(backend: Arc<dyn BackendClient>, pages: PageRenderer) -> Result<Self, prometheus::Error> {
        let store = Arc::new(ResultStore::new());
        Ok(Self {
            orchestrator: Arc::new(PipelineOrchestrator::new(backend, store.clone())),
            views: Arc::new(ViewAssembler::new(store.clone())),
            store,
            pages: Arc::new(pages),
            metrics: Arc::new(Metrics::new()?),
        })
    }
}

pub fn create_app(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index).post(handlers::submit))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(axum::middleware::from_fn(middleware::no_store))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drops cached results older than `max_age`.
pub fn spawn_sweeper(store: Arc<ResultStore>, max_age: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = store.sweep_older_than(max_age);
            if removed > 0 {
                info!(removed, remaining = store.len(), "swept expired results");
            }
        }
    })
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let backend = HttpBackend::new(config.backend_url.clone()).context("building backend client")?;
    let pages = PageRenderer::load(&config.templates_path)
        .with_context(|| format!("loading templates from {}", config.templates_path))?;
    let state = AppState::new(Arc::new(backend), pages).context("registering metrics")?;

    if let Some(max_age) = config.cache_max_age {
        spawn_sweeper(state.store.clone(), max_age, config.sweep_interval);
    }

    let app = create_app(state, config.max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;

    info!(addr = %config.listen_addr, backend = %config.backend_url, "Breach API listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
