//! Two-tab control panel: train a subject from a video link, or convert
//! uploaded files with a trained subject.

mod handlers;
mod page;

use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::{ErrorResponse, StatusResponse};
pub use page::render_page;

const MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Held for the whole of a train or infer run; subjects share no locks
    /// on disk so runs must not overlap.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        AppState {
            pipeline: Arc::new(pipeline),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/subjects", get(handlers::subjects))
        .route("/train", post(handlers::train))
        .route("/infer", post(handlers::infer))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_config(&config)?;
    std::fs::create_dir_all(pipeline.data_dir())?;
    info!("Data directory ready at: {}", pipeline.data_dir().display());

    let app = router(AppState::new(pipeline));
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server running on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
