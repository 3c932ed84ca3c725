use super::AppState;
use super::page::render_page;
use crate::domain::entities::Subject;
use crate::domain::errors::AppError;
use crate::pipeline::{DONE, Upload};
use axum::extract::{Form, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub details: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub code: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        let details = match &err {
            AppError::ProcessFailed { stderr, .. } if !stderr.is_empty() => Some(stderr.clone()),
            _ => None,
        };
        ErrorResponse {
            code: status_for(&err),
            error: err.to_string(),
            details,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.code, Json(self)).into_response()
    }
}

pub(crate) fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidInput(_) | AppError::VideoNotFound(_) | AppError::EmptyUpload => StatusCode::BAD_REQUEST,
        AppError::ModelNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn internal(error: impl std::fmt::Display) -> ErrorResponse {
    ErrorResponse {
        code: StatusCode::INTERNAL_SERVER_ERROR,
        error: "Pipeline run aborted".to_string(),
        details: Some(error.to_string()),
    }
}

fn done<T: Serialize>(report: &T) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: DONE.to_string(),
        details: serde_json::to_value(report).unwrap_or_default(),
    })
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ErrorResponse> {
    let subjects = state.pipeline.subjects()?;
    Ok(Html(render_page(&subjects)))
}

pub async fn subjects(State(state): State<AppState>) -> Result<Json<Vec<String>>, ErrorResponse> {
    Ok(Json(state.pipeline.subjects()?))
}

#[derive(Debug, Deserialize)]
pub struct TrainForm {
    pub subject: String,
    pub url: String,
}

pub async fn train(
    State(state): State<AppState>,
    Form(form): Form<TrainForm>,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    let subject = Subject::new(&form.subject)?;
    let _guard = state.run_lock.lock().await;
    info!("Training requested for {}", subject.name);

    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || pipeline.train(&subject, &form.url))
        .await
        .map_err(internal)?
        .inspect_err(|e| warn!("Training failed: {}", e))?;
    Ok(done(&report))
}

pub async fn infer(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<StatusResponse>, ErrorResponse> {
    let mut subject = None;
    let mut uploads = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| ErrorResponse {
        code: StatusCode::BAD_REQUEST,
        error: "Malformed upload".to_string(),
        details: Some(e.to_string()),
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "subject" => {
                let text = field.text().await.map_err(|e| AppError::InvalidInput(e.to_string()))?;
                subject = Some(Subject::new(&text)?);
            }
            "files" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    warn!("Failed to read file bytes: {}", e);
                    AppError::InvalidInput(format!("could not read {}: {}", file_name, e))
                })?;
                uploads.push(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let subject = subject.ok_or_else(|| AppError::InvalidInput("no subject selected".to_string()))?;
    let _guard = state.run_lock.lock().await;
    info!("Inference requested for {} with {} uploads", subject.name, uploads.len());

    let pipeline = state.pipeline.clone();
    let report = tokio::task::spawn_blocking(move || {
        let files = pipeline.store_uploads(&subject, uploads)?;
        pipeline.infer(&subject, &files)
    })
    .await
    .map_err(internal)?
    .inspect_err(|e| warn!("Inference failed: {}", e))?;
    Ok(done(&report))
}
