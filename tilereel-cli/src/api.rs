//! HTTP surface for job submission, status polling and artifact download.
//!
//! | Method | Path               | Response                              |
//! |--------|--------------------|---------------------------------------|
//! | POST   | `/animations`      | `202 {"jobId"}` or `400 {"error"}`    |
//! | GET    | `/animations/:id`  | `{"jobId","status","url"?,"error"?}`  |
//! | GET    | `<files>/*`        | finished artifacts                    |
//! | GET    | `/healthz`         | `ok`                                  |

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tilereel::config::DEFAULT_URL_PREFIX;
use tilereel::job::{AnimationJob, JobId};
use tilereel::provider::AsyncHttpClient;
use tilereel::request::AnimationRequest;
use tilereel::service::{AnimationService, SubmitError};
use tower_http::services::ServeDir;
use tracing::{info, warn};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ApiErrorBody { error })).into_response()
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: JobId,
}

/// Builds the router. Artifacts are served from the service's output
/// directory under the path component of its URL prefix.
pub fn router<C: AsyncHttpClient>(service: AnimationService<C>) -> Router {
    let files = ServeDir::new(service.config().output_dir());
    let mount = mount_path(service.config().url_prefix());

    Router::new()
        .route("/healthz", get(health))
        .route("/animations", post(submit::<C>))
        .route("/animations/:id", get(status::<C>))
        .nest_service(&mount, files)
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

async fn submit<C: AsyncHttpClient>(
    State(service): State<AnimationService<C>>,
    body: Result<Json<AnimationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let job_id = service.submit(&request).await.map_err(|e| {
        warn!(error = %e, "Rejected animation request");
        ApiError::from(e)
    })?;
    info!(job_id = %job_id, "Accepted animation request");

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { job_id })))
}

async fn status<C: AsyncHttpClient>(
    State(service): State<AnimationService<C>>,
    Path(id): Path<String>,
) -> Result<Json<AnimationJob>, ApiError> {
    let id = JobId::new(id);
    service
        .status(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("unknown job {}", id)))
}

/// Path component of a URL prefix such as `/files` or
/// `https://cdn.example.com/media`. Falls back to the default prefix when
/// the prefix has no path.
pub fn mount_path(url_prefix: &str) -> String {
    let path = match url_prefix.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => url_prefix,
    };
    let path = path.trim_end_matches('/');

    if path.is_empty() {
        DEFAULT_URL_PREFIX.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
