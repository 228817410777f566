use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::food::analysis::{AnalysisError, FoodAnalyzer};
use crate::food::intake::IntakeError;

/// Multipart field names accepted for the uploaded photo.
pub const IMAGE_FIELDS: &[&str] = &["image", "foodImage"];

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<FoodAnalyzer>,
}

#[derive(Serialize)]
struct ApiResponse {
    message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            tracing::error!("Error analyzing image: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(ApiResponse { message: self.public_message() })).into_response()
    }
}

/// Create and configure the API router
pub fn create_api(analyzer: Arc<FoodAnalyzer>, config: &AppConfig) -> Router {
    let state = AppState { analyzer };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    // One permit pool shared by both analyze routes.
    let analyze = post(analyze_image_handler)
        .layer::<_, Infallible>(DefaultBodyLimit::max(config.max_upload_bytes as usize))
        .layer::<_, Infallible>(GlobalConcurrencyLimitLayer::new(config.max_concurrent_analyses as usize));

    Router::new()
        .route("/api/analyze-image", analyze.clone())
        .route("/api/food/analyze-image", analyze)
        .route("/health", get(health_check))
        .fallback_service(static_files(&config.public_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn static_files(public_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(public_dir).fallback(ServeFile::new(public_dir.join("index.html")))
}

async fn analyze_image_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A request that is not multipart at all carries no image field either.
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::debug!("Rejected non-multipart upload: {}", rejection);
            return AnalysisError::from(IntakeError::Missing).into_response();
        }
    };

    let upload = match read_image_field(multipart).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return AnalysisError::from(IntakeError::Missing).into_response(),
        Err(status) => {
            return (status, Json(ApiResponse { message: "Invalid upload".to_string() })).into_response();
        }
    };

    match state.analyzer.analyze(&upload).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => e.into_response(),
    }
}

// First matching image field wins; other fields are ignored.
async fn read_image_field(mut multipart: Multipart) -> Result<Option<Vec<u8>>, StatusCode> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!("Failed to read multipart body: {}", e);
                return Err(e.status());
            }
        };

        let is_image = field.name().map(|name| IMAGE_FIELDS.contains(&name)).unwrap_or(false);
        if !is_image {
            continue;
        }

        return match field.bytes().await {
            Ok(bytes) => Ok(Some(bytes.to_vec())),
            Err(e) => {
                tracing::warn!("Failed to read uploaded image: {}", e);
                Err(e.status())
            }
        };
    }
}

async fn health_check() -> Response {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
    .into_response()
}
