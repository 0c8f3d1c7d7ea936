//! HTTP routes for the point service.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use geopoints_core::PointSet;
use geopoints_core::error::{FormatError, GeoPointsError};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServiceConfig;
use crate::service::{ApiError, Endpoint, PointService, UploadedFile};

/// Multipart field the upload is expected in.
const UPLOAD_FIELD: &str = "file";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<PointService>,
}

/// Builds the router with CORS, request tracing and the upload body limit applied.
pub fn router(service: Arc<PointService>) -> Router {
    let config = service.config();
    let body_limit = match config.max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };
    let cors = cors_layer(config);

    Router::new()
        .route("/api/points", get(get_points))
        .route("/api/upload-pickle", post(upload_table).layer(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

async fn get_points(State(state): State<AppState>) -> Result<Json<PointSet>, ApiError> {
    state.service.points().await.map(Json)
}

async fn upload_table(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PointSet>, ApiError> {
    let result = match read_upload(multipart).await {
        Ok(file) => state.service.decode_upload(file).await,
        Err(err) => Err(err),
    };
    state.service.settle(Endpoint::Upload, result).map(Json)
}

/// Pulls the uploaded file out of the form.
///
/// The `file` field wins; otherwise the first field carrying a file name is used.
async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> geopoints_core::Result<UploadedFile> {
    let mut multipart = multipart.map_err(|e| malformed(&e))?;
    let mut fallback = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| malformed(&e))? {
        let is_upload_field = field.name() == Some(UPLOAD_FIELD);
        if !is_upload_field && field.file_name().is_none() {
            continue;
        }

        let file_name = field.file_name().map(ToString::to_string);
        let bytes = field.bytes().await.map_err(|e| malformed(&e))?;
        let file = UploadedFile { file_name, bytes };
        if is_upload_field {
            return Ok(file);
        }
        fallback.get_or_insert(file);
    }

    fallback.ok_or_else(|| FormatError::Empty.into())
}

fn malformed(err: &dyn std::fmt::Display) -> GeoPointsError {
    FormatError::Parse {
        format: "multipart form".to_string(),
        message: err.to_string(),
    }
    .into()
}

fn cors_layer(config: &ServiceConfig) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
