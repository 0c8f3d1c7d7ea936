//! The point service: table loading, projection and per-endpoint failure policy.

use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use geopoints_core::{ErrorKind, GeoPointsError, PointSet, SourceTable, TableSource, project_points};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::config::{FailurePolicy, ServiceConfig};

/// The endpoints a failure can be settled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /api/points`
    Points,
    /// `POST /api/upload-pickle`
    Upload,
}

impl Endpoint {
    /// Route path, used in logs.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Points => "/api/points",
            Endpoint::Upload => "/api/upload-pickle",
        }
    }

    /// Status for a loud failure of this kind.
    ///
    /// Bad uploads are the client's fault; a bad source file is the server's.
    #[must_use]
    pub fn status_for(&self, kind: ErrorKind) -> StatusCode {
        match (self, kind) {
            (Endpoint::Points, ErrorKind::SourceUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            (Endpoint::Upload, ErrorKind::MalformedUpload | ErrorKind::SchemaInvalid) => {
                StatusCode::BAD_REQUEST
            },
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A file received by the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name, used as a format hint
    pub file_name: Option<String>,
    /// Raw file contents
    pub bytes: Bytes,
}

/// An error response: a status and a message safe to show the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Client-facing message
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

/// Loads tables from its injected source and turns them into point sets.
pub struct PointService {
    source: Arc<dyn TableSource>,
    config: ServiceConfig,
}

impl PointService {
    /// Creates a service reading from `source`.
    #[must_use]
    pub fn new(source: Arc<dyn TableSource>, config: ServiceConfig) -> Self {
        Self { source, config }
    }

    /// The service configuration.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serves `GET /api/points` under the configured policy.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] only when the points policy is [`FailurePolicy::Loud`].
    pub async fn points(&self) -> Result<PointSet, ApiError> {
        let result = self.load_points().await;
        self.settle(Endpoint::Points, result)
    }

    /// Loads the configured source and projects it with the points row limit.
    ///
    /// # Errors
    ///
    /// Returns the loading or projection error unchanged.
    pub async fn load_points(&self) -> geopoints_core::Result<PointSet> {
        debug!(source = %self.source.describe(), "Loading points");
        let table = self.source.load().await?;
        project_points(&table, self.config.schema, self.config.points_row_limit).await
    }

    /// Decodes an uploaded file and projects it with the upload row limit.
    ///
    /// # Errors
    ///
    /// Returns the decoding or projection error unchanged.
    pub async fn decode_upload(&self, file: UploadedFile) -> geopoints_core::Result<PointSet> {
        debug!(
            file_name = file.file_name.as_deref().unwrap_or("<unnamed>"),
            bytes = file.bytes.len(),
            "Decoding upload"
        );
        let table = SourceTable::from_bytes(file.bytes, file.file_name.as_deref())?;
        project_points(&table, self.config.schema, self.config.upload_row_limit).await
    }

    /// Applies the endpoint's failure policy to a pipeline result.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the result failed and the policy is loud.
    pub fn settle(
        &self,
        endpoint: Endpoint,
        result: geopoints_core::Result<PointSet>,
    ) -> Result<PointSet, ApiError> {
        let err = match result {
            Ok(set) => return Ok(set),
            Err(err) => err,
        };

        match self.policy(endpoint) {
            FailurePolicy::Soft => {
                error!(endpoint = endpoint.path(), error = %err, "Returning empty point set");
                Ok(PointSet::empty())
            },
            FailurePolicy::Loud => Err(self.reject(endpoint, &err)),
        }
    }

    fn policy(&self, endpoint: Endpoint) -> FailurePolicy {
        match endpoint {
            Endpoint::Points => self.config.points_policy,
            Endpoint::Upload => self.config.upload_policy,
        }
    }

    fn reject(&self, endpoint: Endpoint, err: &GeoPointsError) -> ApiError {
        let status = endpoint.status_for(err.kind());
        if status.is_client_error() {
            warn!(endpoint = endpoint.path(), error = %err, "Rejecting request");
        } else {
            error!(endpoint = endpoint.path(), error = %err, "Request failed");
        }
        ApiError {
            status,
            message: err.user_message(),
        }
    }
}
