//! HTTP service exposing geographic points as JSON.
//!
//! Two endpoints share one [`PointService`]:
//! - `GET /api/points` projects the configured table source.
//! - `POST /api/upload-pickle` projects a table uploaded as a multipart file.
//!
//! Each endpoint has its own [`FailurePolicy`]: soft failures answer 200 with an empty
//! point set, loud ones answer with an error status and a `{"error": ...}` body.

pub mod config;
pub mod routes;
pub mod service;

use std::sync::Arc;

use anyhow::Result;
use geopoints_core::TableSource;
use tracing::info;

pub use config::{FailurePolicy, ServiceConfig};
pub use routes::router;
pub use service::{ApiError, Endpoint, PointService, UploadedFile};

/// Serves the point API on `config.bind` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(source: Arc<dyn TableSource>, config: ServiceConfig) -> Result<()> {
    let bind = config.bind;
    info!(
        source = %source.describe(),
        schema = %config.schema,
        row_limit = ?config.points_row_limit,
        "Starting point service"
    );
    let service = Arc::new(PointService::new(source, config));
    let app = router(service);

    info!("Listening for web traffic on {bind}");
    axum::Server::try_bind(&bind)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
