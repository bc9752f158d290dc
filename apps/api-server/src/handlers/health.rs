//! Health check endpoint.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_queue: Option<QueueHealth>,
}

#[derive(Serialize)]
pub struct QueueHealth {
    pub pending: usize,
    pub processing: usize,
    pub failed: usize,
}

/// Health check endpoint - returns server status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let cleanup_queue = match state.jobs.stats().await {
        Ok(stats) => Some(QueueHealth {
            pending: stats.pending,
            processing: stats.processing,
            failed: stats.failed,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Job queue stats unavailable");
            None
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
        cleanup_queue,
    })
}
