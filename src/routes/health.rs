//! Health check endpoint

use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::sync::iso_timestamp;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: iso_timestamp(Utc::now()),
    })
}
