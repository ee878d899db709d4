use axum::{extract::State, response::Json};
use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::state::AppState;
use super::ApiResponse;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    // A failed ping degrades the status instead of failing the request
    let database = state.db().execute_unprepared("SELECT 1").await.is_ok();
    Json(ApiResponse::success(HealthStatus {
        status: if database { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database,
    }))
}
