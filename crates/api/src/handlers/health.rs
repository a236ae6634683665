use crate::models::{ApiResponse, HealthResponse};
use crate::server::AppState;
use axum::Json;
use axum::extract::State;
use netlife_monitor::MonitorConfig;
use std::sync::Arc;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let active_sessions = state.sessions.lock().await.len();

    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        active_sessions,
    };

    Json(ApiResponse::new(response))
}

pub async fn config(State(state): State<Arc<AppState>>) -> Json<ApiResponse<MonitorConfig>> {
    Json(ApiResponse::new(state.config.clone()))
}
