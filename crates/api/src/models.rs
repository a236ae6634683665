use chrono::{DateTime, Utc};
use netlife_monitor::{MonitorPhase, WarningSignal};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    pub const fn new(data: T) -> Self {
        Self { data, meta: None }
    }

    pub const fn with_meta(data: T, meta: serde_json::Value) -> Self {
        Self { data, meta: Some(meta) }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub phase: MonitorPhase,
    pub remaining_time_ms: u64,
    pub inactivity_timeout_ms: u64,
    pub warning_lead_time_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub phase: MonitorPhase,
    pub last_activity: DateTime<Utc>,
    pub remaining_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<WarningSignal>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ActivityRequest {
    pub event: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub recorded: bool,
    pub remaining_time_ms: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub session_id: Uuid,
    pub terminated: bool,
}
