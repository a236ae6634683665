use crate::error::{ApiError, ApiResult};
use crate::models::{
    ActivityRequest, ActivityResponse, ApiResponse, CreateSessionResponse, LogoutResponse, SessionStatusResponse,
};
use crate::server::AppState;
use crate::sessions::ActivityOutcome;
use axum::Json;
use axum::extract::{Path, State};
use netlife_monitor::ActivityEvent;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

fn not_found(id: &Uuid) -> ApiError {
    ApiError::NotFound(format!("Session {id} not found or expired"))
}

/// # Errors
///
/// Returns `ServiceUnavailable` when the live session limit is reached.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ApiResponse<CreateSessionResponse>>> {
    let (session_id, snapshot) = state
        .sessions
        .lock()
        .await
        .create()
        .ok_or_else(|| ApiError::ServiceUnavailable("Too many live sessions, try again later".to_string()))?;
    info!("Session {} started", session_id);

    let config = &state.config;
    let response = CreateSessionResponse {
        session_id,
        phase: snapshot.phase,
        remaining_time_ms: snapshot.remaining_time_ms,
        inactivity_timeout_ms: config.inactivity_timeout_ms,
        warning_lead_time_ms: config.warning_lead_time_ms,
        poll_interval_ms: config.poll_interval_ms,
    };
    let events: Vec<&str> = config.activity_events.iter().map(|e| e.as_str()).collect();

    Ok(Json(ApiResponse::with_meta(response, json!({ "activity_events": events }))))
}

/// # Errors
///
/// Returns `NotFound` if the session does not exist or has already been reported
/// as terminated.
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<SessionStatusResponse>>> {
    let (snapshot, warning) = state.sessions.lock().await.refresh(&id).ok_or_else(|| not_found(&id))?;

    Ok(Json(ApiResponse::new(SessionStatusResponse {
        session_id: id,
        phase: snapshot.phase,
        last_activity: snapshot.last_activity,
        remaining_time_ms: snapshot.remaining_time_ms,
        warning,
    })))
}

/// # Errors
///
/// This function returns an error if:
/// - The event name is not a known activity event (`BadRequest`)
/// - The session does not exist (`NotFound`)
/// - The session has already been terminated (`Conflict`)
pub async fn record_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActivityRequest>,
) -> ApiResult<Json<ApiResponse<ActivityResponse>>> {
    let event = ActivityEvent::from_str(&request.event)?;

    let outcome = state
        .sessions
        .lock()
        .await
        .record_event(&id, event)
        .ok_or_else(|| not_found(&id))?;

    match outcome {
        ActivityOutcome::Recorded {
            counted,
            remaining_time_ms,
        } => Ok(Json(ApiResponse::new(ActivityResponse {
            recorded: counted,
            remaining_time_ms,
        }))),
        ActivityOutcome::Ended => Err(ApiError::Conflict(format!("Session {id} has ended"))),
    }
}

/// # Errors
///
/// Returns `NotFound` if the session does not exist.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LogoutResponse>>> {
    if !state.sessions.lock().await.logout(&id) {
        return Err(not_found(&id));
    }
    info!("Session {} logged out", id);

    Ok(Json(ApiResponse::new(LogoutResponse {
        session_id: id,
        terminated: true,
    })))
}
