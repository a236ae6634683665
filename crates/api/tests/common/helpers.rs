#![allow(dead_code)]
use axum_test::{TestResponse, TestServer};
use chrono::Duration;
use netlife_api::models::{ApiResponse, CreateSessionResponse, SessionStatusResponse};
use netlife_api::sessions::DEFAULT_MAX_SESSIONS;
use netlife_api::{AppState, build_router};
use netlife_monitor::{ManualClock, MonitorConfig};
use std::sync::Arc;
use uuid::Uuid;

use super::fixtures::{activity, scenario_config};

pub struct TestContext {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub clock: ManualClock,
}

impl TestContext {
    pub fn new() -> color_eyre::Result<Self> {
        Self::with_config(scenario_config())
    }

    pub fn with_config(config: MonitorConfig) -> color_eyre::Result<Self> {
        Self::build(config, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_session_limit(limit: usize) -> color_eyre::Result<Self> {
        Self::build(scenario_config(), limit)
    }

    fn build(config: MonitorConfig, max_sessions: usize) -> color_eyre::Result<Self> {
        config.validate()?;
        // Sessions run on simulated time so deadlines can be crossed instantly
        let clock = ManualClock::at_epoch();
        let state = Arc::new(AppState::with_clock(config, Arc::new(clock.clone())).with_max_sessions(max_sessions));
        let app = build_router(Arc::clone(&state));
        let server = TestServer::new(app).unwrap();

        Ok(Self { server, state, clock })
    }

    pub fn advance_ms(&self, ms: i64) {
        self.clock.advance(Duration::milliseconds(ms));
    }

    /// Runs the same pass the background sweeper performs.
    pub async fn sweep(&self) -> usize {
        self.state.sessions.lock().await.sweep()
    }

    pub async fn create_session(&self) -> color_eyre::Result<Uuid> {
        let response = self.server.post("/api/v1/sessions").await;

        if response.status_code() != 200 {
            return Err(color_eyre::eyre::eyre!(
                "Session creation failed with status: {}",
                response.status_code()
            ));
        }

        let body: ApiResponse<CreateSessionResponse> = response.json();
        Ok(body.data.session_id)
    }

    pub async fn send_activity(&self, id: Uuid, event: &str) -> TestResponse {
        self.server
            .post(&format!("/api/v1/sessions/{id}/activity"))
            .json(&activity(event))
            .await
    }

    pub async fn status(&self, id: Uuid) -> TestResponse {
        self.server.get(&format!("/api/v1/sessions/{id}")).await
    }

    pub async fn status_body(&self, id: Uuid) -> SessionStatusResponse {
        let response = self.status(id).await;
        response.assert_status_ok();
        let body: ApiResponse<SessionStatusResponse> = response.json();
        body.data
    }
}
