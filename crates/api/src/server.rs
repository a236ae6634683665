use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use netlife_monitor::{Clock, MonitorConfig, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::handlers;
use crate::sessions::SessionRegistry;

pub struct ApiServer {
    app: Router,
    listener: TcpListener,
    state: Arc<AppState>,
}

pub struct AppState {
    pub sessions: tokio::sync::Mutex<SessionRegistry>,
    pub config: MonitorConfig,
}

impl AppState {
    #[must_use]
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(config: MonitorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: tokio::sync::Mutex::new(SessionRegistry::new(config.clone(), clock)),
            config,
        }
    }

    #[must_use]
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.sessions.get_mut().set_max_sessions(max);
        self
    }
}

impl ApiServer {
    /// # Errors
    /// This function will return an error if:
    /// - The monitor configuration is invalid.
    /// - The TCP binding to the specified address fails.
    pub async fn new(config: MonitorConfig, bind_address: &str) -> color_eyre::Result<Self> {
        config.validate()?;
        let state = Arc::new(AppState::new(config));
        let app = build_router(Arc::clone(&state));

        let listener = TcpListener::bind(bind_address).await?;
        info!("API server will bind to: {}", bind_address);

        Ok(Self { app, listener, state })
    }

    /// Serves requests until the future is dropped. The session sweeper runs for
    /// as long as the server does.
    ///
    /// # Errors
    /// This function will return an error if:
    /// - Retrieving the local socket's address fails.
    /// - Axum fails to serve the application.
    pub async fn serve(self) -> color_eyre::Result<()> {
        let addr = self.listener.local_addr()?;
        info!("API server listening on http://{}", addr);
        if !addr.ip().is_loopback() {
            warn!("API server is reachable from other machines");
        }

        let sweeper = spawn_sweeper(Arc::clone(&self.state));
        let result = axum::serve(self.listener, self.app).await;
        sweeper.abort();
        result?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if getting the local address from the TCP listener fails.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }
}

/// Background task that drives every session's polling timer.
pub fn spawn_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = Duration::from_millis(state.config.poll_interval_ms.clamp(1, 1_000));
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let removed = state.sessions.lock().await.sweep();
            if removed > 0 {
                debug!("Sweeper removed {} session(s)", removed);
            }
        }
    })
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/config", get(handlers::config))
        .route("/api/v1/sessions", post(handlers::create_session))
        .route("/api/v1/sessions/{id}", get(handlers::session_status))
        .route("/api/v1/sessions/{id}/activity", post(handlers::record_activity))
        .route("/api/v1/sessions/{id}/logout", post(handlers::logout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(16 * 1024))
        .with_state(state)
}
