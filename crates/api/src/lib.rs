pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod sessions;

pub use error::{ApiError, ApiResult};
pub use models::{
    ActivityRequest, ActivityResponse, ApiResponse, CreateSessionResponse, HealthResponse, LogoutResponse,
    SessionStatusResponse,
};
pub use server::{ApiServer, AppState, build_router};
pub use sessions::SessionRegistry;

use color_eyre::Result;
use netlife_monitor::MonitorConfig;

/// Initializes the session API server.
///
/// # Arguments
///
/// * `config` - Inactivity settings applied to every session the server tracks.
/// * `bind_address` - Address and port to bind to (e.g., "127.0.0.1:3000").
///
/// # Errors
///
/// This function may return an error if:
/// * The configuration is invalid.
/// * The server fails to bind to the specified address and port.
pub async fn init_api_server(config: MonitorConfig, bind_address: &str) -> Result<ApiServer> {
    ApiServer::new(config, bind_address).await
}
