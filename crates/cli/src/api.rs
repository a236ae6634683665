use crate::init_tracing;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use netlife_api::init_api_server;
use netlife_monitor::MonitorConfig;
use tracing::{info, warn};

/// Combines `--bind` and `--port`; an explicit port replaces the one in `bind`.
pub(crate) fn resolve_bind_address(bind: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => {
            let ip = bind.rsplit_once(':').map_or(bind, |(ip, _)| ip);
            format!("{ip}:{port}")
        }
        None => bind.to_string(),
    }
}

pub async fn handle_serve_command(config: MonitorConfig, bind: String, port: Option<u16>) -> Result<()> {
    init_tracing();

    let bind_address = resolve_bind_address(&bind, port);

    println!("🚀 Starting NetLife session API...");
    println!("📡 Binding to: {bind_address}");

    let api_server = init_api_server(config.clone(), &bind_address).await?;
    let addr = api_server.local_addr()?;

    println!("✅ Session API running on http://{addr}");
    println!("📖 Health check: http://{addr}/api/v1/health");
    println!(
        "⏱  Sessions sign out after {} ms idle, warning {} ms before",
        config.inactivity_timeout_ms, config.warning_lead_time_ms
    );
    println!("📋 Press Ctrl+C to stop the server");
    println!();

    println!("Example usage:");
    println!("  # Open a session");
    println!("  curl -X POST http://{addr}/api/v1/sessions");
    println!();
    println!("  # Report activity (replace SESSION_ID)");
    println!("  curl -X POST http://{addr}/api/v1/sessions/SESSION_ID/activity \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"event\": \"click\"}}'");
    println!();

    let shutdown_signal = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        result = api_server.serve() => {
            if let Err(e) = result {
                warn!("API server error: {}", e);
                return Err(eyre!("API server stopped: {e}"));
            }
        }
        () = shutdown_signal => {
            info!("Shutting down API server...");
            println!("👋 Session API shutting down...");
        }
    }

    Ok(())
}
