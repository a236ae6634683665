mod api;
mod simulate;

pub use crate::simulate::{TimelineEntry, TimelineKind, print_timeline, simulate};

use crate::api::handle_serve_command;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use netlife_monitor::{FileDiagnosticStore, MonitorConfig};
use std::path::PathBuf;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: Once = Once::new();

/// Installs the `tracing` subscriber once per process. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

#[derive(Parser, Debug)]
#[command(
    name = "netlife",
    about = "Signs idle NetLife sessions out after a period of inactivity",
    long_about = "NetLife session guard watches user activity and ends a signed-in session \
                  once it has been idle for too long, warning the user shortly before.\n\n\
                  Configuration is read from defaults, then the JSON config file, then \
                  NETLIFE_* environment variables.\n\n\
                  Quick start:\n\
                  1. netlife                          # Terminal session view\n\
                  2. netlife serve --port 3000        # Session API\n\
                  3. netlife simulate --until-ms 200000\n\
                  4. netlife config                   # Effective settings"
)]
pub struct Cli {
    /// Path to a JSON config file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the session keep-alive API server
    Serve {
        #[arg(
            short,
            long,
            default_value = "127.0.0.1:3000",
            help = "Address to bind the API server to"
        )]
        bind: String,
        #[arg(short, long, help = "Port to bind the API server to")]
        port: Option<u16>,
    },

    /// Print the effective monitor configuration as JSON
    Config,

    /// Run the monitor on a simulated clock and print what it would do
    Simulate {
        /// Simulated run length in milliseconds
        #[arg(long)]
        until_ms: u64,
        /// Inject user activity at this offset (repeatable)
        #[arg(long = "activity-at", value_name = "MS")]
        activity_at: Vec<u64>,
        #[arg(long, help = "Print the timeline as JSON")]
        json: bool,
    },
}

impl Cli {
    /// Resolves the monitor configuration for this invocation. Without
    /// `--config-file` the per-user config file is used when it exists.
    ///
    /// # Errors
    /// Returns an error when a named config file is missing or unreadable, or the
    /// result is invalid.
    pub fn monitor_config(&self) -> Result<MonitorConfig> {
        let config = match &self.config_file {
            Some(path) => MonitorConfig::resolve(Some(path))?,
            None => MonitorConfig::resolve_default()?,
        };
        Ok(config)
    }
}

/// Runs one CLI subcommand against an already resolved configuration.
///
/// # Errors
/// Fails when the server cannot bind, the simulation configuration is invalid, or
/// output cannot be serialized.
pub async fn handle_command(cmd: Commands, config: MonitorConfig) -> Result<()> {
    match cmd {
        Commands::Serve { bind, port } => handle_serve_command(config, bind, port).await?,

        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if let Some(path) = MonitorConfig::default_path() {
                println!("# config file: {}", path.display());
            }
            if let Some(path) = FileDiagnosticStore::default_path() {
                println!("# diagnostics: {}", path.display());
            }
        }

        Commands::Simulate {
            until_ms,
            activity_at,
            json,
        } => {
            let entries = simulate(config, until_ms, &activity_at)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_timeline(&entries);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod handle_command_tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simulate_args() {
        let cli = Cli::try_parse_from([
            "netlife",
            "simulate",
            "--until-ms",
            "320000",
            "--activity-at",
            "130000",
            "--activity-at",
            "200000",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Simulate {
                until_ms,
                activity_at,
                json,
            }) => {
                assert_eq!(until_ms, 320_000);
                assert_eq!(activity_at, vec![130_000, 200_000]);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_defaults() {
        let cli = Cli::try_parse_from(["netlife", "serve"]).unwrap();
        match cli.command {
            Some(Commands::Serve { bind, port }) => {
                assert_eq!(bind, "127.0.0.1:3000");
                assert_eq!(port, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["netlife"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config_file.is_none());
    }

    #[test]
    fn test_monitor_config_reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"inactivity_timeout_ms": 600000, "warning_lead_time_ms": 120000}}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["netlife", "--config-file", path, "config"]).unwrap();
        let config = cli.monitor_config().unwrap();
        assert_eq!(config.inactivity_timeout_ms, 600_000);
        assert_eq!(config.warning_lead_time_ms, 120_000);
    }

    #[test]
    fn test_monitor_config_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"inactivity_timeout_ms": 1000, "warning_lead_time_ms": 5000}}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["netlife", "--config-file", path, "config"]).unwrap();
        assert!(cli.monitor_config().is_err());
    }

    #[test]
    fn test_monitor_config_rejects_missing_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let typo = dir.path().join("monitr.json");
        let path = typo.to_str().unwrap();

        let cli = Cli::try_parse_from(["netlife", "--config-file", path, "config"]).unwrap();
        let err = cli.monitor_config().unwrap_err();
        assert!(err.to_string().contains("monitr.json"));
    }

    #[tokio::test]
    async fn test_config_command_ok() {
        let res = handle_command(Commands::Config, MonitorConfig::default()).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn test_simulate_command_ok() {
        let cmd = Commands::Simulate {
            until_ms: 200_000,
            activity_at: vec![50_000],
            json: true,
        };
        assert!(handle_command(cmd, MonitorConfig::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_simulate_command_invalid_config_err() {
        let config = MonitorConfig {
            poll_interval_ms: 0,
            ..MonitorConfig::default()
        };
        let cmd = Commands::Simulate {
            until_ms: 10_000,
            activity_at: Vec::new(),
            json: false,
        };
        assert!(handle_command(cmd, config).await.is_err());
    }
}
