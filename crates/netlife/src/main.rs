use clap::Parser;
use color_eyre::Result;
#[cfg(not(windows))]
use jemallocator::Jemalloc;
#[cfg(windows)]
use mimalloc::MiMalloc;
use netlife_cli::Cli;
use netlife_cli::handle_command;
use netlife_monitor::{DiagnosticStore, FileDiagnosticStore};
use netlife_ui::{App, run_app};
use std::sync::Arc;

#[cfg(windows)]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main]
async fn main() -> Result<()> {
    // If a subcommand is given, run CLI mode; otherwise, launch TUI.
    color_eyre::install()?;
    let cli = Cli::parse();
    let config = cli.monitor_config()?;

    if let Some(cmd) = cli.command {
        match handle_command(cmd, config).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                eprintln!("❌ Error: {err}");
                std::process::exit(1);
            }
        }
    }

    let diagnostics = FileDiagnosticStore::default_path()
        .map(|path| Arc::new(FileDiagnosticStore::new(path)) as Arc<dyn DiagnosticStore>);

    // TUI mode
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;

    let res = {
        let mut app = App::new(config, diagnostics);
        run_app(&mut app)
    };

    crossterm::execute!(
        stdout,
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    crossterm::terminal::disable_raw_mode()?;

    res
}
