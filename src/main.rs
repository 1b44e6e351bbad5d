//! Flegrei - Campi Flegrei seismicity from your terminal.
//!
//! Fetches events from the INGV catalogue, keeps the Campi Flegrei ones,
//! bins them by magnitude and renders them as tables, deck.gl layer
//! descriptors, or a small web dashboard.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::error;

mod cli;
mod client;
mod config;
mod dashboard;
mod errors;
mod filters;
mod layers;
mod models;
mod output;
mod palette;
mod pipeline;
mod projection;
mod range;
mod server;

use cli::{Cli, Command};
use client::IngvClient;
use dashboard::{DASHBOARD_PANELS, PanelId};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Events(args) => cmd_events(&args),
        Command::Layers(args) => cmd_layers(&args),
        Command::Ui(args) => cmd_ui(&args),
    }
}

/// Initialize tracing subscriber.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the `events` command - one-shot listing of the filtered table.
fn cmd_events(args: &cli::EventsArgs) -> Result<()> {
    let selection = args
        .selection
        .to_selection(Local::now().date_naive())
        .context("invalid selection")?;
    let client = IngvClient::new().context("failed to create INGV client")?;

    let projected =
        pipeline::project(&client, &selection).context("failed to fetch earthquake feed")?;

    let mut events = projected.table.events;
    if let Some(limit) = args.limit {
        events.truncate(limit);
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    output::write_events(&mut handle, &events, args.format)?;

    if args.format == output::Format::Human {
        if let Some(bins) = &projected.table.bins {
            output::write_legend(&mut handle, &bins.legend())?;
        }
    }
    handle.flush()?;

    Ok(())
}

/// Execute the `layers` command - dashboard panels as JSON.
fn cmd_layers(args: &cli::LayersArgs) -> Result<()> {
    let selection = args
        .selection
        .to_selection(Local::now().date_naive())
        .context("invalid selection")?;
    let client = IngvClient::new().context("failed to create INGV client")?;

    let panels: Vec<PanelId> = match args.panel {
        Some(panel) => vec![panel],
        None => DASHBOARD_PANELS.to_vec(),
    };
    let dashboard = pipeline::run(&client, &selection, &panels)
        .context("failed to build dashboard")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&dashboard)
    } else {
        serde_json::to_string(&dashboard)
    }
    .map_err(errors::FlegreiError::from)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{json}")?;

    Ok(())
}

/// Execute the `ui` command - start web server.
fn cmd_ui(args: &cli::UiArgs) -> Result<()> {
    let config = server::ServerConfig {
        port: args.port,
        host: args.host.clone(),
    };

    // Print startup message
    let url = format!("http://{}:{}", args.host, args.port);
    println!("\x1b[1m🌋 Flegrei Dashboard\x1b[0m");
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("  Local:   \x1b[96m{url}\x1b[0m");
    println!("  Feed:    INGV FDSN ({})", config::TARGET_LOCATION);
    println!("\x1b[2m───────────────────────────────────────\x1b[0m");
    println!("\x1b[2mPress Ctrl+C to stop\x1b[0m\n");

    // Open browser if requested (using xdg-open/open command)
    if args.open {
        #[cfg(target_os = "linux")]
        let _ = std::process::Command::new("xdg-open").arg(&url).spawn();
        #[cfg(target_os = "macos")]
        let _ = std::process::Command::new("open").arg(&url).spawn();
        #[cfg(target_os = "windows")]
        let _ = std::process::Command::new("cmd").args(["/c", "start", &url]).spawn();
    }

    // Run the async server on tokio runtime
    tokio::runtime::Runtime::new()
        .context("failed to create tokio runtime")?
        .block_on(server::run_server(config))
}
