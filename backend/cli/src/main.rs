mod api;
mod doctor_cmd;
mod generate_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use esprobe_config::EsprobeConfig;
use esprobe_core::EsprobeError;
use esprobe_export::{Exporter, SpreadsheetCapability};
use esprobe_logging::{bootstrap_logger, init_logger, redact_sensitive_data, LogSettings};
use esprobe_session::SessionRegistry;

use api::AppState;
use generate_cmd::GenerateArgs;
use terminal_output::note_error;

#[derive(Parser)]
#[command(name = "esprobe")]
#[command(about = "esprobe: interview question sheets from entry-sheet PDFs")]
#[command(version)]
struct Cli {
    /// YAML config file (defaults to ~/.esprobe/config.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a question sheet from one PDF and export it
    Generate(GenerateArgs),
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check configuration and environment
    Doctor,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = {
        let _bootstrap = bootstrap_logger();
        esprobe_config::load(cli.config.as_deref()).await?
    };

    init_logger(&LogSettings {
        level: config.logging.level.clone(),
        dir: config.logging.dir.as_ref().map(PathBuf::from),
        json: config.logging.json,
    });

    match cli.command {
        Commands::Generate(args) => {
            esprobe_config::ensure_valid(&config)?;
            generate_cmd::run(args, &config).await
        }
        Commands::Serve { port } => {
            esprobe_config::ensure_valid(&config)?;
            run_server(config, port).await
        }
        Commands::Doctor => {
            let path = cli
                .config
                .unwrap_or_else(|| esprobe_config::config_file_path(&esprobe_config::config_dir()));
            doctor_cmd::run(&config, &path).await
        }
    }
}

/// Log the full cause chain and show the user-facing message.
fn report_error(e: &anyhow::Error) {
    error!(error = %redact_sensitive_data(&format!("{e:#}")), "Command failed");
    match e.downcast_ref::<EsprobeError>() {
        Some(err) => note_error(&err.user_message()),
        None => note_error(&redact_sensitive_data(&format!("{e:#}"))),
    }
}

async fn run_server(config: EsprobeConfig, port: Option<u16>) -> Result<()> {
    // No input is accepted without a key.
    let provider = generate_cmd::gemini_provider(&config)?;
    let generator = generate_cmd::build_generator(&config, provider, false);

    let exporter = Exporter::new();
    if let SpreadsheetCapability::Unavailable(reason) = exporter.capability() {
        warn!(reason = %reason, "XLSX export disabled");
    }

    let registry = SessionRegistry::new();
    let idle = Duration::from_secs(config.server.session_idle_secs);
    let sweeper = registry.spawn_idle_sweeper(idle, sweep_interval(idle));

    let state = Arc::new(AppState {
        registry,
        generator: Arc::new(generator),
        exporter,
    });

    let app = api::build_router(state, config.server.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!(
        "{}:{}",
        config.server.bind_address,
        port.unwrap_or(config.server.port)
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(
        addr = %addr,
        model = %config.gemini.model,
        session_idle_secs = config.server.session_idle_secs,
        "HTTP API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

/// Sweep often enough that a session outlives its timeout by at most a minute.
fn sweep_interval(idle: Duration) -> Duration {
    idle.min(Duration::from_secs(60))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
