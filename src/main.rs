//! keipes-mcp: MCP server exposing schema-described tools over JSON-RPC 2.0
//!
//! Serves the built-in tools and the file/web resources over stdio.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use keipes_mcp::config::{self, Config};
use keipes_mcp::mcp::{Dispatcher, McpServer, StdioTransport};
use keipes_mcp::resources::{FileSystemResource, ResourceRegistry, WebContentResource};
use keipes_mcp::tools::ToolRegistry;

/// MCP server exposing schema-described tools over JSON-RPC 2.0.
///
/// Reads newline-delimited requests on stdin and writes responses on stdout.
#[derive(Parser, Debug)]
#[command(name = "keipes-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries protocol messages.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the dispatcher from the built-in tools and configured resources.
fn build_dispatcher(cfg: &Config) -> Result<Dispatcher, Box<dyn Error>> {
    let tools = ToolRegistry::with_builtin_tools()?;

    let mut resources = ResourceRegistry::new();
    resources.register(Arc::new(FileSystemResource::new(
        cfg.resources.allowed_paths.clone(),
    )))?;
    if cfg.resources.enable_web {
        let timeout = Duration::from_secs(cfg.resources.fetch_timeout_secs);
        resources.register(Arc::new(WebContentResource::new(timeout)?))?;
    }

    info!(
        tools = tools.len(),
        resources = resources.len(),
        allowed_paths = ?cfg.resources.allowed_paths,
        "Registries built"
    );

    Ok(Dispatcher::new(tools, resources).with_server_name(cfg.server.name.clone()))
}

/// Entry point for the keipes-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nWhile reading: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        server_name = %cfg.server.name,
        "Starting keipes-mcp server"
    );

    let dispatcher = match build_dispatcher(&cfg) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            error!(error = %e, "Failed to build server");
            return ExitCode::FAILURE;
        }
    };
    let server = McpServer::new(dispatcher);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let result: std::io::Result<()> = runtime.block_on(async {
        server
            .connect(StdioTransport::stdio())
            .await
            .map_err(std::io::Error::other)?;
        info!("MCP server ready, waiting for client requests...");
        server.run().await
    });

    match result {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
