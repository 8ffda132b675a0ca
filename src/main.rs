//! component-docs-mcp: protocol server for a UI component documentation
//! knowledge base
//!
//! Serves tools and resources over HTTP to AI assistants and scripts.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use component_docs_mcp::config::{self, Config, ConfigPatch, LogLevel};
use component_docs_mcp::context::ServerContext;
use component_docs_mcp::docs::{self, Catalog};
use component_docs_mcp::error::CatalogError;
use component_docs_mcp::mcp::transport::{serve, shutdown_signal};
use component_docs_mcp::mcp::ProtocolDispatcher;

/// Protocol server for a UI component documentation knowledge base.
///
/// Exposes documentation lookup tools and resources to AI assistants over
/// HTTP.
#[derive(Parser, Debug)]
#[command(name = "component-docs-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides `bindAddress` from the config file)
    #[arg(short, long, value_name = "HOST:PORT")]
    bind: Option<String>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
const fn get_log_level(verbose: u8, quiet: bool, config_level: LogLevel) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configured catalog, or the bundled one.
fn load_catalog(cfg: &Config) -> Result<Catalog, CatalogError> {
    cfg.catalog_path
        .as_deref()
        .map_or_else(Catalog::builtin, Catalog::load)
}

/// Hint printed when the default config file fails to load.
fn default_location_hint(default_path: &Path) -> String {
    format!("Default config location: {}", default_path.display())
}

/// Entry point for the component-docs-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let config_path = args.config.as_deref();
    let mut cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\n{}", default_location_hint(&default_path));
                }
            }
            return ExitCode::FAILURE;
        }
    };

    if let Some(bind) = args.bind {
        cfg = cfg.merged(ConfigPatch {
            bind_address: Some(bind),
            ..ConfigPatch::default()
        });
        if let Err(e) = cfg.validate() {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    }

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, cfg.log_level);
    init_tracing(log_level);

    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "component-docs-mcp {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting component-docs-mcp server"
    );

    let catalog = match load_catalog(&cfg) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "Failed to load documentation catalog");
            return ExitCode::FAILURE;
        }
    };

    info!(
        components = catalog.len(),
        source = ?cfg.catalog_path,
        "Documentation catalog loaded"
    );

    let context = Arc::new(ServerContext::new(cfg));
    let dispatcher = Arc::new(ProtocolDispatcher::new(context));
    docs::register_documentation(&dispatcher, Arc::new(catalog));

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

    let result = runtime.block_on(serve(dispatcher, shutdown_signal()));

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
