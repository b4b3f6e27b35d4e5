//! Domain Sentinel — threat-intelligence investigation and validation service.
//!
//! Usage:
//!   domain-sentinel serve                 Start the HTTP service
//!   domain-sentinel investigate <TARGET>  Investigate one domain and print the report
//!   domain-sentinel validate <REPORT>     Validate a report and print the outcome
//!   domain-sentinel tools                 List tools discovered on the MCP server
//!   domain-sentinel init                  Write a default config file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use domain_sentinel::config::{self, SentinelConfig};
use domain_sentinel::service::context::validator_client;
use domain_sentinel::service::{self, ServiceContext};
use domain_sentinel::validation::{self, Validator};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "domain-sentinel")]
#[command(version)]
#[command(about = "Domain threat-intelligence investigation and validation service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.domain-sentinel/sentinel.toml).
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP service.
    Serve {
        /// Listen address (overrides `listen_addr`).
        #[arg(long)]
        listen: Option<String>,
    },

    /// Investigate a single domain and print the report.
    Investigate {
        /// Domain to investigate.
        target: String,
    },

    /// Validate a report and print the outcome as JSON.
    Validate {
        /// Report text.
        #[arg(conflicts_with = "file")]
        report: Option<String>,

        /// Read the report from a file instead.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List the tools discovered on the MCP server.
    Tools,

    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .as_deref()
        .map(config::resolve_path)
        .unwrap_or_else(config::default_config_path);

    let cfg = config::load_with_env(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging
    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { listen } => cmd_serve(cfg, listen).await,
        Commands::Investigate { target } => cmd_investigate(cfg, &target).await,
        Commands::Validate { report, file } => cmd_validate(cfg, report, file).await,
        Commands::Tools => cmd_tools(cfg).await,
        Commands::Init { force } => cmd_init(&config_path, force),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_serve(cfg: SentinelConfig, listen: Option<String>) -> Result<()> {
    let addr = listen.unwrap_or_else(|| cfg.listen_addr.clone());
    let ctx = Arc::new(bootstrap(cfg).await?);

    println!(
        "{} Serving {} tool(s) on {}",
        ">>>".green().bold(),
        ctx.registry.len(),
        addr
    );

    let cancel = CancellationToken::new();
    let server_cancel = cancel.clone();
    let mut server = tokio::spawn(async move { service::serve(ctx, &addr, server_cancel).await });

    tokio::select! {
        // Server stopped on its own (e.g. bind failure)
        res = &mut server => return res?,
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl+C")?;
            println!("\n{} Shutting down gracefully...", "<<<".red().bold());
            cancel.cancel();
        }
    }

    // Wait for in-flight requests (with a timeout to avoid hanging forever)
    let shutdown_timeout = tokio::time::Duration::from_secs(10);
    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(Ok(res)) => res?,
        Ok(Err(e)) => warn!("Server task join error: {}", e),
        Err(_) => warn!("Server did not stop within {:?}", shutdown_timeout),
    }

    info!("Shutdown complete");
    Ok(())
}

async fn cmd_investigate(cfg: SentinelConfig, target: &str) -> Result<()> {
    let ctx = bootstrap(cfg).await?;

    let (result, meta) = ctx
        .investigator
        .investigate(target)
        .await
        .with_context(|| format!("Investigation of '{target}' failed"))?;

    println!(
        "{} {} ({} step(s), run {})",
        "Report for".bold(),
        target.cyan(),
        meta.steps,
        meta.run_id.dimmed()
    );
    println!();
    println!("{}", result.report);
    Ok(())
}

async fn cmd_validate(
    cfg: SentinelConfig,
    report: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let report = match (report, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read report from {}", path.display()))?,
        (None, None) => bail!("Provide a report argument or --file"),
    };

    // Validation needs only the classifier, not the tool registry.
    let validator = Validator::new(Arc::new(validator_client(&cfg)));

    let outcome = validation::validate_report(&validator, &report).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn cmd_tools(cfg: SentinelConfig) -> Result<()> {
    let ctx = bootstrap(cfg).await?;

    println!();
    println!("{}", "=== Discovered Tools ===".bold());
    println!();
    for def in ctx.registry.definitions() {
        println!("  {}:  {}", def.name.bold(), def.description);
    }
    if ctx.registry.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    println!();
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }
    config::save_config(&SentinelConfig::default(), path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run one-time initialization. Failure here means nothing is served.
async fn bootstrap(cfg: SentinelConfig) -> Result<ServiceContext> {
    if cfg.mcp_api_key.is_empty() {
        warn!("No MCP API key configured (set MCP_API_KEY or mcp_api_key)");
    }
    let server = cfg.mcp_server_url.clone();
    ServiceContext::initialize(cfg)
        .await
        .with_context(|| format!("Failed to initialize tool registry from {server}"))
}
