//! Interlink: tool-calling agent CLI.
//!
//! Usage:
//!   interlink ask <PROMPT>        Ask the configured agent once
//!   interlink serve               Expose the built-in tools over MCP
//!   interlink tools <SERVER_KEY>  List a configured MCP server's tools

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::Router;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use interlink::agent::{Agent, AgentConfiguration, Session};
use interlink::config::{self, AppConfig};
use interlink::mcp::{McpClient, McpServer};
use interlink::tools::builtin::builtin_tools;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "interlink")]
#[command(version = "0.1.0")]
#[command(about = "Tool-calling agent core with MCP client and server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ~/.interlink/interlink.toml).
    #[arg(long)]
    config: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the configured agent and print its answer.
    Ask {
        /// The user prompt.
        prompt: String,
    },

    /// Serve the built-in tools over MCP until Ctrl+C.
    Serve {
        /// Listen address, e.g. 127.0.0.1:8080.
        #[arg(long)]
        bind: Option<String>,
    },

    /// List the tools offered by a configured MCP server.
    Tools {
        /// Key under [agent.mcp_servers].
        server_key: String,
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
    let cfg = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| cfg.log_level.clone())
        .unwrap_or_else(|| "info".into());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Ask { prompt } => cmd_ask(cfg, &prompt).await,
        Commands::Serve { bind } => cmd_serve(cfg, bind).await,
        Commands::Tools { server_key } => cmd_tools(&cfg, &server_key).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_ask(cfg: AppConfig, prompt: &str) -> Result<()> {
    let configuration = AgentConfiguration::from_settings(&cfg.agent)?.with_tools(builtin_tools());

    println!(
        "{} Asking agent '{}' (model: {})",
        ">>>".green().bold(),
        configuration.name,
        configuration
            .llm
            .model
            .as_deref()
            .unwrap_or(cfg.llm.default_model.as_str()),
    );

    let mut agent = Agent::new(Session::new(configuration), &cfg.llm)?;
    let answer = agent.call(prompt).await?;

    println!();
    println!("{}", answer);
    Ok(())
}

async fn cmd_serve(cfg: AppConfig, bind: Option<String>) -> Result<()> {
    let mut server = McpServer::new(cfg.server.clone());
    for tool in builtin_tools() {
        server.register_tool(tool)?;
    }
    let tool_count = server.tools_serializations().len();

    let downstream = Router::new().fallback(|| async { (StatusCode::NOT_FOUND, "Not found") });
    let app = Arc::new(server).router(downstream);

    let bind = bind.unwrap_or_else(|| cfg.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    println!(
        "{} Serving {} tools at http://{}{}",
        ">>>".green().bold(),
        tool_count,
        listener.local_addr()?,
        cfg.server.relative_path,
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{} Shutting down gracefully...", "<<<".red().bold());
        }
        signal_cancel.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("MCP server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn cmd_tools(cfg: &AppConfig, server_key: &str) -> Result<()> {
    let settings = cfg
        .agent
        .mcp_servers
        .get(server_key)
        .with_context(|| format!("No MCP server '{}' in [agent.mcp_servers]", server_key))?;

    let client = McpClient::new(&settings.url, settings.allowed_tools.clone());
    let tools = client.list_tools().await?;

    println!();
    println!("{}", format!("=== {} ({}) ===", server_key, settings.url).bold());
    println!();
    if tools.is_empty() {
        println!("  {}", "no tools".dimmed());
    }
    for tool in &tools {
        println!(
            "  {}  {}",
            tool.name.cyan().bold(),
            tool.description.as_deref().unwrap_or_default()
        );
    }
    println!();
    Ok(())
}
