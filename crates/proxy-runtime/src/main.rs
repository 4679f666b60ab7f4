//! # vsms-proxy
//!
//! Kannel-compatible SMS proxy registering Verified SMS hashes for every
//! outgoing message.
//!
//! ## Commands
//!
//! - `serve` (default): listen for `sendsms` requests
//! - `register-key <AGENT_ID>`: create a new agent key pair, register its
//!   public half with the verification service, then store the pair
//! - `show-key <AGENT_ID>`: print the key the verification service holds
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging and metrics
//! 2. Load configuration (file, then `VP_*` environment)
//! 3. Build agent registry, verification client and dispatch gate
//! 4. Serve until Ctrl+C

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proxy_telemetry::{init_telemetry, TelemetryConfig};
use shared_types::AgentId;
use tokio::net::TcpListener;
use tracing::{error, info};
use vp_03_agent_registry::{AgentStore, KeyRegistrationApi};

use proxy_runtime::container::{self, DEFAULT_CONFIG_FILE};
use proxy_runtime::http::{self, ProxyState};
use proxy_runtime::{ProxyConfig, ProxyContainer};

/// Kannel proxy registering Verified SMS hashes for outgoing messages
#[derive(Parser, Debug)]
#[command(name = "vsms-proxy")]
#[command(version)]
struct Args {
    /// Configuration file (TOML); missing means defaults
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the proxy
    Serve,
    /// Generate and register a new key pair for an agent
    RegisterKey { agent_id: String },
    /// Show the public key the verification service holds for an agent
    ShowKey { agent_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_telemetry(&TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = ProxyConfig::load(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::RegisterKey { agent_id } => register_key(&config, AgentId::new(agent_id)).await,
        Command::ShowKey { agent_id } => show_key(&config, AgentId::new(agent_id)).await,
    }
}

async fn serve(config: ProxyConfig) -> Result<()> {
    info!(
        listen = %config.listen.addr(),
        path = %config.listen.path,
        gateway = %config.gateway.url,
        agents = %config.agents.source,
        send_unverified = config.policy.send_unverified,
        "starting vsms-proxy"
    );

    let container = ProxyContainer::build(config)
        .await
        .context("Failed to initialize proxy services")?;

    let state = ProxyState {
        gate: container.gate.clone(),
        gateway: container.gateway.clone(),
    };
    let router = http::router(&container.config.listen.path, state);

    let addr = container.config.listen.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    http::serve(listener, router, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

async fn register_key(config: &ProxyConfig, agent_id: AgentId) -> Result<()> {
    let registrar = container::key_registrar(config).context("Failed to set up key registration")?;
    let keys = registrar.register_key(&agent_id).await?;
    println!("Registered new key for agent {agent_id}");
    println!("public: {}", keys.public);
    Ok(())
}

async fn show_key(config: &ProxyConfig, agent_id: AgentId) -> Result<()> {
    let client = container::verification_client(config).context("Failed to create verification client")?;
    let remote = client.get_agent_public_key(&agent_id).await?;

    let store = container::open_agent_store(config)?;
    let local = store
        .load(&agent_id)
        .await?
        .and_then(|agent| agent.vsms_keys)
        .map(|keys| keys.public);

    println!("agent:   {agent_id}");
    println!("service: {}", remote.as_deref().unwrap_or("<none>"));
    println!("local:   {}", local.as_deref().unwrap_or("<none>"));
    Ok(())
}
