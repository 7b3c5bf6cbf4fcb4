//! CLI entry point for reelchat

mod client;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use reelchat_core::config::{Config, ConfigLoader};
use reelchat_core::logging::init_logging;
use reelchat_core::session::HistoryStore;
use reelchat_providers::ChatCompletionsClient;
use reelchat_server::{run_server, AppState, InferenceGateway};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::ApiClient;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "reelchat")]
#[command(about = "Movie recommendation chatbot backed by a hosted LLM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP chat service
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Send one message to a running server
    Chat {
        /// Message to send
        #[arg(short, long)]
        message: String,
        /// Session id for conversation continuity
        #[arg(short, long)]
        session: Option<String>,
        /// Server base URL
        #[arg(long)]
        server: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Same as the hosted deployment: credentials may live in ./.env
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Serve { host, port } => run_serve(&config_loader, host, port).await,
        Commands::Chat {
            message,
            session,
            server,
        } => {
            tracing_subscriber::fmt::init();
            run_chat(&message, session.as_deref(), server).await
        }
        Commands::Config => run_config(&config_loader),
    }
}

async fn run_serve(loader: &ConfigLoader, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = loader.load()?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let _log_guard = init_logging(&config.logging);
    info!(
        model = %config.provider.model,
        api_base = %config.provider.api_base,
        "Starting reelchat"
    );
    if config.provider.api_key().is_none() {
        warn!("No API key configured (set HF_TOKEN); every chat will get the fallback reply");
    }

    let addr = bind_address(&config)?;
    let provider = Arc::new(ChatCompletionsClient::from_config(&config.provider)?);
    let store = Arc::new(HistoryStore::new(&config.session));
    let gateway = InferenceGateway::new(provider, store.clone(), &config);
    let state = AppState::new(gateway, config.chat.fallback_reply.as_str());

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let sweeper = spawn_session_sweeper(store, shutdown_tx.subscribe());
    let mut server = tokio::spawn(run_server(state, addr, shutdown_rx));

    let result = tokio::select! {
        res = &mut server => res.context("server task panicked")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            info!("Received Ctrl-C, shutting down");
            let _ = shutdown_tx.send(());
            server.await.context("server task panicked")?
        }
    };

    let _ = shutdown_tx.send(());
    sweeper.await.context("session sweeper panicked")?;
    result
}

fn bind_address(config: &Config) -> Result<SocketAddr> {
    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("server.host {:?} is not an IP address", config.server.host))?;
    Ok(SocketAddr::new(ip, config.server.port))
}

/// Periodically drop sessions that have been idle past their TTL
fn spawn_session_sweeper(
    store: Arc<HistoryStore>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = store.evict_expired();
                    if removed > 0 {
                        debug!(removed, remaining = store.len(), "Swept expired sessions");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    })
}

async fn run_chat(message: &str, session: Option<&str>, server: Option<String>) -> Result<()> {
    let client = ApiClient::new(server);
    let reply = client.chat(message, session).await?;

    println!("{}", reply.bot_reply);
    println!("{} {}", style("session:").dim(), style(&reply.session_id).cyan());
    Ok(())
}

fn run_config(loader: &ConfigLoader) -> Result<()> {
    let config = loader.load()?;
    let mut value = serde_json::to_value(&config)?;
    value["provider"]["api_key"] = serde_json::Value::String(config.provider.masked_api_key());

    println!(
        "{} {}",
        style("Config directory:").bold(),
        loader.config_dir().display()
    );
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_from_config() {
        let mut config = Config::default();
        assert_eq!(
            bind_address(&config).unwrap(),
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );

        config.server.host = "::1".to_string();
        config.server.port = 9000;
        assert_eq!(bind_address(&config).unwrap().to_string(), "[::1]:9000");

        config.server.host = "localhost".to_string();
        assert!(bind_address(&config).is_err());
    }

    #[test]
    fn test_cli_parses_serve_overrides() {
        let cli = Cli::try_parse_from(["reelchat", "serve", "--port", "9001"]).unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9001));
            }
            _ => panic!("expected serve"),
        }
    }

    #[tokio::test]
    async fn test_sweeper_stops_on_shutdown() {
        let store = Arc::new(HistoryStore::default());
        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_session_sweeper(store, rx);
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
