use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod config;
mod logging;

use clad_engine::{ManualTrustVerifier, OrderManager, PartnerRegistry, RewardConfig, RewardEngine};
use clad_ledger::MemoryLedger;
use clad_types::{BoostSchedule, Energy};

#[derive(Parser)]
#[command(name = "clad-node")]
#[command(about = "Clad - watch-to-earn reward ledger node", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the reward node
    Start {
        /// Port for the HTTP API
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Write a default configuration file
    Init {
        /// Output directory for the configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to get logging settings
    let temp_config = if let Some(ref config_path) = cli.config {
        config::NodeConfig::from_file(config_path).ok()
    } else if Path::new("./clad-config.toml").exists() {
        config::NodeConfig::from_file(Path::new("./clad-config.toml")).ok()
    } else {
        None
    };

    let logging_config = temp_config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();

    if let Err(e) = logging::init_logging(&logging_config, cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        let log_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| format!("clad={}", log_level)),
            ))
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    match cli.command {
        Commands::Start { port } => {
            // Priority order: CLI args > ENV vars > config file > defaults
            let mut config = match temp_config {
                Some(c) => c,
                None => {
                    if let Some(ref config_path) = cli.config {
                        config::NodeConfig::from_file(config_path)?
                    } else {
                        config::NodeConfig::default()
                    }
                }
            };
            config.apply_env_overrides();
            if port != 8080 {
                config.node.port = port;
            }

            run_node(config).await
        }
        Commands::Init { output } => {
            let config = config::NodeConfig::default();
            let path = output.join("clad-config.toml");
            std::fs::write(&path, toml::to_string_pretty(&config)?)?;
            println!("Configuration written to {}", path.display());
            Ok(())
        }
    }
}

async fn run_node(config: config::NodeConfig) -> Result<()> {
    info!(
        name = %config.node.name,
        host = %config.node.host,
        port = config.node.port,
        "🚀 Starting node"
    );

    // All wiring happens here: one store, one engine, one order manager,
    // shared through Arc by the API handlers.
    let store = Arc::new(MemoryLedger::new());

    let partners = if config.partners.is_empty() {
        Arc::new(PartnerRegistry::default())
    } else {
        Arc::new(PartnerRegistry::new(config.partners.clone()))
    };

    let boosts = BoostSchedule::default();
    let reward_config = RewardConfig {
        base_reward: Energy::new(config.economy.base_reward),
        cooldown_seconds: config.economy.cooldown_seconds,
        daily_view_limit: config.economy.daily_view_limit,
    };

    let engine = Arc::new(RewardEngine::new(
        store.clone(),
        partners,
        boosts.clone(),
        reward_config,
    ));
    let orders = Arc::new(OrderManager::new(
        store,
        boosts,
        Arc::new(ManualTrustVerifier),
        config.economy.merchant_address.clone(),
    ));
    let auth = Arc::new(auth::AuthResolver::new(
        config.auth.anon_key.clone(),
        Arc::new(auth::DenyAllVerifier),
    ));

    let state = api::AppState {
        engine,
        orders,
        auth,
    };
    let handle = api::start_api_server(state, &config.node.host, config.node.port);

    info!("✅ Node started, serving API");
    handle.await?;
    Ok(())
}
