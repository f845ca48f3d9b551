//! API Explorer marginfi - comptes, banks, pools arena
//! Serveur HTTP lecture seule adossé au RPC Solana

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

mod arena;
mod birdeye;
mod client;
mod config;
mod error;
mod metadata;
mod oracle;
mod points;
mod position;
mod server;
mod state;
mod types;
mod valuation;

use config::AppConfig;
use server::AppState;

#[derive(Parser)]
#[command(name = "explorer-api")]
#[command(about = "🔭 API Explorer marginfi - comptes, banks, arena")]
#[command(version = "1.0.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 🚀 Démarre le serveur HTTP
    Serve {
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// 🧪 Test configuration + RPC
    Check,
    /// ⚙️ Affiche la config
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).format_timestamp_secs().init();

    print_banner();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { port }) => serve(port).await,
        Some(Commands::Check) => check().await,
        Some(Commands::Config) => show_config().await,
        None => serve(None).await,
    }
}

fn print_banner() {
    println!(r#"
╔═══════════════════════════════════════════════════════════════╗
║                                                               ║
║   🔭 MARGINFI EXPLORER API v1.0                              ║
║   ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━  ║
║   Comptes • Banks • Arena • Points                           ║
║   Lecture seule - aucune transaction signée                  ║
║                                                               ║
╚═══════════════════════════════════════════════════════════════╝
"#);
}

async fn serve(port_override: Option<u16>) -> Result<()> {
    log::info!("🚀 Démarrage...");

    let mut config = AppConfig::load()?;
    if let Some(port) = port_override {
        config.port = port;
    }
    config.display_safe();

    let state = Arc::new(AppState::new(config));
    server::serve(state).await
}

async fn check() -> Result<()> {
    log::info!("🧪 Test configuration...");

    let config = AppConfig::load()?;
    log::info!("✅ Config chargée");

    let state = AppState::new(config);
    state.rpc.get_health().await?;
    log::info!("✅ RPC: {}", state.config.get_rpc_url());

    log::info!("═══════════════════════════════════════");
    log::info!("   ✅ TOUS LES TESTS OK!");
    log::info!("═══════════════════════════════════════");

    Ok(())
}

async fn show_config() -> Result<()> {
    let config = AppConfig::load()?;
    config.display_safe();
    Ok(())
}
