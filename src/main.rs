//! Duel Arena Server
//!
//! Binds the WebSocket transport and runs until Ctrl-C.

use std::time::Duration;
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use duel_arena::{
    VERSION,
    game::{Catalog, DuelRules},
    network::{DuelEngine, GameServer, ServerConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Duel Arena Server v{}", VERSION);

    let config = ServerConfig::from_env().context("server configuration")?;
    let rules = DuelRules::from_env().context("duel rules")?;

    let catalog = match std::env::var("DUEL_CATALOG_PATH") {
        Ok(path) => Catalog::load(&path).with_context(|| format!("loading catalog {}", path))?,
        Err(_) => Catalog::standard(),
    };
    let (weapons, skills, items) = catalog.counts();
    info!("Catalog: {} weapons, {} skills, {} items", weapons, skills, items);
    info!(
        "Rules: seed {}, tick cadence {:?}, disconnect policy {:?}",
        rules.seed, rules.tick_cadence, rules.disconnect_policy,
    );

    let server = GameServer::new(config, DuelEngine::new(catalog, rules));

    tokio::select! {
        result = server.run() => result?,
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutting down");
            server.shutdown();
            // Connection tasks flush their shutdown notice
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    Ok(())
}
