/**
 * PANGAN KERNEL - Point d'entrée du serveur
 *
 * RÔLE : Charge la config, les contrats, construit le synthétiseur
 * et sert l'API HTTP consommée par le dashboard.
 */

use anyhow::{Context, Result};
use pangan_kernel::config::{config_path, load_config};
use pangan_kernel::contracts::ContractRegistry;
use pangan_kernel::health::HealthTracker;
use pangan_kernel::http::{self, AppState};
use pangan_kernel::synth::{RngSource, Synthesizer};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    let path = config_path();
    let cfg = match load_config(&path).await {
        Ok(cfg) => {
            init_tracing(cfg.log_level());
            cfg
        }
        Err(e) => {
            // pas de log_level connu : niveau par défaut pour signaler l'erreur
            init_tracing("info");
            error!("[kernel] invalid config {}: {}", path.display(), e);
            return Err(e).with_context(|| format!("failed to load config from {}", path.display()));
        }
    };

    if !path.exists() {
        warn!("[kernel] no {} found, using default config", path.display());
    }

    let contracts = match ContractRegistry::load_contracts_from_dir(cfg.contracts_dir()).await {
        Ok(registry) => {
            info!("[kernel] loaded {} contracts", registry.list_contracts().len());
            registry
        }
        Err(e) => {
            warn!("[kernel] failed to load contracts from {}: {}", cfg.contracts_dir(), e);
            ContractRegistry::new()
        }
    };

    let rng = RngSource::from_seed(cfg.synth.seed);
    if let Some(seed) = cfg.synth.seed {
        info!("[kernel] deterministic readings, seed={seed}");
    }
    let synth = Synthesizer::new(cfg.thresholds, cfg.display_offset()?, rng);

    let app_state = AppState {
        synth,
        health: HealthTracker::new(),
        contracts: Arc::new(contracts),
    };
    let app = http::build_router(app_state);

    let addr = cfg.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("[kernel] listening on http://{addr}");
    axum::serve(listener, app).await.context("HTTP server stopped")?;

    Ok(())
}
