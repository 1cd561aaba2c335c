//! Omega Replay - replays a single fleet battle
//!
//! Replays the fight record at `FIGHT_RECORD_PATH`, or simulates and replays a
//! training fight when no record is given. Ctrl+C stops playback at the next
//! round boundary and still reports the authoritative outcome.

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omega_replay::app::AppState;
use omega_replay::config::Config;
use omega_replay::game::observers::CombatLog;
use omega_replay::wire::decode_fight_record;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!("Starting Omega replay");

    let state = AppState::new(config)?;

    let record = match &state.config.fight_record_path {
        Some(path) => {
            info!(path = %path.display(), "Loading fight record");
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            decode_fight_record(&json)?
        }
        None => {
            let seed = state.config.training_seed.unwrap_or_else(rand::random);
            state.training_fight(seed)?
        }
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });

    let mut combat_log = CombatLog::new(state.catalog.clone());
    let report = state.controller().play(&record, &mut combat_log, &cancel).await?;

    if let Some(consistency) = report.consistency.as_ref().filter(|c| !c.is_consistent()) {
        info!(mismatches = consistency.mismatches.len(), "Replay finished with mismatches");
    }

    println!("{}", report.outcome.label());
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping after the current round");
        }
        _ = terminate => {
            info!("Received terminate signal, stopping after the current round");
        }
    }
}
