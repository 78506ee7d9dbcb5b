//! Runner binary for the Annals simulation.
//!
//! Wires the turn engine to its collaborators and runs it until a
//! termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `annals-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Create the starting world map
//! 4. Build the engine, with persistence sync if enabled
//! 5. Spawn the configured nations
//! 6. Create operator state and hook Ctrl-C to a clean stop
//! 7. Run the turn loop
//! 8. Log the result

mod error;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use annals_core::ai::BasicAiController;
use annals_core::config::{LoggingConfig, SimulationConfig};
use annals_core::engine::SimulationEngine;
use annals_core::operator::OperatorState;
use annals_core::runner::{self, NoOpCallback};
use annals_store::{InMemoryStore, JsonFileStore, SyncHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "annals-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_logging(&config.logging);

    info!(
        world_name = %config.world.name,
        seed = config.world.seed,
        nations = config.world.nations.len(),
        max_turns = config.engine.max_turns,
        "annals-engine starting"
    );

    let world = annals_world::create_starting_world().map_err(EngineError::from)?;
    info!(
        starting_positions = world.starting_positions.len(),
        "Starting world created"
    );

    let ai = BasicAiController::new(config.ai.clone());
    let sync = config.engine.sync_enabled.then(|| {
        info!(dir = %config.engine.sync_dir.display(), "Persistence sync enabled");
        SyncHandle::new(Arc::new(JsonFileStore::new(config.engine.sync_dir.clone())))
    });

    let mut engine = SimulationEngine::new(
        config.clone(),
        Box::new(InMemoryStore::new()),
        Box::new(world.map),
        Box::new(ai),
    )
    .map_err(EngineError::from)?;
    if let Some(sync) = sync {
        engine = engine.with_sync(sync);
    }

    let spawned = spawner::spawn_nations(
        &mut engine,
        &config.world.nations,
        &world.starting_positions,
        config.world.seed,
    )?;
    info!(nations = spawned.len(), world_id = %engine.world_id(), "Nations spawned");

    let operator = Arc::new(OperatorState::new(config.engine.turn_interval_ms));
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping after the current turn");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "Could not listen for Ctrl-C"),
            }
        });
    }

    let result = runner::run_simulation(&mut engine, &operator, &mut NoOpCallback)
        .await
        .map_err(EngineError::from)?;

    if let Some(sync) = engine.sync() {
        sync.settle().await;
        let stats = sync.stats();
        info!(
            dispatched = stats.dispatched,
            completed = stats.completed,
            failed = stats.failed,
            "Persistence sync settled"
        );
    }

    runner::log_simulation_end(&result, &operator);
    info!(
        end_reason = ?result.end_reason,
        total_turns = result.total_turns,
        events = engine.events().len(),
        "annals-engine shutdown complete"
    );

    Ok(())
}

/// Load `annals-config.yaml` from the working directory, or defaults.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(SimulationConfig::from_file(config_path)?)
    } else {
        // Logging is not up yet.
        eprintln!("{CONFIG_PATH} not found, using defaults");
        Ok(SimulationConfig::default())
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the config level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
