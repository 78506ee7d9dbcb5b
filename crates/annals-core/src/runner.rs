//! Turn loop runner with operator controls.
//!
//! [`run_simulation`] drives [`SimulationEngine::process_turn`] until the
//! game ends, adding the control plane around it:
//!
//! - **Bounded runs**: the engine stops itself at `max_turns`
//! - **Victory**: the loop ends on the turn a nation wins
//! - **Pause/resume**: the operator can halt and continue the loop
//! - **Variable speed**: the turn interval is adjustable at runtime
//! - **Operator stop**: a clean stop between turns

use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::{SimulationEngine, TurnError, TurnSummary};
use crate::operator::{OperatorState, SimulationEndReason};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A turn failed.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: TurnError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last turn summary, if any turn completed.
    pub final_summary: Option<TurnSummary>,
    /// Number of turns this run executed.
    pub total_turns: u64,
}

/// Callback invoked after each turn completes.
pub trait TurnCallback: Send {
    /// Called after a turn completes successfully.
    fn on_turn(&mut self, summary: &TurnSummary, engine: &SimulationEngine);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _summary: &TurnSummary, _engine: &SimulationEngine) {}
}

/// Run the turn loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a turn fails unrecoverably.
pub async fn run_simulation(
    engine: &mut SimulationEngine,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TurnCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TurnSummary> = None;
    let mut total_turns: u64 = 0;

    info!(
        max_turns = engine.config().engine.max_turns,
        turn_interval_ms = operator.turn_interval_ms(),
        "Simulation starting"
    );

    loop {
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        if operator.is_stop_requested() {
            info!("Operator stop requested");
            engine.stop();
            return Ok(finish(
                operator,
                SimulationEndReason::OperatorStop,
                last_summary,
                total_turns,
            )
            .await);
        }

        let Some(summary) = engine.process_turn()? else {
            warn!(turn = engine.turn(), "Engine refused a turn");
            return Ok(finish(
                operator,
                SimulationEndReason::EngineHalted,
                last_summary,
                total_turns,
            )
            .await);
        };

        total_turns = total_turns.saturating_add(1);
        callback.on_turn(&summary, engine);

        if let Some(victor) = summary.victor {
            info!(turn = summary.turn, victor = %victor, "Victory");
            return Ok(finish(
                operator,
                SimulationEndReason::Victory,
                Some(summary),
                total_turns,
            )
            .await);
        }

        if summary.stopped {
            info!(
                turn = summary.turn,
                max_turns = engine.config().engine.max_turns,
                "Turn limit reached"
            );
            return Ok(finish(
                operator,
                SimulationEndReason::MaxTurnsReached,
                Some(summary),
                total_turns,
            )
            .await);
        }

        last_summary = Some(summary);

        let interval_ms = operator.turn_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

async fn finish(
    operator: &OperatorState,
    reason: SimulationEndReason,
    final_summary: Option<TurnSummary>,
    total_turns: u64,
) -> SimulationResult {
    operator.set_end_reason(reason.clone()).await;
    SimulationResult {
        end_reason: reason,
        final_summary,
        total_turns,
    }
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult, operator: &OperatorState) {
    info!(
        reason = ?result.end_reason,
        total_turns = result.total_turns,
        elapsed_seconds = operator.elapsed_seconds(),
        final_turn = result.final_summary.as_ref().map(|s| s.turn),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            turn = summary.turn,
            year = summary.year,
            nations_alive = summary.nations_alive,
            victor = ?summary.victor,
            "Final turn summary"
        );
    } else {
        warn!("Simulation ended with no turns executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_store::InMemoryStore;
    use annals_types::CultureTraits;
    use annals_world::map_from_template;

    use super::*;
    use crate::ai::BasicAiController;
    use crate::config::SimulationConfig;

    fn engine(max_turns: u32) -> SimulationEngine {
        let mut config = SimulationConfig::default();
        config.engine.max_turns = max_turns;
        config.engine.autosave_interval = 0;
        SimulationEngine::new(
            config,
            Box::new(InMemoryStore::new()),
            Box::new(map_from_template(&["GGGG", "GGGG"]).unwrap()),
            Box::new(BasicAiController::default()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn bounded_by_max_turns() {
        let mut engine = engine(5);
        let operator = Arc::new(OperatorState::new(0));
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut engine, &operator, &mut cb).await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTurnsReached);
        assert_eq!(result.total_turns, 5);
        assert_eq!(result.final_summary.unwrap().turn, 5);
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::MaxTurnsReached)
        );
    }

    #[tokio::test]
    async fn operator_stop() {
        let mut engine = engine(0);
        let operator = Arc::new(OperatorState::new(0));
        operator.request_stop();
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut engine, &operator, &mut cb).await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_turns, 0);
        assert!(engine.is_stopped());
    }

    #[tokio::test]
    async fn stopped_engine_halts_runner() {
        let mut engine = engine(0);
        engine.stop();
        let operator = Arc::new(OperatorState::new(0));
        let mut cb = NoOpCallback;

        let result = run_simulation(&mut engine, &operator, &mut cb).await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::EngineHalted);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn victory_ends_run() {
        let mut engine = engine(0);
        let akkad = engine.new_nation("Akkad", CultureTraits::default());
        let akkad = engine.add_nation(akkad);
        let elam = engine.new_nation("Elam", CultureTraits::default());
        let elam = engine.add_nation(elam);
        engine.eliminate_nation(elam);

        let operator = Arc::new(OperatorState::new(0));
        let mut cb = NoOpCallback;
        let result = run_simulation(&mut engine, &operator, &mut cb).await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::Victory);
        assert_eq!(result.total_turns, 1);
        assert_eq!(result.final_summary.unwrap().victor, Some(akkad));
    }

    #[tokio::test]
    async fn turn_callback_is_called() {
        struct CountCallback {
            count: u64,
            last_year: i32,
        }
        impl TurnCallback for CountCallback {
            fn on_turn(&mut self, summary: &TurnSummary, engine: &SimulationEngine) {
                self.count = self.count.saturating_add(1);
                self.last_year = engine.year();
                assert_eq!(summary.year, engine.year());
            }
        }

        let mut engine = engine(3);
        let operator = Arc::new(OperatorState::new(0));
        let mut cb = CountCallback {
            count: 0,
            last_year: 0,
        };

        let _ = run_simulation(&mut engine, &operator, &mut cb).await.unwrap();

        assert_eq!(cb.count, 3);
        assert_eq!(cb.last_year, -3880);
    }
}
