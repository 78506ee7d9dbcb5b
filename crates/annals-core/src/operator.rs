//! Operator control state for runtime simulation management.
//!
//! Shared between the runner loop and whatever drives it (a signal handler,
//! a console, a test). The operator can pause and resume, change the turn
//! speed, and request a clean stop without tearing the process down.
//!
//! All mutable control fields are atomics so the runner reads them without
//! locks on the hot path.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

/// Shortest accepted turn interval in milliseconds.
pub const MIN_TURN_INTERVAL_MS: u64 = 100;

/// Reason why the simulation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_turns` limit.
    MaxTurnsReached,
    /// One nation won.
    Victory,
    /// An operator issued a stop command.
    OperatorStop,
    /// The engine was already stopped or paused when asked for a turn.
    EngineHalted,
}

/// Shared operator control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the simulation is currently paused.
    paused: AtomicBool,

    /// Notification used to wake the runner when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Current turn interval in milliseconds (runtime-adjustable).
    turn_interval_ms: AtomicU64,

    /// Wall-clock time when the simulation started.
    started_at: DateTime<Utc>,

    /// Reason the simulation ended, if it has.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create operator state with the configured turn interval.
    pub fn new(turn_interval_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            turn_interval_ms: AtomicU64::new(turn_interval_ms),
            started_at: Utc::now(),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether the simulation is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the simulation. The runner sleeps before its next turn.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the simulation and wake the runner.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the simulation is no longer paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. The turn in progress, if any, completes.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        // A paused runner must wake up to notice.
        self.resume_notify.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the reason the simulation ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Get the reason the simulation ended, if it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        self.end_reason.lock().await.clone()
    }

    // -----------------------------------------------------------------------
    // Turn Speed
    // -----------------------------------------------------------------------

    /// Get the current turn interval in milliseconds.
    pub fn turn_interval_ms(&self) -> u64 {
        self.turn_interval_ms.load(Ordering::Acquire)
    }

    /// Set the turn interval in milliseconds.
    ///
    /// Returns the previous interval, or `None` if `ms` is below
    /// [`MIN_TURN_INTERVAL_MS`].
    pub fn set_turn_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TURN_INTERVAL_MS {
            return None;
        }
        Some(self.turn_interval_ms.swap(ms, Ordering::AcqRel))
    }

    // -----------------------------------------------------------------------
    // Wall clock
    // -----------------------------------------------------------------------

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[test]
    fn turn_interval_rejects_too_fast() {
        let operator = OperatorState::new(1000);
        assert_eq!(operator.set_turn_interval_ms(50), None);
        assert_eq!(operator.turn_interval_ms(), 1000);
        assert_eq!(operator.set_turn_interval_ms(500), Some(1000));
        assert_eq!(operator.turn_interval_ms(), 500);
    }

    #[test]
    fn stop_flag_latches() {
        let operator = OperatorState::new(0);
        assert!(!operator.is_stop_requested());
        operator.request_stop();
        assert!(operator.is_stop_requested());
    }

    #[tokio::test]
    async fn resume_wakes_paused_waiter() {
        let operator = Arc::new(OperatorState::new(0));
        operator.pause();
        assert!(operator.is_paused());

        let waiter = {
            let operator = Arc::clone(&operator);
            tokio::spawn(async move { operator.wait_if_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        operator.resume();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(!operator.is_paused());
    }

    #[tokio::test]
    async fn end_reason_round_trips() {
        let operator = OperatorState::new(0);
        assert!(operator.end_reason().await.is_none());
        operator.set_end_reason(SimulationEndReason::Victory).await;
        assert_eq!(
            operator.end_reason().await,
            Some(SimulationEndReason::Victory)
        );
    }
}
