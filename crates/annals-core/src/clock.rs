//! Turn clock for the Annals simulation.
//!
//! The clock is the single source of truth for simulated time. Each call
//! to [`TurnClock::advance`] moves the turn counter forward by one and the
//! calendar year forward by the configured number of years per turn.
//!
//! All arithmetic is checked; the clock refuses to advance rather than
//! wrap.

use crate::config::WorldConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u32::MAX")]
    TurnOverflow,

    /// Year would overflow.
    #[error("year overflow: cannot advance beyond i32::MAX")]
    YearOverflow,

    /// Invalid time configuration (e.g. zero years per turn).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Simulated calendar: turn number and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnClock {
    /// Current turn (0 before the first turn runs).
    turn: u32,

    /// Current year; negative years are BCE.
    year: i32,

    /// Years that pass each turn.
    years_per_turn: u32,
}

impl TurnClock {
    /// Create a clock at turn 0 from the world configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `years_per_turn` is 0.
    pub fn new(config: &WorldConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config.start_year, config.years_per_turn)
    }

    /// Create a clock from explicit parameters (state restoration, tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `years_per_turn` is 0 or
    /// does not fit a year.
    pub fn from_parts(turn: u32, year: i32, years_per_turn: u32) -> Result<Self, ClockError> {
        if years_per_turn == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "years_per_turn must be at least 1".to_owned(),
            });
        }
        if i32::try_from(years_per_turn).is_err() {
            return Err(ClockError::InvalidConfig {
                reason: "years_per_turn exceeds the year range".to_owned(),
            });
        }
        Ok(Self {
            turn,
            year,
            years_per_turn,
        })
    }

    /// Advance by one turn. Returns the new turn number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TurnOverflow`] or [`ClockError::YearOverflow`]
    /// if either counter would overflow. The clock is unchanged on error.
    pub fn advance(&mut self) -> Result<u32, ClockError> {
        let step = i32::try_from(self.years_per_turn).map_err(|_err| ClockError::YearOverflow)?;
        let turn = self.turn.checked_add(1).ok_or(ClockError::TurnOverflow)?;
        let year = self.year.checked_add(step).ok_or(ClockError::YearOverflow)?;
        self.turn = turn;
        self.year = year;
        Ok(turn)
    }

    /// Current turn number.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current year.
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Years per turn.
    pub const fn years_per_turn(&self) -> u32 {
        self.years_per_turn
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn clock_starts_at_turn_zero() {
        let clock = TurnClock::new(&WorldConfig::default()).unwrap();
        assert_eq!(clock.turn(), 0);
        assert_eq!(clock.year(), WorldConfig::default().start_year);
    }

    #[test]
    fn clock_advances_turn_and_year() {
        let mut clock = TurnClock::from_parts(0, -4000, 40).unwrap();
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.year(), -3960);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.year(), -3920);
    }

    #[test]
    fn zero_years_per_turn_rejected() {
        assert!(TurnClock::from_parts(0, 0, 0).is_err());
    }

    #[test]
    fn overflow_leaves_clock_unchanged() {
        let mut clock = TurnClock::from_parts(u32::MAX, 0, 1).unwrap();
        assert!(matches!(clock.advance(), Err(ClockError::TurnOverflow)));
        assert_eq!(clock.turn(), u32::MAX);
        assert_eq!(clock.year(), 0);

        let mut clock = TurnClock::from_parts(0, i32::MAX, 1).unwrap();
        assert!(matches!(clock.advance(), Err(ClockError::YearOverflow)));
        assert_eq!(clock.turn(), 0);
    }
}
