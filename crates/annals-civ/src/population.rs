//! City population: food bank, growth, and starvation.
//!
//! Each turn the city eats `2 * population` food. The surplus (plus flat
//! food modifiers) goes into the food bank, which never drops below zero.
//! When the bank, scaled by growth-percentage modifiers, reaches
//! `15 + 8(p - 1)` the city grows and the bank empties. Three consecutive
//! starving turns cost one population, except that a city never shrinks
//! below one.

use annals_types::GrowthStatus;
use serde::{Deserialize, Serialize};

use crate::formula;
use crate::modifier::ModifierLedger;
use crate::record::ManagerRecord;

/// Consecutive starving turns before a city loses population.
pub const STARVATION_TURNS_TO_SHRINK: u32 = 3;

/// Outcome of one population turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationTurn {
    /// Food surplus this turn (negative when starving).
    pub surplus: i64,
    /// Whether the city gained a population point.
    pub grew: bool,
    /// Whether the city lost a population point to starvation.
    pub starved: bool,
    /// Population after the turn.
    pub population: u32,
    /// Food bank after the turn.
    pub food_stored: u32,
    /// Growth state after the turn.
    pub status: GrowthStatus,
}

/// Food and population bookkeeping for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationManager {
    population: u32,
    food_stored: u32,
    starvation_turns: u32,
    status: GrowthStatus,
    last_surplus: i64,
    /// Flat food per turn.
    food_modifiers: ModifierLedger,
    /// Percentage bonus applied to the food bank when testing for growth.
    growth_modifiers: ModifierLedger,
}

impl Default for PopulationManager {
    fn default() -> Self {
        Self {
            population: 1,
            food_stored: 0,
            starvation_turns: 0,
            status: GrowthStatus::Stagnant,
            last_surplus: 0,
            food_modifiers: ModifierLedger::new(),
            growth_modifiers: ModifierLedger::new(),
        }
    }
}

impl PopulationManager {
    /// A population-1 city with an empty food bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current population.
    pub const fn population(&self) -> u32 {
        self.population
    }

    /// Food in the bank.
    pub const fn food_stored(&self) -> u32 {
        self.food_stored
    }

    /// Food the bank must reach to grow.
    pub const fn food_needed(&self) -> u32 {
        formula::food_needed(self.population)
    }

    /// Consecutive starving turns so far.
    pub const fn starvation_turns(&self) -> u32 {
        self.starvation_turns
    }

    /// Growth state as of the last turn.
    pub const fn status(&self) -> GrowthStatus {
        self.status
    }

    /// Surplus computed on the last turn.
    pub const fn last_surplus(&self) -> i64 {
        self.last_surplus
    }

    /// Set or clear a flat food-per-turn modifier.
    pub fn set_food_modifier(&mut self, source: impl Into<String>, value: f64) {
        self.food_modifiers.set(source, value);
    }

    /// Set or clear a growth-percentage modifier.
    pub fn set_growth_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.growth_modifiers.set(source, percent);
    }

    /// Turns until growth at the last surplus, or `None` when not growing.
    pub fn turns_until_growth(&self) -> Option<u32> {
        let surplus = u32::try_from(self.last_surplus).ok().filter(|s| *s > 0)?;
        let missing = self.food_needed().saturating_sub(self.food_stored);
        formula::div_ceil(missing, surplus)
    }

    /// Run one turn with the city's food yield.
    pub fn process_turn(&mut self, food_yield: u32) -> PopulationTurn {
        let consumption = i64::from(formula::food_consumption(self.population));
        let flat = formula::round_i64(self.food_modifiers.total());
        let surplus = i64::from(food_yield)
            .saturating_sub(consumption)
            .saturating_add(flat);

        let banked = i64::from(self.food_stored).saturating_add(surplus).max(0);
        self.food_stored = u32::try_from(banked).unwrap_or(u32::MAX);
        self.last_surplus = surplus;
        self.status = match surplus {
            s if s > 0 => GrowthStatus::Growing,
            0 => GrowthStatus::Stagnant,
            _ => GrowthStatus::Starving,
        };

        let effective = f64::from(self.food_stored)
            * formula::multiplier(self.growth_modifiers.total());
        let mut grew = false;
        let mut starved = false;

        if formula::floor_u32(effective) >= self.food_needed() {
            self.population = self.population.saturating_add(1);
            self.food_stored = 0;
            self.starvation_turns = 0;
            grew = true;
        } else if surplus < 0 {
            self.starvation_turns = self.starvation_turns.saturating_add(1);
            if self.starvation_turns >= STARVATION_TURNS_TO_SHRINK && self.population > 1 {
                self.population = self.population.saturating_sub(1);
                self.food_stored = 0;
                self.starvation_turns = 0;
                starved = true;
            }
        } else {
            self.starvation_turns = 0;
        }

        PopulationTurn {
            surplus,
            grew,
            starved,
            population: self.population,
            food_stored: self.food_stored,
            status: self.status,
        }
    }
}

impl ManagerRecord for PopulationManager {
    fn normalize(&mut self) {
        self.population = self.population.max(1);
    }
}
