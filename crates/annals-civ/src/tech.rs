//! Technology research: one active slot, an append-only researched set,
//! and the nation's era.

use std::collections::BTreeSet;

use annals_types::Era;
use serde::{Deserialize, Serialize};

use crate::formula;
use crate::modifier::ModifierLedger;
use crate::record::ManagerRecord;

/// Outcome of one research turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechTurn {
    /// Science applied after modifiers.
    pub science: u32,
    /// Technology completed this turn.
    pub completed: Option<String>,
    /// Progress beyond the cost on completion. Reported, not carried.
    pub overflow: u32,
}

/// Research state for one nation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechManager {
    researched: BTreeSet<String>,
    current_research: Option<String>,
    /// Unmodified cost of the current research.
    base_cost: u32,
    progress: u32,
    science_modifiers: ModifierLedger,
    cost_modifiers: ModifierLedger,
    era: Era,
    free_techs: u32,
}

impl TechManager {
    /// Nothing researched, Ancient era.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `tech` is researched.
    pub fn has_researched(&self, tech: &str) -> bool {
        self.researched.contains(tech)
    }

    /// Researched technologies in id order.
    pub const fn researched(&self) -> &BTreeSet<String> {
        &self.researched
    }

    /// Technology being researched.
    pub fn current_research(&self) -> Option<&str> {
        self.current_research.as_deref()
    }

    /// Progress toward the current research.
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Current era.
    pub const fn era(&self) -> Era {
        self.era
    }

    /// Unspent free-tech tokens.
    pub const fn free_techs(&self) -> u32 {
        self.free_techs
    }

    /// Set or clear a science-percentage modifier.
    pub fn set_science_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.science_modifiers.set(source, percent);
    }

    /// Set or clear a research-cost percentage modifier.
    pub fn set_cost_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.cost_modifiers.set(source, percent);
    }

    /// Cost of the current research after modifiers.
    pub fn research_cost(&self) -> Option<u32> {
        self.current_research
            .as_ref()
            .map(|_| formula::scaled_ceil(self.base_cost, self.cost_modifiers.total()))
    }

    /// Start researching `tech`. Switching to a different tech drops the
    /// progress; returns false when `tech` is already researched.
    pub fn set_research(&mut self, tech: impl Into<String>, base_cost: u32) -> bool {
        let tech = tech.into();
        if self.researched.contains(&tech) {
            return false;
        }
        if self.current_research.as_deref() != Some(tech.as_str()) {
            self.progress = 0;
        }
        self.current_research = Some(tech);
        self.base_cost = base_cost;
        true
    }

    /// Apply one turn of science.
    pub fn process_turn(&mut self, science: u32) -> TechTurn {
        let applied = formula::scaled_floor(science, self.science_modifiers.total());
        let Some(cost) = self.research_cost() else {
            return TechTurn {
                science: applied,
                completed: None,
                overflow: 0,
            };
        };

        self.progress = self.progress.saturating_add(applied);
        if self.progress < cost {
            return TechTurn {
                science: applied,
                completed: None,
                overflow: 0,
            };
        }

        let overflow = self.progress.saturating_sub(cost);
        let completed = self.current_research.take();
        if let Some(tech) = &completed {
            self.researched.insert(tech.clone());
        }
        self.progress = 0;
        self.base_cost = 0;
        TechTurn {
            science: applied,
            completed,
            overflow,
        }
    }

    /// Add a free-tech token.
    pub const fn grant_free_tech(&mut self) {
        self.free_techs = self.free_techs.saturating_add(1);
    }

    /// Spend a free-tech token on `tech`. Returns false without a token or
    /// when `tech` is already researched.
    pub fn use_free_tech(&mut self, tech: &str) -> bool {
        if self.free_techs == 0 || self.researched.contains(tech) {
            return false;
        }
        self.free_techs = self.free_techs.saturating_sub(1);
        self.researched.insert(tech.to_owned());
        if self.current_research.as_deref() == Some(tech) {
            self.current_research = None;
            self.progress = 0;
            self.base_cost = 0;
        }
        true
    }

    /// Move to `era` if it is later than the current one.
    pub fn advance_era(&mut self, era: Era) -> bool {
        if era <= self.era {
            return false;
        }
        self.era = era;
        true
    }
}

impl ManagerRecord for TechManager {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn completes_and_reports_discarded_overflow() {
        let mut tech = TechManager::new();
        assert!(tech.set_research("pottery", 20));
        assert!(tech.process_turn(15).completed.is_none());
        let turn = tech.process_turn(15);
        assert_eq!(turn.completed.as_deref(), Some("pottery"));
        assert_eq!(turn.overflow, 10);
        assert!(tech.has_researched("pottery"));
        assert!(tech.current_research().is_none());
        assert_eq!(tech.progress(), 0);

        tech.set_research("writing", 40);
        tech.process_turn(5);
        assert_eq!(tech.progress(), 5);
    }

    #[test]
    fn modifiers_scale_science_and_cost() {
        let mut tech = TechManager::new();
        tech.set_science_modifier("Library", 50.0);
        tech.set_cost_modifier("Great Library", -10.0);
        tech.set_research("writing", 55);
        assert_eq!(tech.research_cost(), Some(50));
        assert_eq!(tech.process_turn(7).science, 10);
    }

    #[test]
    fn researched_tech_cannot_be_restarted() {
        let mut tech = TechManager::new();
        tech.set_research("mining", 5);
        tech.process_turn(5);
        assert!(!tech.set_research("mining", 5));
        assert!(tech.current_research().is_none());
    }

    #[test]
    fn free_tech_clears_matching_research() {
        let mut tech = TechManager::new();
        tech.set_research("bronze_working", 50);
        tech.process_turn(20);
        assert!(!tech.use_free_tech("bronze_working"));

        tech.grant_free_tech();
        assert!(tech.use_free_tech("bronze_working"));
        assert!(tech.has_researched("bronze_working"));
        assert!(tech.current_research().is_none());
        assert_eq!(tech.progress(), 0);
        assert_eq!(tech.free_techs(), 0);
    }

    #[test]
    fn free_tech_leaves_other_research() {
        let mut tech = TechManager::new();
        tech.set_research("writing", 50);
        tech.process_turn(20);
        tech.grant_free_tech();
        assert!(tech.use_free_tech("pottery"));
        assert_eq!(tech.current_research(), Some("writing"));
        assert_eq!(tech.progress(), 20);
    }

    #[test]
    fn era_only_moves_forward() {
        let mut tech = TechManager::new();
        assert!(tech.advance_era(Era::Classical));
        assert!(!tech.advance_era(Era::Ancient));
        assert!(!tech.advance_era(Era::Classical));
        assert_eq!(tech.era(), Era::Classical);
    }

    #[test]
    fn record_roundtrip() {
        let mut tech = TechManager::new();
        tech.set_research("pottery", 20);
        tech.process_turn(25);
        tech.set_research("writing", 40);
        tech.process_turn(12);
        tech.grant_free_tech();
        tech.advance_era(Era::Classical);
        let restored = TechManager::from_record(&tech.to_record().unwrap()).unwrap();
        assert_eq!(restored, tech);
        assert_eq!(restored.research_cost(), Some(40));
    }
}
