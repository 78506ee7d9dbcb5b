//! Directed diplomatic relationship between a nation and one counterpart.
//!
//! Each nation holds its own [`DiplomacyManager`] per counterpart, so A's
//! view of B evolves independently of B's view of A. Nothing in this module
//! reconciles the two directions.
//!
//! Opinion is the sum of the modifier ledger clamped to `[-100, 100]`. It is
//! computed on demand, so it can never drift from the ledger.

use std::collections::BTreeSet;

use annals_types::{DiplomaticState, TreatyKind};
use serde::{Deserialize, Serialize};

use crate::modifier::ModifierLedger;
use crate::record::ManagerRecord;

/// Opinion bounds.
pub const OPINION_MIN: f64 = -100.0;
/// Opinion bounds.
pub const OPINION_MAX: f64 = 100.0;

const DECLARED_WAR: &str = "Declared war";
const PEACE_TREATY: &str = "Peace treaty";
const ALLIANCE: &str = "Alliance";
const TRADE: &str = "Trade partnership";
const OPEN_BORDERS: &str = "Open borders";
const RESEARCH_AGREEMENT: &str = "Research agreement";

const DECLARED_WAR_VALUE: f64 = -50.0;
const PEACE_TREATY_VALUE: f64 = 20.0;
const ALLIANCE_VALUE: f64 = 30.0;
const TRADE_VALUE: f64 = 10.0;
const AGREEMENT_VALUE: f64 = 5.0;
const GRIEVANCE_VALUE: f64 = -10.0;
const DECAY_RATE: f64 = 0.5;

/// A treaty offer waiting for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatyProposal {
    /// What is offered.
    pub kind: TreatyKind,
    /// Turn the offer was made.
    pub proposed_turn: u32,
}

/// One entry in the relationship history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiplomaticAction {
    /// Turn the action happened.
    pub turn: u32,
    /// What happened.
    pub description: String,
}

/// Outcome of answering a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatyResult {
    /// Whether the answer took effect.
    pub success: bool,
    /// The proposal that was consumed, if the index was valid.
    pub kind: Option<TreatyKind>,
    /// Human-readable summary.
    pub description: String,
}

/// Outcome of one diplomacy turn.
#[derive(Debug, Clone, PartialEq)]
pub struct DiplomacyTurn {
    /// Opinion after decay.
    pub opinion: f64,
    /// Modifiers that decayed away this turn.
    pub expired: Vec<String>,
}

/// One nation's view of one counterpart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyManager {
    state: DiplomaticState,
    modifiers: ModifierLedger,
    at_war_since: Option<u32>,
    peace_treaty_since: Option<u32>,
    alliance_since: Option<u32>,
    trade_since: Option<u32>,
    open_borders_since: Option<u32>,
    research_agreement_since: Option<u32>,
    turns_at_war: u32,
    turns_at_peace: u32,
    pending: Vec<TreatyProposal>,
    grievances: BTreeSet<String>,
    history: Vec<DiplomaticAction>,
}

impl DiplomacyManager {
    /// A neutral relationship with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub const fn state(&self) -> DiplomaticState {
        self.state
    }

    /// Whether the relationship is at war.
    pub fn is_at_war(&self) -> bool {
        self.state == DiplomaticState::War
    }

    /// Opinion: the clamped sum of active modifiers.
    pub fn opinion(&self) -> f64 {
        self.modifiers.total().clamp(OPINION_MIN, OPINION_MAX)
    }

    /// Active opinion modifiers.
    pub const fn modifiers(&self) -> &ModifierLedger {
        &self.modifiers
    }

    /// Turn war began, while at war.
    pub const fn at_war_since(&self) -> Option<u32> {
        self.at_war_since
    }

    /// Turn the current peace treaty was signed.
    pub const fn peace_treaty_since(&self) -> Option<u32> {
        self.peace_treaty_since
    }

    /// Turn the alliance was formed.
    pub const fn alliance_since(&self) -> Option<u32> {
        self.alliance_since
    }

    /// Turn trade began.
    pub const fn trade_since(&self) -> Option<u32> {
        self.trade_since
    }

    /// Turn open borders were agreed.
    pub const fn open_borders_since(&self) -> Option<u32> {
        self.open_borders_since
    }

    /// Turn the research agreement was signed.
    pub const fn research_agreement_since(&self) -> Option<u32> {
        self.research_agreement_since
    }

    /// Turns spent in the current war.
    pub const fn turns_at_war(&self) -> u32 {
        self.turns_at_war
    }

    /// Turns spent in the current peace.
    pub const fn turns_at_peace(&self) -> u32 {
        self.turns_at_peace
    }

    /// Pending proposals, oldest first.
    pub fn pending(&self) -> &[TreatyProposal] {
        &self.pending
    }

    /// Grievances held against the counterpart.
    pub const fn grievances(&self) -> &BTreeSet<String> {
        &self.grievances
    }

    /// Chronological history.
    pub fn history(&self) -> &[DiplomaticAction] {
        &self.history
    }

    /// Set or clear a flat opinion modifier.
    pub fn set_opinion_modifier(&mut self, source: impl Into<String>, value: f64) {
        self.modifiers.set(source, value);
    }

    /// Move to `next`. Same-state transitions are refused, and war can only
    /// end in peace.
    pub fn set_state(&mut self, next: DiplomaticState, turn: u32) -> bool {
        let previous = self.state;
        if previous == next {
            return false;
        }
        if previous == DiplomaticState::War && next != DiplomaticState::Peace {
            return false;
        }

        match next {
            DiplomaticState::War => {
                self.at_war_since = Some(turn);
                self.peace_treaty_since = None;
                self.turns_at_war = 0;
                self.modifiers.set(DECLARED_WAR, DECLARED_WAR_VALUE);
            }
            DiplomaticState::Peace => {
                self.peace_treaty_since = Some(turn);
                self.turns_at_peace = 0;
                if previous == DiplomaticState::War {
                    self.at_war_since = None;
                    self.modifiers
                        .set_decaying(PEACE_TREATY, PEACE_TREATY_VALUE, DECAY_RATE);
                }
            }
            DiplomaticState::Alliance => {
                self.alliance_since = Some(turn);
                self.modifiers.set(ALLIANCE, ALLIANCE_VALUE);
            }
            DiplomaticState::Trade => {
                self.trade_since = Some(turn);
                self.modifiers.set(TRADE, TRADE_VALUE);
            }
            DiplomaticState::Neutral => {}
        }

        self.state = next;
        self.record(turn, format!("{previous:?} -> {next:?}"));
        true
    }

    /// Enter war from any other state.
    pub fn declare_war(&mut self, turn: u32) -> bool {
        self.set_state(DiplomaticState::War, turn)
    }

    /// End a war. Returns false when not at war.
    pub fn make_peace(&mut self, turn: u32) -> bool {
        self.is_at_war() && self.set_state(DiplomaticState::Peace, turn)
    }

    /// Decay modifiers and advance the war and peace counters.
    pub fn process_turn(&mut self) -> DiplomacyTurn {
        let expired = self.modifiers.decay();
        match self.state {
            DiplomaticState::War => self.turns_at_war = self.turns_at_war.saturating_add(1),
            DiplomaticState::Peace => {
                self.turns_at_peace = self.turns_at_peace.saturating_add(1);
            }
            DiplomaticState::Neutral | DiplomaticState::Alliance | DiplomaticState::Trade => {}
        }
        DiplomacyTurn {
            opinion: self.opinion(),
            expired,
        }
    }

    /// Record a grievance. Each distinct grievance carries its own decaying
    /// opinion penalty; repeats are ignored.
    pub fn add_grievance(&mut self, grievance: impl Into<String>, turn: u32) -> bool {
        let grievance = grievance.into();
        if !self.grievances.insert(grievance.clone()) {
            return false;
        }
        self.modifiers.set_decaying(
            format!("Grievance: {grievance}"),
            GRIEVANCE_VALUE,
            DECAY_RATE,
        );
        self.record(turn, format!("Grievance: {grievance}"));
        true
    }

    /// Queue a proposal. Returns its index.
    pub fn propose(&mut self, kind: TreatyKind, turn: u32) -> usize {
        self.pending.push(TreatyProposal {
            kind,
            proposed_turn: turn,
        });
        self.record(turn, format!("Proposed {kind:?}"));
        self.pending.len().saturating_sub(1)
    }

    /// Accept the proposal at `index`, removing it from the queue.
    pub fn accept(&mut self, index: usize, turn: u32) -> TreatyResult {
        if index >= self.pending.len() {
            return TreatyResult {
                success: false,
                kind: None,
                description: format!("No pending proposal at index {index}"),
            };
        }
        let proposal = self.pending.remove(index);
        let kind = proposal.kind;
        let success = match kind {
            TreatyKind::Peace => self.make_peace(turn),
            TreatyKind::Alliance => self.set_state(DiplomaticState::Alliance, turn),
            TreatyKind::Trade => self.set_state(DiplomaticState::Trade, turn),
            TreatyKind::OpenBorders => {
                self.open_borders_since = Some(turn);
                self.modifiers.set(OPEN_BORDERS, AGREEMENT_VALUE);
                true
            }
            TreatyKind::ResearchAgreement => {
                self.research_agreement_since = Some(turn);
                self.modifiers.set(RESEARCH_AGREEMENT, AGREEMENT_VALUE);
                true
            }
        };
        let description = if success {
            format!("Accepted {kind:?}")
        } else {
            format!("Accepted {kind:?} but it could not take effect from {:?}", self.state)
        };
        self.record(turn, description.clone());
        TreatyResult {
            success,
            kind: Some(kind),
            description,
        }
    }

    /// Reject the proposal at `index`, removing it from the queue.
    pub fn reject(&mut self, index: usize, turn: u32) -> TreatyResult {
        if index >= self.pending.len() {
            return TreatyResult {
                success: false,
                kind: None,
                description: format!("No pending proposal at index {index}"),
            };
        }
        let kind = self.pending.remove(index).kind;
        let description = format!("Rejected {kind:?}");
        self.record(turn, description.clone());
        TreatyResult {
            success: true,
            kind: Some(kind),
            description,
        }
    }

    fn record(&mut self, turn: u32, description: String) {
        self.history.push(DiplomaticAction { turn, description });
    }
}

impl ManagerRecord for DiplomacyManager {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn opinion_is_clamped() {
        let mut rel = DiplomacyManager::new();
        rel.set_opinion_modifier("Shared faith", 200.0);
        assert!(close(rel.opinion(), 100.0));
        rel.set_opinion_modifier("Shared faith", -350.0);
        assert!(close(rel.opinion(), -100.0));
    }

    #[test]
    fn declaring_war_adds_one_penalty() {
        let mut rel = DiplomacyManager::new();
        assert!(rel.declare_war(4));
        assert_eq!(rel.at_war_since(), Some(4));
        assert!(!rel.declare_war(5));
        let penalties: Vec<_> =
            rel.modifiers().iter().filter(|m| m.source == "Declared war").collect();
        assert_eq!(penalties.len(), 1);
        assert!(close(rel.opinion(), -50.0));
    }

    #[test]
    fn peace_clears_war_start_and_adds_decaying_bonus() {
        let mut rel = DiplomacyManager::new();
        rel.declare_war(1);
        rel.process_turn();
        rel.process_turn();
        assert_eq!(rel.turns_at_war(), 2);

        assert!(rel.make_peace(3));
        assert_eq!(rel.state(), DiplomaticState::Peace);
        assert!(rel.at_war_since().is_none());
        assert_eq!(rel.peace_treaty_since(), Some(3));
        let bonus = rel.modifiers().get("Peace treaty").unwrap();
        assert!(close(bonus.value, 20.0));
        assert!(close(bonus.decay.unwrap(), 0.5));

        rel.process_turn();
        assert!(close(rel.opinion(), -30.5));
        assert_eq!(rel.turns_at_peace(), 1);
    }

    #[test]
    fn war_only_ends_in_peace() {
        let mut rel = DiplomacyManager::new();
        rel.declare_war(1);
        assert!(!rel.set_state(DiplomaticState::Alliance, 2));
        assert!(!rel.set_state(DiplomaticState::Trade, 2));
        assert!(!rel.set_state(DiplomaticState::Neutral, 2));
        assert!(rel.is_at_war());
        assert!(!DiplomacyManager::new().make_peace(1));
    }

    #[test]
    fn alliance_and_trade_bonuses() {
        let mut rel = DiplomacyManager::new();
        assert!(rel.set_state(DiplomaticState::Alliance, 1));
        assert!(rel.set_state(DiplomaticState::Trade, 2));
        assert!(close(rel.opinion(), 40.0));
        assert_eq!(rel.alliance_since(), Some(1));
        assert_eq!(rel.trade_since(), Some(2));
    }

    #[test]
    fn grievances_dedupe_and_decay() {
        let mut rel = DiplomacyManager::new();
        assert!(rel.add_grievance("Settled near our lands", 1));
        assert!(!rel.add_grievance("Settled near our lands", 2));
        assert!(close(rel.opinion(), -10.0));
        for _ in 0..19 {
            rel.process_turn();
        }
        let last = rel.process_turn();
        assert_eq!(last.expired, vec![String::from("Grievance: Settled near our lands")]);
        assert!(close(rel.opinion(), 0.0));
        assert!(rel.grievances().contains("Settled near our lands"));
    }

    #[test]
    fn proposals_consumed_by_index() {
        let mut rel = DiplomacyManager::new();
        rel.declare_war(1);
        assert_eq!(rel.propose(TreatyKind::OpenBorders, 2), 0);
        assert_eq!(rel.propose(TreatyKind::Peace, 2), 1);
        assert_eq!(rel.propose(TreatyKind::Alliance, 2), 2);

        let peace = rel.accept(1, 3);
        assert!(peace.success);
        assert_eq!(peace.kind, Some(TreatyKind::Peace));
        assert_eq!(rel.state(), DiplomaticState::Peace);

        let rejected = rel.reject(1, 3);
        assert_eq!(rejected.kind, Some(TreatyKind::Alliance));
        let borders = rel.accept(0, 4);
        assert!(borders.success);
        assert_eq!(rel.open_borders_since(), Some(4));
        assert_eq!(rel.state(), DiplomaticState::Peace);
        assert!(rel.pending().is_empty());
        assert!(!rel.accept(0, 5).success);
    }

    #[test]
    fn trade_proposal_enters_trade_state() {
        let mut rel = DiplomacyManager::new();
        let index = rel.propose(TreatyKind::Trade, 1);
        assert!(rel.accept(index, 2).success);
        assert_eq!(rel.state(), DiplomaticState::Trade);
        assert!(close(rel.opinion(), 10.0));
    }

    #[test]
    fn history_is_chronological() {
        let mut rel = DiplomacyManager::new();
        rel.declare_war(1);
        rel.make_peace(5);
        let turns: Vec<u32> = rel.history().iter().map(|a| a.turn).collect();
        assert_eq!(turns, vec![1, 5]);
    }

    #[test]
    fn record_roundtrip() {
        let mut rel = DiplomacyManager::new();
        rel.declare_war(1);
        rel.make_peace(2);
        rel.process_turn();
        rel.add_grievance("Broken promise", 3);
        rel.propose(TreatyKind::ResearchAgreement, 3);
        let restored = DiplomacyManager::from_record(&rel.to_record().unwrap()).unwrap();
        assert_eq!(restored, rel);
        assert!(close(restored.opinion(), rel.opinion()));
    }
}
