//! City territory: the culture bank that buys tiles.
//!
//! A city owns its center tile from founding. Culture accumulates each turn
//! and, once it covers the cost of the next tile, buys one tile from the
//! candidates the caller offers. Gold purchases and culture bombs acquire
//! tiles immediately without touching the culture bank.

use std::collections::BTreeSet;

use annals_types::{TileCoord, Yields};
use serde::{Deserialize, Serialize};

use crate::formula;
use crate::modifier::ModifierLedger;
use crate::record::ManagerRecord;

/// Gold charged per point of the current culture cost for a tile.
pub const TILE_GOLD_PER_CULTURE: u32 = 2;

/// A tile the city could acquire, as described by the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCandidate {
    /// Tile coordinate.
    pub coord: TileCoord,
    /// Tile yields.
    pub yields: Yields,
    /// Whether the tile has a luxury resource.
    pub has_luxury: bool,
    /// Whether the tile has a strategic resource.
    pub has_strategic: bool,
    /// Distance from the city center.
    pub distance: u32,
}

impl TileCandidate {
    /// Desirability used by [`TileSelection::Scored`].
    pub fn score(&self) -> i64 {
        let y = &self.yields;
        let mut score = 0_i64;
        if self.has_luxury {
            score = score.saturating_add(100);
        }
        if self.has_strategic {
            score = score.saturating_add(75);
        }
        score
            .saturating_add(i64::from(y.food).saturating_mul(3))
            .saturating_add(i64::from(y.production).saturating_mul(3))
            .saturating_add(i64::from(y.gold).saturating_mul(2))
            .saturating_add(i64::from(y.science).saturating_mul(2))
            .saturating_add(i64::from(y.culture))
            .saturating_sub(i64::from(self.distance).saturating_mul(5))
    }
}

/// How a culture-funded tile is chosen among candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileSelection {
    /// Take the first unowned candidate.
    #[default]
    FirstAvailable,
    /// Take the highest-scoring unowned candidate; earlier wins ties.
    Scored,
}

/// Outcome of one expansion turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionTurn {
    /// Tile acquired this turn.
    pub acquired: Option<TileCoord>,
    /// Culture in the bank after the turn.
    pub culture_stored: u32,
    /// Cost of the next tile.
    pub next_cost: u32,
}

/// Outcome of a gold tile purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilePurchase {
    /// Whether the tile was acquired.
    pub expanded: bool,
    /// Gold charged (zero on failure).
    pub gold_spent: u32,
    /// Human-readable summary.
    pub description: String,
}

/// Territory state for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionManager {
    center: TileCoord,
    owned_tiles: BTreeSet<TileCoord>,
    culture_stored: u32,
    tiles_acquired: u32,
    /// Tile cost percentage modifiers.
    cost_modifiers: ModifierLedger,
    selection: TileSelection,
}

impl Default for ExpansionManager {
    fn default() -> Self {
        Self::new(TileCoord::default())
    }
}

impl ExpansionManager {
    /// A manager owning only `center`.
    pub fn new(center: TileCoord) -> Self {
        Self {
            center,
            owned_tiles: BTreeSet::from([center]),
            culture_stored: 0,
            tiles_acquired: 0,
            cost_modifiers: ModifierLedger::new(),
            selection: TileSelection::default(),
        }
    }

    /// Use `selection` for culture-funded tiles.
    #[must_use]
    pub const fn with_selection(mut self, selection: TileSelection) -> Self {
        self.selection = selection;
        self
    }

    /// City center tile.
    pub const fn center(&self) -> TileCoord {
        self.center
    }

    /// Owned tiles, center included.
    pub const fn owned_tiles(&self) -> &BTreeSet<TileCoord> {
        &self.owned_tiles
    }

    /// Whether the city owns `coord`.
    pub fn owns(&self, coord: TileCoord) -> bool {
        self.owned_tiles.contains(&coord)
    }

    /// Culture in the bank.
    pub const fn culture_stored(&self) -> u32 {
        self.culture_stored
    }

    /// Tiles acquired beyond the center.
    pub const fn tiles_acquired(&self) -> u32 {
        self.tiles_acquired
    }

    /// Set or clear a tile-cost percentage modifier.
    pub fn set_cost_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.cost_modifiers.set(source, percent);
    }

    /// Culture needed for the next tile.
    pub fn next_tile_cost(&self) -> u32 {
        formula::tile_culture_cost(self.tiles_acquired, self.cost_modifiers.total())
    }

    /// Gold needed to buy a tile now.
    pub fn tile_gold_price(&self) -> u32 {
        self.next_tile_cost().saturating_mul(TILE_GOLD_PER_CULTURE)
    }

    /// Bank `culture` and buy a tile from `candidates` if affordable.
    pub fn process_turn(&mut self, culture: u32, candidates: &[TileCandidate]) -> ExpansionTurn {
        self.culture_stored = self.culture_stored.saturating_add(culture);
        let mut acquired = None;

        if self.culture_stored >= self.next_tile_cost()
            && let Some(coord) = self.select(candidates)
        {
            self.acquire(coord);
            self.culture_stored = 0;
            acquired = Some(coord);
        }

        ExpansionTurn {
            acquired,
            culture_stored: self.culture_stored,
            next_cost: self.next_tile_cost(),
        }
    }

    /// Buy `coord` with gold. `pay` receives the price and returns whether
    /// payment succeeded; nothing changes when it fails.
    pub fn purchase_tile<F>(&mut self, coord: TileCoord, pay: F) -> TilePurchase
    where
        F: FnOnce(u32) -> bool,
    {
        if self.owns(coord) {
            return TilePurchase {
                expanded: false,
                gold_spent: 0,
                description: format!("Tile {coord} is already owned"),
            };
        }
        let price = self.tile_gold_price();
        if !pay(price) {
            return TilePurchase {
                expanded: false,
                gold_spent: 0,
                description: format!("Cannot afford {price} gold for tile {coord}"),
            };
        }
        self.acquire(coord);
        TilePurchase {
            expanded: true,
            gold_spent: price,
            description: format!("Purchased tile {coord} for {price} gold"),
        }
    }

    /// Acquire every unowned candidate at once. Returns the tiles gained.
    pub fn culture_bomb(&mut self, candidates: &[TileCandidate]) -> Vec<TileCoord> {
        candidates
            .iter()
            .filter_map(|candidate| self.acquire(candidate.coord).then_some(candidate.coord))
            .collect()
    }

    fn select(&self, candidates: &[TileCandidate]) -> Option<TileCoord> {
        let mut unowned = candidates.iter().filter(|c| !self.owns(c.coord));
        match self.selection {
            TileSelection::FirstAvailable => unowned.next().map(|c| c.coord),
            TileSelection::Scored => unowned
                .fold(None::<&TileCandidate>, |best, c| match best {
                    Some(b) if b.score() >= c.score() => Some(b),
                    _ => Some(c),
                })
                .map(|c| c.coord),
        }
    }

    fn acquire(&mut self, coord: TileCoord) -> bool {
        if !self.owned_tiles.insert(coord) {
            return false;
        }
        self.tiles_acquired = self.tiles_acquired.saturating_add(1);
        true
    }
}

impl ManagerRecord for ExpansionManager {
    fn normalize(&mut self) {
        self.owned_tiles.insert(self.center);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn candidate(x: i32, y: i32) -> TileCandidate {
        TileCandidate {
            coord: TileCoord::new(x, y),
            yields: Yields::default(),
            has_luxury: false,
            has_strategic: false,
            distance: 1,
        }
    }

    #[test]
    fn owns_center_from_construction() {
        let exp = ExpansionManager::new(TileCoord::new(3, 3));
        assert!(exp.owns(TileCoord::new(3, 3)));
        assert_eq!(exp.tiles_acquired(), 0);
        assert_eq!(exp.next_tile_cost(), 10);
    }

    #[test]
    fn culture_buys_first_available_tile() {
        let mut exp = ExpansionManager::new(TileCoord::new(3, 3));
        let offers = [candidate(3, 3), candidate(4, 3), candidate(2, 3)];
        assert!(exp.process_turn(6, &offers).acquired.is_none());
        let turn = exp.process_turn(6, &offers);
        assert_eq!(turn.acquired, Some(TileCoord::new(4, 3)));
        assert_eq!(turn.culture_stored, 0);
        assert_eq!(turn.next_cost, 15);
    }

    #[test]
    fn culture_stays_banked_without_candidates() {
        let mut exp = ExpansionManager::new(TileCoord::new(0, 0));
        let turn = exp.process_turn(25, &[candidate(0, 0)]);
        assert!(turn.acquired.is_none());
        assert_eq!(exp.culture_stored(), 25);
        assert_eq!(exp.tiles_acquired(), 0);
    }

    #[test]
    fn scored_selection_prefers_luxury() {
        let mut exp =
            ExpansionManager::new(TileCoord::new(0, 0)).with_selection(TileSelection::Scored);
        let mut silk = candidate(2, 0);
        silk.has_luxury = true;
        silk.distance = 2;
        let mut rich = candidate(1, 0);
        rich.yields.food = 3;
        let offers = [rich, silk];
        assert_eq!(silk.score(), 90);
        assert_eq!(rich.score(), 4);
        assert_eq!(exp.process_turn(10, &offers).acquired, Some(TileCoord::new(2, 0)));
    }

    #[test]
    fn purchase_is_atomic_and_deduplicated() {
        let mut exp = ExpansionManager::new(TileCoord::new(0, 0));
        assert_eq!(exp.tile_gold_price(), 20);
        assert!(!exp.purchase_tile(TileCoord::new(1, 0), |_| false).expanded);
        assert_eq!(exp.tiles_acquired(), 0);

        let bought = exp.purchase_tile(TileCoord::new(1, 0), |price| price == 20);
        assert!(bought.expanded);
        assert_eq!(bought.gold_spent, 20);
        assert_eq!(exp.tiles_acquired(), 1);

        let again = exp.purchase_tile(TileCoord::new(1, 0), |_| true);
        assert!(!again.expanded);
        assert_eq!(exp.tiles_acquired(), 1);
    }

    #[test]
    fn culture_bomb_takes_all_unowned() {
        let mut exp = ExpansionManager::new(TileCoord::new(0, 0));
        exp.process_turn(4, &[]);
        let gained = exp.culture_bomb(&[
            candidate(0, 0),
            candidate(1, 0),
            candidate(0, 1),
            candidate(1, 0),
        ]);
        assert_eq!(gained, vec![TileCoord::new(1, 0), TileCoord::new(0, 1)]);
        assert_eq!(exp.tiles_acquired(), 2);
        assert_eq!(exp.culture_stored(), 4);
    }

    #[test]
    fn record_restores_center_ownership() {
        let mut exp = ExpansionManager::new(TileCoord::new(5, 5));
        exp.set_cost_modifier("Liberty", -25.0);
        exp.process_turn(30, &[candidate(5, 6)]);
        let restored = ExpansionManager::from_record(&exp.to_record().unwrap()).unwrap();
        assert_eq!(restored, exp);

        let partial = serde_json::json!({ "center": { "x": 2, "y": 7 }, "owned_tiles": [] });
        let loaded = ExpansionManager::from_record(&partial).unwrap();
        assert!(loaded.owns(TileCoord::new(2, 7)));
    }
}
