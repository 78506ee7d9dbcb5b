//! City production queue with overflow carry-over.

use std::collections::{BTreeSet, VecDeque};

use annals_types::ProductionKind;
use serde::{Deserialize, Serialize};

use crate::formula;
use crate::modifier::ModifierLedger;
use crate::record::ManagerRecord;

/// Gold charged per point of remaining production when rushing.
pub const RUSH_GOLD_PER_PRODUCTION: u32 = 2;

/// One entry in a production queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionItem {
    /// What kind of item this is.
    pub kind: ProductionKind,
    /// Catalog id (`granary`, `settler`, ...).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Production cost.
    pub cost: u32,
}

impl ProductionItem {
    /// Create a queue entry.
    pub fn new(
        kind: ProductionKind,
        id: impl Into<String>,
        name: impl Into<String>,
        cost: u32,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
            cost,
        }
    }

    const fn is_unique(&self) -> bool {
        matches!(self.kind, ProductionKind::Building | ProductionKind::Wonder)
    }
}

/// Outcome of one production turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionTurn {
    /// Production applied this turn, after modifiers, before overflow.
    pub effective: u32,
    /// The item that finished this turn.
    pub completed: Option<ProductionItem>,
    /// Overflow banked for the next item.
    pub overflow: u32,
}

/// Why an item was refused by [`ProductionManager::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueRefusal {
    /// The building or wonder already stands in this city.
    AlreadyBuilt,
    /// The building or wonder is already in the queue.
    AlreadyQueued,
}

/// Outcome of a rush purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RushResult {
    /// Whether the head item was completed.
    pub success: bool,
    /// Gold charged (zero on failure).
    pub gold_spent: u32,
    /// The item completed by the purchase.
    pub completed: Option<ProductionItem>,
    /// Human-readable summary.
    pub description: String,
}

impl RushResult {
    fn failed(description: impl Into<String>) -> Self {
        Self {
            success: false,
            gold_spent: 0,
            completed: None,
            description: description.into(),
        }
    }
}

/// FIFO production state for one city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionManager {
    queue: VecDeque<ProductionItem>,
    progress: u32,
    overflow: u32,
    turns_remaining: Option<u32>,
    /// Production percentage modifiers.
    production_modifiers: ModifierLedger,
    built_buildings: BTreeSet<String>,
    built_wonders: BTreeSet<String>,
}

impl ProductionManager {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// The item being built, if any.
    pub fn current_production(&self) -> Option<&ProductionItem> {
        self.queue.front()
    }

    /// The whole queue, head first.
    pub fn queue(&self) -> impl Iterator<Item = &ProductionItem> {
        self.queue.iter()
    }

    /// Number of queued items.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Progress on the head item.
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    /// Overflow waiting for the next turn.
    pub const fn overflow(&self) -> u32 {
        self.overflow
    }

    /// Turns left on the head item at the last effective rate.
    pub const fn turns_remaining(&self) -> Option<u32> {
        self.turns_remaining
    }

    /// Whether `id` has been built as a building.
    pub fn has_building(&self, id: &str) -> bool {
        self.built_buildings.contains(id)
    }

    /// Whether `id` has been built as a wonder.
    pub fn has_wonder(&self, id: &str) -> bool {
        self.built_wonders.contains(id)
    }

    /// Built buildings in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &str> {
        self.built_buildings.iter().map(String::as_str)
    }

    /// Built wonders in id order.
    pub fn wonders(&self) -> impl Iterator<Item = &str> {
        self.built_wonders.iter().map(String::as_str)
    }

    /// Set or clear a production-percentage modifier.
    pub fn set_production_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.production_modifiers.set(source, percent);
    }

    /// Production after modifiers for a given base.
    pub fn effective_production(&self, base: u32) -> u32 {
        formula::scaled_floor(base, self.production_modifiers.total())
    }

    /// Append an item to the queue. Buildings and wonders are refused when
    /// already built or already queued.
    ///
    /// # Errors
    ///
    /// Returns the refusal reason; the queue is unchanged.
    pub fn enqueue(&mut self, item: ProductionItem) -> Result<(), EnqueueRefusal> {
        if item.is_unique() {
            if self.has_building(&item.id) || self.has_wonder(&item.id) {
                return Err(EnqueueRefusal::AlreadyBuilt);
            }
            if self.queue.iter().any(|queued| queued.id == item.id) {
                return Err(EnqueueRefusal::AlreadyQueued);
            }
        }
        self.queue.push_back(item);
        Ok(())
    }

    /// Remove the item at `index`. Removing the head discards its progress.
    pub fn remove(&mut self, index: usize) -> Option<ProductionItem> {
        let removed = self.queue.remove(index)?;
        if index == 0 {
            self.progress = 0;
            self.turns_remaining = None;
        }
        Some(removed)
    }

    /// Drop every queued item and the head's progress. Overflow is kept.
    pub fn clear_queue(&mut self) {
        self.queue.clear();
        self.progress = 0;
        self.turns_remaining = None;
    }

    /// Production still needed for the head item.
    pub fn remaining(&self) -> Option<u32> {
        self.current_production()
            .map(|item| item.cost.saturating_sub(self.progress))
    }

    /// Gold needed to rush the head item.
    pub fn rush_cost(&self) -> Option<u32> {
        self.remaining()
            .map(|remaining| remaining.saturating_mul(RUSH_GOLD_PER_PRODUCTION))
    }

    /// Apply one turn of production to the head item.
    pub fn process_turn(&mut self, base_production: u32) -> ProductionTurn {
        let effective = self.effective_production(base_production);
        let Some(cost) = self.current_production().map(|item| item.cost) else {
            self.turns_remaining = None;
            return ProductionTurn {
                effective,
                completed: None,
                overflow: self.overflow,
            };
        };

        let carried = std::mem::take(&mut self.overflow);
        self.progress = self
            .progress
            .saturating_add(effective)
            .saturating_add(carried);

        if self.progress >= cost {
            let excess = self.progress.saturating_sub(cost);
            self.overflow = excess / 2;
            let completed = self.complete_head();
            return ProductionTurn {
                effective,
                completed,
                overflow: self.overflow,
            };
        }

        let remaining = cost.saturating_sub(self.progress);
        self.turns_remaining = formula::div_ceil(remaining, effective);
        ProductionTurn {
            effective,
            completed: None,
            overflow: self.overflow,
        }
    }

    /// Complete the head item by paying gold. `pay` receives the price and
    /// returns whether payment succeeded; nothing changes when it fails.
    pub fn rush<F>(&mut self, pay: F) -> RushResult
    where
        F: FnOnce(u32) -> bool,
    {
        let Some(price) = self.rush_cost() else {
            return RushResult::failed("Nothing in production");
        };
        if !pay(price) {
            return RushResult::failed(format!("Cannot afford {price} gold"));
        }
        let completed = self.complete_head();
        let name = completed
            .as_ref()
            .map_or_else(String::new, |item| item.name.clone());
        RushResult {
            success: true,
            gold_spent: price,
            completed,
            description: format!("Rushed {name} for {price} gold"),
        }
    }

    fn complete_head(&mut self) -> Option<ProductionItem> {
        let item = self.queue.pop_front()?;
        match item.kind {
            ProductionKind::Building => {
                self.built_buildings.insert(item.id.clone());
            }
            ProductionKind::Wonder => {
                self.built_wonders.insert(item.id.clone());
            }
            ProductionKind::Unit | ProductionKind::Project => {}
        }
        self.progress = 0;
        self.turns_remaining = None;
        Some(item)
    }
}

impl ManagerRecord for ProductionManager {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn building(id: &str, cost: u32) -> ProductionItem {
        ProductionItem::new(ProductionKind::Building, id, id, cost)
    }

    #[test]
    fn overflow_is_half_the_excess_and_applied_once() {
        let mut prod = ProductionManager::new();
        prod.enqueue(building("monument", 50)).unwrap();
        prod.enqueue(building("granary", 100)).unwrap();

        assert!(prod.process_turn(30).completed.is_none());
        let turn = prod.process_turn(30);
        assert_eq!(turn.completed.unwrap().id, "monument");
        assert_eq!(turn.overflow, 5);
        assert_eq!(prod.current_production().unwrap().id, "granary");

        prod.process_turn(10);
        assert_eq!(prod.progress(), 15);
        assert_eq!(prod.overflow(), 0);
        prod.process_turn(10);
        assert_eq!(prod.progress(), 25);
        assert_eq!(prod.turns_remaining(), Some(8));
    }

    #[test]
    fn production_modifier_floors() {
        let mut prod = ProductionManager::new();
        prod.set_production_modifier("Forge", 25.0);
        prod.enqueue(building("walls", 60)).unwrap();
        let turn = prod.process_turn(7);
        assert_eq!(turn.effective, 8);
        assert_eq!(prod.progress(), 8);
    }

    #[test]
    fn buildings_and_wonders_are_tracked_separately() {
        let mut prod = ProductionManager::new();
        prod.enqueue(building("library", 5)).unwrap();
        prod.enqueue(ProductionItem::new(ProductionKind::Wonder, "pyramids", "Pyramids", 5))
            .unwrap();
        prod.process_turn(5);
        prod.process_turn(5);
        assert!(prod.has_building("library"));
        assert!(prod.has_wonder("pyramids"));
        assert!(!prod.has_building("pyramids"));

        assert_eq!(prod.enqueue(building("library", 5)), Err(EnqueueRefusal::AlreadyBuilt));
    }

    #[test]
    fn duplicate_building_refused_but_units_repeat() {
        let mut prod = ProductionManager::new();
        prod.enqueue(building("library", 75)).unwrap();
        assert_eq!(prod.enqueue(building("library", 75)), Err(EnqueueRefusal::AlreadyQueued));
        let settler = ProductionItem::new(ProductionKind::Unit, "settler", "Settler", 60);
        prod.enqueue(settler.clone()).unwrap();
        prod.enqueue(settler).unwrap();
        assert_eq!(prod.queue_len(), 3);
    }

    #[test]
    fn rush_is_atomic() {
        let mut prod = ProductionManager::new();
        prod.enqueue(building("granary", 40)).unwrap();
        prod.process_turn(10);
        assert_eq!(prod.rush_cost(), Some(60));

        let refused = prod.rush(|_| false);
        assert!(!refused.success);
        assert_eq!(prod.progress(), 10);
        assert_eq!(prod.queue_len(), 1);

        let mut charged = 0;
        let rushed = prod.rush(|price| {
            charged = price;
            true
        });
        assert!(rushed.success);
        assert_eq!(charged, 60);
        assert!(prod.has_building("granary"));
        assert!(prod.current_production().is_none());
        assert_eq!(prod.progress(), 0);
    }

    #[test]
    fn rush_on_empty_queue_fails() {
        let mut prod = ProductionManager::new();
        let result = prod.rush(|_| true);
        assert!(!result.success);
        assert_eq!(result.gold_spent, 0);
    }

    #[test]
    fn removing_head_resets_progress() {
        let mut prod = ProductionManager::new();
        prod.enqueue(building("a", 50)).unwrap();
        prod.enqueue(building("b", 50)).unwrap();
        prod.process_turn(10);
        assert_eq!(prod.remove(1).unwrap().id, "b");
        assert_eq!(prod.progress(), 10);
        assert_eq!(prod.remove(0).unwrap().id, "a");
        assert_eq!(prod.progress(), 0);
        assert!(prod.remove(0).is_none());
    }

    #[test]
    fn record_roundtrip() {
        let mut prod = ProductionManager::new();
        prod.set_production_modifier("x", 10.0);
        prod.enqueue(building("a", 20)).unwrap();
        prod.enqueue(building("b", 50)).unwrap();
        prod.process_turn(25);
        prod.process_turn(3);
        let restored = ProductionManager::from_record(&prod.to_record().unwrap()).unwrap();
        assert_eq!(restored, prod);

        let empty = ProductionManager::from_record(&serde_json::json!({})).unwrap();
        assert_eq!(empty, ProductionManager::new());
    }
}
