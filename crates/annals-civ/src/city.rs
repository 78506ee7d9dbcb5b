//! Cities and their yield recompute.

use annals_types::{CityId, NationId, TileCoord, WorldId, Yields};
use serde::{Deserialize, Serialize};

use crate::catalog::BuildingCatalog;
use crate::expansion::ExpansionManager;
use crate::population::PopulationManager;
use crate::production::ProductionManager;

/// Minimum food the center tile yields.
pub const CENTER_MIN_FOOD: u32 = 2;
/// Minimum production the center tile yields.
pub const CENTER_MIN_PRODUCTION: u32 = 1;
/// Culture every city produces.
pub const BASE_CULTURE: u32 = 1;
/// Extra culture produced by a capital.
pub const CAPITAL_CULTURE: u32 = 1;
/// Extra gold produced by a capital.
pub const CAPITAL_GOLD: u32 = 2;

/// A city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// Unique id.
    pub id: CityId,
    /// Display name.
    pub name: String,
    /// Current owner.
    pub owner: NationId,
    /// Nation that founded the city.
    pub founder: NationId,
    /// Year of founding.
    pub founded_year: i32,
    /// World the city belongs to.
    pub world_id: WorldId,
    /// Center tile.
    pub coord: TileCoord,
    /// Whether this is its owner's capital.
    #[serde(default)]
    pub is_capital: bool,
    /// Food and growth.
    #[serde(default)]
    pub population: PopulationManager,
    /// Production queue.
    #[serde(default)]
    pub production: ProductionManager,
    /// Territory.
    #[serde(default)]
    pub expansion: ExpansionManager,
    /// Yields for the current turn.
    #[serde(default)]
    pub yields: Yields,
    /// When set, the per-turn recompute leaves `yields` alone.
    #[serde(default)]
    pub yields_locked: bool,
}

impl City {
    /// Found a city at `coord` with founding-baseline yields.
    pub fn new(
        id: CityId,
        name: impl Into<String>,
        owner: NationId,
        coord: TileCoord,
        founded_year: i32,
        world_id: WorldId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            founder: owner,
            founded_year,
            world_id,
            coord,
            is_capital: false,
            population: PopulationManager::new(),
            production: ProductionManager::new(),
            expansion: ExpansionManager::new(coord),
            yields: Yields::founding_baseline(),
            yields_locked: false,
        }
    }

    /// Mark as capital.
    #[must_use]
    pub const fn as_capital(mut self) -> Self {
        self.is_capital = true;
        self
    }

    /// Recompute `yields` from owned tiles and built items.
    ///
    /// The center tile always counts, raised to at least 2 food and 1
    /// production. Each population point works one other owned tile, best
    /// first. Science equals population. `tile_yields` returns `None` for
    /// coordinates the map does not know. Returns false when the yields are
    /// locked and were left untouched.
    pub fn recompute_yields<F>(&mut self, tile_yields: F, catalog: &BuildingCatalog) -> bool
    where
        F: Fn(TileCoord) -> Option<Yields>,
    {
        if self.yields_locked {
            return false;
        }

        let mut total = tile_yields(self.coord).unwrap_or_default();
        total.food = total.food.max(CENTER_MIN_FOOD);
        total.production = total.production.max(CENTER_MIN_PRODUCTION);

        let mut worked: Vec<(TileCoord, Yields)> = self
            .expansion
            .owned_tiles()
            .iter()
            .filter(|coord| **coord != self.coord)
            .filter_map(|coord| tile_yields(*coord).map(|y| (*coord, y)))
            .collect();
        // Stable sort keeps coordinate order among equal tiles.
        worked.sort_by_key(|(_, y)| std::cmp::Reverse(work_priority(y)));
        let workers = usize::try_from(self.population.population()).unwrap_or(usize::MAX);
        for (_, y) in worked.iter().take(workers) {
            total.accumulate(y);
        }

        total.science = total.science.saturating_add(self.population.population());
        total.culture = total.culture.saturating_add(BASE_CULTURE);
        if self.is_capital {
            total.culture = total.culture.saturating_add(CAPITAL_CULTURE);
            total.gold = total.gold.saturating_add(CAPITAL_GOLD);
        }
        total.accumulate(&catalog.built_yields(&self.production));

        self.yields = total;
        true
    }
}

fn work_priority(y: &Yields) -> u32 {
    y.food
        .saturating_mul(3)
        .saturating_add(y.production.saturating_mul(2))
        .saturating_add(y.gold)
        .saturating_add(y.science)
        .saturating_add(y.culture)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn yields(food: u32, production: u32, gold: u32) -> Yields {
        Yields {
            food,
            production,
            gold,
            ..Yields::default()
        }
    }

    fn city() -> City {
        City::new(
            CityId::new(),
            "Ur",
            NationId::new(),
            TileCoord::new(0, 0),
            -4000,
            WorldId::new(),
        )
    }

    #[test]
    fn new_city_starts_at_baseline() {
        let c = city();
        assert_eq!(c.yields, Yields::founding_baseline());
        assert!(c.expansion.owns(c.coord));
        assert_eq!(c.founder, c.owner);
    }

    #[test]
    fn center_floor_and_worked_tiles() {
        let mut c = city().as_capital();
        c.expansion.purchase_tile(TileCoord::new(1, 0), |_| true);
        c.expansion.purchase_tile(TileCoord::new(0, 1), |_| true);
        let tiles = |coord: TileCoord| match (coord.x, coord.y) {
            (0, 0) => Some(yields(0, 0, 1)),
            (1, 0) => Some(yields(1, 0, 0)),
            (0, 1) => Some(yields(2, 0, 1)),
            _ => None,
        };
        assert!(c.recompute_yields(tiles, &BuildingCatalog::standard()));
        // Center 2/1/1, best worked tile 2/0/1, capital +2 gold.
        assert_eq!(c.yields.food, 4);
        assert_eq!(c.yields.production, 1);
        assert_eq!(c.yields.gold, 4);
        assert_eq!(c.yields.science, 1);
        assert_eq!(c.yields.culture, 2);
    }

    #[test]
    fn buildings_add_yields() {
        let catalog = BuildingCatalog::standard();
        let mut c = city();
        c.production.enqueue(catalog.item("monument").unwrap()).unwrap();
        c.production.process_turn(40);
        c.recompute_yields(|_| None, &catalog);
        assert_eq!(c.yields.culture, 3);
    }

    #[test]
    fn locked_yields_are_left_alone() {
        let mut c = city();
        c.yields = yields(9, 9, 9);
        c.yields_locked = true;
        assert!(!c.recompute_yields(|_| Some(Yields::default()), &BuildingCatalog::standard()));
        assert_eq!(c.yields, yields(9, 9, 9));
    }

    #[test]
    fn record_roundtrip() {
        let mut c = city();
        c.population.process_turn(8);
        c.is_capital = true;
        let json = serde_json::to_value(&c).unwrap();
        let restored: City = serde_json::from_value(json).unwrap();
        assert_eq!(restored, c);
    }
}
