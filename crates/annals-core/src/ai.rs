//! AI controller trait and the built-in controller.
//!
//! During the AI phase of each turn the engine hands every active,
//! AI-controlled nation to an [`AiController`] and executes the returned
//! [`Decision`]s in order. The controller only reads state; every mutation
//! goes through the engine. Controllers must be deterministic: the same
//! nation, turn, and world must produce the same decisions.
//!
//! [`BasicAiController`] expands on a trait-driven schedule, researches the
//! cheapest open technology, adopts policies as soon as they are
//! affordable, and keeps idle cities building.

use annals_civ::{Nation, SETTLER};
use annals_store::EntityStore;
use annals_types::{CityId, TerrainKind, TileCoord, WorldId};
use annals_world::{TerrainMap, TileRecord};
use serde::{Deserialize, Serialize};

use crate::config::AiConfig;
use crate::rules::Rules;

/// An action an AI wants the engine to take for its nation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Found a city. `location` is the controller's preferred site, used
    /// only when no settler or starting position is available.
    FoundCity {
        /// Preferred site.
        location: Option<TileCoord>,
    },
    /// Start researching a technology.
    SetResearch {
        /// Technology id.
        tech: String,
    },
    /// Adopt a policy.
    AdoptPolicy {
        /// Policy id.
        policy: String,
    },
    /// Append an item to a city's production queue.
    EnqueueProduction {
        /// Target city.
        city: CityId,
        /// Catalog id of the item.
        item: String,
    },
    /// A decision the engine does not know how to execute.
    Custom {
        /// Free-form decision name.
        name: String,
    },
}

/// Result of executing one [`Decision`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    /// Whether the decision took effect.
    pub success: bool,
    /// Human-readable explanation.
    pub description: String,
}

impl DecisionOutcome {
    /// A decision that took effect.
    pub fn succeeded(description: impl Into<String>) -> Self {
        Self {
            success: true,
            description: description.into(),
        }
    }

    /// A decision that did not take effect.
    pub fn failed(description: impl Into<String>) -> Self {
        Self {
            success: false,
            description: description.into(),
        }
    }
}

/// Read-only view of the world handed to a controller.
#[derive(Clone, Copy)]
pub struct AiContext<'a> {
    /// Terrain.
    pub map: &'a dyn TerrainMap,
    /// Entity records.
    pub store: &'a dyn EntityStore,
    /// Rule catalogs.
    pub rules: &'a Rules,
    /// World being simulated.
    pub world_id: WorldId,
}

/// A source of AI decisions.
///
/// Implementations are swappable; the engine owns one boxed controller.
pub trait AiController: Send {
    /// Decide what `nation` does this turn.
    fn make_decisions(
        &mut self,
        nation: &Nation,
        turn: u32,
        year: i32,
        ctx: &AiContext<'_>,
    ) -> Vec<Decision>;

    /// Whether `nation` wants to found a city on `turn`.
    fn should_found_city(&self, nation: &Nation, turn: u32) -> bool;

    /// Best site for a new city of `nation`, or `None` if nothing is
    /// eligible.
    fn find_city_founding_location(
        &self,
        nation: &Nation,
        map: &dyn TerrainMap,
        store: &dyn EntityStore,
        world_id: WorldId,
    ) -> Option<TileCoord>;
}

/// The built-in controller.
#[derive(Debug, Clone, Default)]
pub struct BasicAiController {
    config: AiConfig,
}

impl BasicAiController {
    /// Create a controller with the given parameters.
    pub const fn new(config: AiConfig) -> Self {
        Self { config }
    }

    /// Turns between foundings: ten expansionist points buy one turn off
    /// the base, never below the minimum.
    pub fn turns_per_city(&self, nation: &Nation) -> u32 {
        let discount = u32::from(nation.traits.expansionist)
            .checked_div(10)
            .unwrap_or(0);
        self.config
            .turns_per_city_base
            .saturating_sub(discount)
            .max(self.config.turns_per_city_min)
    }

    /// Desirability of founding on `tile`. Higher is better.
    pub fn site_score(nation: &Nation, tile: &TileRecord, coastal: bool) -> f64 {
        let flag = |present: bool| if present { 1.0 } else { 0.0 };
        let seafaring = f64::from(nation.traits.seafaring) / 10.0;

        15.0 * flag(nation.preferred_terrain == Some(tile.terrain))
            + 10.0 * flag(tile.terrain == TerrainKind::Grassland)
            + 8.0 * flag(tile.terrain == TerrainKind::Plains)
            + seafaring * flag(coastal)
            + 15.0 * flag(tile.has_river)
            + 12.0 * flag(tile.has_strategic())
            + 10.0 * flag(tile.has_luxury())
            + 5.0 * flag(tile.has_bonus())
            + 3.0 * f64::from(tile.yields.food)
            + 2.0 * f64::from(tile.yields.production)
    }

    fn wants_settler(&self, nation: &Nation, ctx: &AiContext<'_>) -> bool {
        if nation.city_count() >= self.config.max_cities {
            return false;
        }
        let settler_exists = ctx
            .store
            .units()
            .iter()
            .any(|u| u.owner == nation.id && u.is_settler());
        let settler_queued = nation.cities.iter().any(|id| {
            ctx.store
                .city(*id)
                .is_some_and(|c| c.production.queue().any(|item| item.id == SETTLER))
        });
        !settler_exists && !settler_queued
    }
}

/// Whether `tile` is coastal: coast terrain or next to water.
fn is_coastal(map: &dyn TerrainMap, tile: &TileRecord) -> bool {
    tile.terrain == TerrainKind::Coast
        || map
            .neighbors(tile.coord)
            .into_iter()
            .filter_map(|c| map.tile(c))
            .any(|n| n.terrain.is_water())
}

impl AiController for BasicAiController {
    fn make_decisions(
        &mut self,
        nation: &Nation,
        turn: u32,
        _year: i32,
        ctx: &AiContext<'_>,
    ) -> Vec<Decision> {
        let mut decisions = Vec::new();

        if self.should_found_city(nation, turn) {
            decisions.push(Decision::FoundCity {
                location: self.find_city_founding_location(
                    nation,
                    ctx.map,
                    ctx.store,
                    ctx.world_id,
                ),
            });
        }

        if nation.tech.current_research().is_none()
            && let Some(tech) = ctx.rules.techs.cheapest_available(nation.tech.researched())
        {
            decisions.push(Decision::SetResearch {
                tech: tech.id.to_owned(),
            });
        }

        if let Some(policy) = ctx.rules.policies.next_adoptable(&nation.policy)
            && nation.policy.can_adopt(policy)
        {
            decisions.push(Decision::AdoptPolicy {
                policy: policy.id.clone(),
            });
        }

        let mut settler_planned = !self.wants_settler(nation, ctx);
        for city_id in &nation.cities {
            let Some(city) = ctx.store.city(*city_id) else {
                continue;
            };
            if city.production.current_production().is_some() {
                continue;
            }
            if !settler_planned && city.population.population() >= 2 {
                settler_planned = true;
                decisions.push(Decision::EnqueueProduction {
                    city: city.id,
                    item: SETTLER.to_owned(),
                });
            } else if let Some(building) = ctx
                .rules
                .buildings
                .next_building(nation.tech.researched(), &city.production)
            {
                decisions.push(Decision::EnqueueProduction {
                    city: city.id,
                    item: building.id.to_owned(),
                });
            }
        }

        decisions
    }

    fn should_found_city(&self, nation: &Nation, turn: u32) -> bool {
        let cities = nation.city_count();
        if cities == 0 {
            return true;
        }
        cities < self.config.max_cities
            && turn.checked_rem(self.turns_per_city(nation)) == Some(0)
    }

    fn find_city_founding_location(
        &self,
        nation: &Nation,
        map: &dyn TerrainMap,
        store: &dyn EntityStore,
        world_id: WorldId,
    ) -> Option<TileCoord> {
        let centers: Vec<TileCoord> = store
            .cities()
            .into_iter()
            .filter(|c| c.world_id == world_id)
            .map(|c| c.coord)
            .collect();

        let mut best: Option<(f64, TileCoord)> = None;
        for tile in map.tiles() {
            if tile.terrain.is_unsettleable() || tile.impassable || tile.owner.is_some() {
                continue;
            }
            if centers
                .iter()
                .any(|c| c.manhattan_distance(tile.coord) < self.config.min_city_distance)
            {
                continue;
            }
            let score = Self::site_score(nation, tile, is_coastal(map, tile));
            // Strict comparison: the first tile wins ties.
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, tile.coord));
            }
        }
        best.map(|(_, coord)| coord)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_civ::City;
    use annals_store::{InMemoryStore, StoredEntity};
    use annals_types::{CultureTraits, NationId};
    use annals_world::{GridMap, map_from_template};

    use super::*;

    fn nation_with(expansionist: u8, cities: usize) -> Nation {
        let traits = CultureTraits {
            expansionist,
            ..CultureTraits::default()
        };
        let mut nation = Nation::new(NationId::new(), "Akkad", traits, WorldId::new());
        nation.cities = (0..cities).map(|_| CityId::new()).collect();
        nation
    }

    #[test]
    fn turns_per_city_follows_expansionist() {
        let ai = BasicAiController::default();
        assert_eq!(ai.turns_per_city(&nation_with(60, 1)), 9);
        assert_eq!(ai.turns_per_city(&nation_with(80, 1)), 7);
        assert_eq!(ai.turns_per_city(&nation_with(0, 1)), 15);
        assert_eq!(ai.turns_per_city(&nation_with(100, 1)), 5);
    }

    #[test]
    fn founding_schedule_for_expansionist_sixty() {
        let ai = BasicAiController::default();
        let nation = nation_with(60, 1);
        for turn in 1..=40 {
            let expected = turn % 9 == 0;
            assert_eq!(ai.should_found_city(&nation, turn), expected, "turn {turn}");
        }
    }

    #[test]
    fn nation_without_cities_always_founds() {
        let ai = BasicAiController::default();
        let nation = nation_with(0, 0);
        assert!(ai.should_found_city(&nation, 1));
        assert!(ai.should_found_city(&nation, 13));
    }

    #[test]
    fn city_cap_stops_founding() {
        let ai = BasicAiController::default();
        let nation = nation_with(100, 5);
        assert!(!ai.should_found_city(&nation, 5));
    }

    #[test]
    fn best_site_prefers_river_grassland() {
        let map = map_from_template(&["PPP", "PgP", "PPP"]).unwrap();
        let store = InMemoryStore::new();
        let nation = nation_with(50, 0);
        let ai = BasicAiController::default();
        let site = ai.find_city_founding_location(&nation, &map, &store, nation.world_id);
        assert_eq!(site, Some(TileCoord::new(1, 1)));
    }

    #[test]
    fn ties_go_to_the_first_tile() {
        let map = map_from_template(&["PP", "PP"]).unwrap();
        let store = InMemoryStore::new();
        let nation = nation_with(50, 0);
        let ai = BasicAiController::default();
        let site = ai.find_city_founding_location(&nation, &map, &store, nation.world_id);
        assert_eq!(site, Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn sites_near_existing_cities_and_mountains_excluded() {
        let map = map_from_template(&["GGGGG", "MMMMM"]).unwrap();
        let nation = nation_with(50, 0);
        let city = City::new(
            CityId::new(),
            "Kish",
            nation.id,
            TileCoord::new(0, 0),
            -4000,
            nation.world_id,
        );
        let store: InMemoryStore = [StoredEntity::from(city)].into_iter().collect();
        let ai = BasicAiController::default();
        let site = ai.find_city_founding_location(&nation, &map, &store, nation.world_id);
        assert_eq!(site, Some(TileCoord::new(4, 0)));
    }

    #[test]
    fn cities_of_other_worlds_do_not_block() {
        let map = map_from_template(&["GG"]).unwrap();
        let nation = nation_with(50, 0);
        let city = City::new(
            CityId::new(),
            "Elsewhere",
            nation.id,
            TileCoord::new(0, 0),
            -4000,
            WorldId::new(),
        );
        let store: InMemoryStore = [StoredEntity::from(city)].into_iter().collect();
        let ai = BasicAiController::default();
        let site = ai.find_city_founding_location(&nation, &map, &store, nation.world_id);
        assert_eq!(site, Some(TileCoord::new(0, 0)));
    }

    #[test]
    fn no_candidate_yields_none() {
        let map = map_from_template(&["MO", "WM"]).unwrap();
        let store = InMemoryStore::new();
        let nation = nation_with(50, 0);
        let ai = BasicAiController::default();
        assert!(
            ai.find_city_founding_location(&nation, &map, &store, nation.world_id)
                .is_none()
        );
        assert!(
            ai.find_city_founding_location(&nation, &GridMap::new(), &store, nation.world_id)
                .is_none()
        );
    }

    #[test]
    fn idle_nation_researches_cheapest_tech() {
        let map = map_from_template(&["GG"]).unwrap();
        let store = InMemoryStore::new();
        let rules = Rules::standard();
        let nation = nation_with(0, 1);
        let ctx = AiContext {
            map: &map,
            store: &store,
            rules: &rules,
            world_id: nation.world_id,
        };
        let mut ai = BasicAiController::default();
        let decisions = ai.make_decisions(&nation, 2, -3920, &ctx);
        assert!(decisions.contains(&Decision::SetResearch {
            tech: String::from("agriculture"),
        }));
        assert!(
            !decisions
                .iter()
                .any(|d| matches!(d, Decision::FoundCity { .. }))
        );
    }

    #[test]
    fn decisions_serialize_with_kind_tag() {
        let decision = Decision::FoundCity {
            location: Some(TileCoord::new(3, 4)),
        };
        let value = serde_json::to_value(&decision).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"kind": "found_city", "location": {"x": 3, "y": 4}})
        );

        let custom: Decision =
            serde_json::from_str(r#"{"kind":"custom","name":"raze"}"#).unwrap();
        assert_eq!(
            custom,
            Decision::Custom {
                name: String::from("raze"),
            }
        );
    }
}
