//! Nation spawner for seeding the simulation.
//!
//! At startup the spawner registers one AI-controlled nation per configured
//! name, rolls its culture traits and preferred terrain, and hands out the
//! map's starting positions in order. Rolls come from a generator seeded
//! with `world.seed`, so the same config always spawns the same nations.
//! The turn step itself never draws random numbers.

use std::collections::BTreeSet;

use annals_core::engine::SimulationEngine;
use annals_types::{CultureTraits, NationId, TerrainKind, TileCoord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::EngineError;

/// Lowest rolled trait value.
const TRAIT_MIN: u8 = 20;

/// Highest rolled trait value.
const TRAIT_MAX: u8 = 80;

/// Terrains a nation may favor when picking city sites.
const PREFERRED_TERRAINS: &[TerrainKind] = &[
    TerrainKind::Grassland,
    TerrainKind::Plains,
    TerrainKind::Hills,
    TerrainKind::Forest,
    TerrainKind::Coast,
    TerrainKind::Desert,
];

/// Register the configured nations with `engine`.
///
/// Nations past the last starting position get none and settle wherever
/// the AI finds room.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if `names` is empty or repeats a name.
pub fn spawn_nations(
    engine: &mut SimulationEngine,
    names: &[String],
    starting_positions: &[TileCoord],
    seed: u64,
) -> Result<Vec<NationId>, EngineError> {
    if names.is_empty() {
        return Err(EngineError::Spawner {
            message: String::from("no nations configured"),
        });
    }
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(EngineError::Spawner {
                message: format!("duplicate nation name: {name}"),
            });
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut spawned = Vec::with_capacity(names.len());

    for (index, name) in names.iter().enumerate() {
        let traits = random_traits(&mut rng);
        let terrain = random_terrain(&mut rng);

        let mut nation = engine.new_nation(name.as_str(), traits).ai_controlled();
        if let Some(terrain) = terrain {
            nation = nation.with_preferred_terrain(terrain);
        }
        if let Some(position) = starting_positions.get(index) {
            nation = nation.with_starting_position(*position);
        }

        info!(
            name = %name,
            expansionist = traits.expansionist,
            seafaring = traits.seafaring,
            preferred_terrain = ?terrain,
            starting_position = ?starting_positions.get(index),
            "Nation spawned"
        );
        spawned.push(engine.add_nation(nation));
    }

    Ok(spawned)
}

fn random_traits(rng: &mut impl Rng) -> CultureTraits {
    CultureTraits::new(
        rng.random_range(TRAIT_MIN..=TRAIT_MAX),
        rng.random_range(TRAIT_MIN..=TRAIT_MAX),
        rng.random_range(TRAIT_MIN..=TRAIT_MAX),
        rng.random_range(TRAIT_MIN..=TRAIT_MAX),
        rng.random_range(TRAIT_MIN..=TRAIT_MAX),
        rng.random_range(TRAIT_MIN..=TRAIT_MAX),
    )
}

fn random_terrain(rng: &mut impl Rng) -> Option<TerrainKind> {
    let idx = rng.random_range(0..PREFERRED_TERRAINS.len());
    PREFERRED_TERRAINS.get(idx).copied()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_core::ai::BasicAiController;
    use annals_core::config::SimulationConfig;
    use annals_store::InMemoryStore;
    use annals_world::create_starting_world;

    use super::*;

    fn make_engine() -> (SimulationEngine, Vec<TileCoord>) {
        let world = create_starting_world().unwrap();
        let positions = world.starting_positions.clone();
        let engine = SimulationEngine::new(
            SimulationConfig::default(),
            Box::new(InMemoryStore::new()),
            Box::new(world.map),
            Box::new(BasicAiController::default()),
        )
        .unwrap();
        (engine, positions)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn spawns_one_ai_nation_per_name() {
        let (mut engine, positions) = make_engine();
        let ids = spawn_nations(&mut engine, &names(&["Akkad", "Elam", "Mari"]), &positions, 42)
            .unwrap();

        assert_eq!(ids.len(), 3);
        assert_eq!(engine.nation_ids(), ids.as_slice());
        for (id, position) in ids.iter().zip(&positions) {
            let nation = engine.nation(*id).unwrap();
            assert!(nation.is_ai);
            assert_eq!(nation.starting_position, Some(*position));
        }
    }

    #[test]
    fn traits_stay_in_range() {
        let (mut engine, positions) = make_engine();
        let ids = spawn_nations(&mut engine, &names(&["Akkad", "Elam"]), &positions, 7).unwrap();
        for id in ids {
            let traits = engine.nation(id).unwrap().traits;
            for value in [
                traits.expansionist,
                traits.seafaring,
                traits.militaristic,
                traits.scientific,
                traits.cultural,
                traits.commercial,
            ] {
                assert!((TRAIT_MIN..=TRAIT_MAX).contains(&value));
            }
        }
    }

    #[test]
    fn same_seed_spawns_same_nations() {
        let roster = names(&["Akkad", "Elam", "Mari"]);
        let (mut first, positions) = make_engine();
        let (mut second, _) = make_engine();
        let a = spawn_nations(&mut first, &roster, &positions, 42).unwrap();
        let b = spawn_nations(&mut second, &roster, &positions, 42).unwrap();

        assert_eq!(a, b);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(first.nation(*x).unwrap(), second.nation(*y).unwrap());
        }
    }

    #[test]
    fn extra_nations_get_no_starting_position() {
        let (mut engine, positions) = make_engine();
        let roster = names(&["Akkad", "Elam", "Mari", "Ebla"]);
        let ids = spawn_nations(&mut engine, &roster, &positions, 1).unwrap();
        let last = engine.nation(*ids.last().unwrap()).unwrap();
        assert!(last.starting_position.is_none());
    }

    #[test]
    fn empty_roster_is_an_error() {
        let (mut engine, positions) = make_engine();
        let result = spawn_nations(&mut engine, &[], &positions, 1);
        assert!(matches!(result, Err(EngineError::Spawner { .. })));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut engine, positions) = make_engine();
        let result = spawn_nations(&mut engine, &names(&["Akkad", "Akkad"]), &positions, 1);
        assert!(matches!(result, Err(EngineError::Spawner { .. })));
        assert!(engine.nation_ids().is_empty());
    }
}
