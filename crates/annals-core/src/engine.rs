//! The turn engine: eight fixed phases that advance the world by one turn.
//!
//! Each call to [`SimulationEngine::process_turn`] runs, in order:
//!
//! 1. **City yields** -- recompute every city's yields from its tiles and
//!    buildings, except cities whose `yields_locked` flag is set.
//! 2. **Nation yields** -- reset each living nation's yields, sum its
//!    cities, bank gold and faith, and feed culture into the policy bank.
//! 3. **Cities** -- population, then production, then expansion, for every
//!    city of a living nation. Finished settlers become units.
//! 4. **Nations** -- research progress and era changes, then diplomacy
//!    decay on every relationship.
//! 5. **AI** -- every living AI nation's decisions are executed in order.
//! 6. **Victory** -- when exactly one nation is left alive, it wins and the
//!    engine stops. `engine.victory_check` turns this off.
//! 7. **Sync** -- changed records are handed to the durable store without
//!    waiting for the write.
//! 8. **Autosave and limits** -- periodic snapshot, then the max-turn stop.
//!
//! Every phase finishes before the next starts. Missing records are
//! skipped, never fatal. The step draws no randomness: entity ids are v5
//! UUIDs derived from the configured namespace and a per-engine sequence,
//! so two engines built from the same inputs emit identical histories.
//!
//! The durable store may lag the in-memory store by the batches still
//! queued for its writer. Batches are written in turn order. Nothing in the
//! turn reads the durable store.
//!
//! Operations that change state on behalf of a player or the AI live in
//! [`actions`].

mod actions;

use std::collections::BTreeSet;

use annals_civ::{City, Nation, ProductionItem, TileCandidate, Unit};
use annals_events::EventLog;
use annals_store::{
    EntityStore, Snapshot, StoredEntity, SyncBatch, SyncHandle, save_snapshot, unit_key,
};
use annals_types::{
    CityId, EntityKind, EventId, EventType, HistoricalEvent, NationId, ParticipantRole,
    ProductionKind, Significance, TileCoord, UnitId, WorldId,
};
use annals_world::TerrainMap;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::{AiContext, AiController};
use crate::clock::{ClockError, TurnClock};
use crate::config::SimulationConfig;
use crate::rules::Rules;

pub use actions::FoundingResult;

/// Errors that abort a turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// What one turn did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnSummary {
    /// Turn that ran.
    pub turn: u32,
    /// Year at the end of the turn.
    pub year: i32,
    /// Events emitted during the turn.
    pub events: usize,
    /// Cities founded during the turn.
    pub cities_founded: usize,
    /// Technologies discovered during the turn.
    pub techs_discovered: usize,
    /// Nations still alive after the turn.
    pub nations_alive: usize,
    /// Winner, if the turn ended the game.
    pub victor: Option<NationId>,
    /// Whether the engine stopped at the end of the turn.
    pub stopped: bool,
}

/// The simulation: clock, injected collaborators, and the event log.
pub struct SimulationEngine {
    config: SimulationConfig,
    clock: TurnClock,
    /// Namespace every derived id lives in.
    namespace: Uuid,
    world_id: WorldId,
    /// Last sequence number handed out for a derived id.
    sequence: u64,
    store: Box<dyn EntityStore>,
    map: Box<dyn TerrainMap>,
    ai: Box<dyn AiController>,
    rules: Rules,
    events: EventLog,
    /// Registration order.
    nations: Vec<NationId>,
    /// Founding order.
    cities: Vec<CityId>,
    /// Creation order.
    units: Vec<UnitId>,
    sync: Option<SyncHandle>,
    /// Keys removed since the last sync batch.
    pending_deletes: Vec<String>,
    /// Events already handed to the sync.
    synced_events: usize,
    paused: bool,
    stopped: bool,
    victor: Option<NationId>,
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("world_id", &self.world_id)
            .field("clock", &self.clock)
            .field("nations", &self.nations.len())
            .field("cities", &self.cities.len())
            .field("events", &self.events.len())
            .field("paused", &self.paused)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl SimulationEngine {
    /// Build an engine at turn 0 around the injected store, map, and AI.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError::Clock`] if the calendar configuration is
    /// invalid.
    pub fn new(
        config: SimulationConfig,
        store: Box<dyn EntityStore>,
        map: Box<dyn TerrainMap>,
        ai: Box<dyn AiController>,
    ) -> Result<Self, TurnError> {
        let clock = TurnClock::new(&config.world)?;
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_OID, config.world.namespace_seed.as_bytes());
        let world_id = config
            .world
            .world_id
            .map_or_else(|| WorldId::derived(&namespace, "world"), WorldId::from);

        info!(
            world = %config.world.name,
            world_id = %world_id,
            start_year = clock.year(),
            "Simulation engine created"
        );

        Ok(Self {
            config,
            clock,
            namespace,
            world_id,
            sequence: 0,
            store,
            map,
            ai,
            rules: Rules::standard(),
            events: EventLog::new(),
            nations: Vec::new(),
            cities: Vec::new(),
            units: Vec::new(),
            sync: None,
            pending_deletes: Vec::new(),
            synced_events: 0,
            paused: false,
            stopped: false,
            victor: None,
        })
    }

    /// Push each turn's changes to a durable store.
    #[must_use]
    pub fn with_sync(mut self, sync: SyncHandle) -> Self {
        self.sync = Some(sync);
        self
    }

    /// Replace the rule catalogs.
    #[must_use]
    pub fn with_rules(mut self, rules: Rules) -> Self {
        self.rules = rules;
        self
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current turn (0 before the first turn).
    pub const fn turn(&self) -> u32 {
        self.clock.turn()
    }

    /// Current year.
    pub const fn year(&self) -> i32 {
        self.clock.year()
    }

    /// World being simulated.
    pub const fn world_id(&self) -> WorldId {
        self.world_id
    }

    /// Configuration the engine was built with.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Rule catalogs.
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// The working entity store.
    pub fn store(&self) -> &dyn EntityStore {
        &*self.store
    }

    /// Mutable access to the working store, for scripted scenarios.
    ///
    /// Records written here are picked up by the next turn as-is.
    pub fn store_mut(&mut self) -> &mut dyn EntityStore {
        &mut *self.store
    }

    /// The map.
    pub fn map(&self) -> &dyn TerrainMap {
        &*self.map
    }

    /// The sync handle, if persistence sync is enabled.
    pub const fn sync(&self) -> Option<&SyncHandle> {
        self.sync.as_ref()
    }

    /// The chronicle.
    pub const fn events(&self) -> &EventLog {
        &self.events
    }

    /// Registered nations, in registration order.
    pub fn nation_ids(&self) -> &[NationId] {
        &self.nations
    }

    /// Founded cities, in founding order.
    pub fn city_ids(&self) -> &[CityId] {
        &self.cities
    }

    /// Live units, in creation order.
    pub fn unit_ids(&self) -> &[UnitId] {
        &self.units
    }

    /// Read a nation.
    pub fn nation(&self, id: NationId) -> Option<Nation> {
        self.store.nation(id)
    }

    /// Read a city.
    pub fn city(&self, id: CityId) -> Option<City> {
        self.store.city(id)
    }

    /// Read a unit.
    pub fn unit(&self, id: UnitId) -> Option<Unit> {
        self.store.unit(id)
    }

    /// Events of one year.
    pub fn events_in_year(&self, year: i32) -> Vec<&HistoricalEvent> {
        self.events.in_year(year)
    }

    /// Events a nation took part in.
    pub fn events_for_nation(&self, nation: NationId) -> Vec<&HistoricalEvent> {
        self.events.for_nation(nation)
    }

    /// Events that happened on a tile.
    pub fn events_at(&self, coord: TileCoord) -> Vec<&HistoricalEvent> {
        self.events.at(coord)
    }

    /// The winner, once one exists.
    pub const fn victor(&self) -> Option<NationId> {
        self.victor
    }

    // -----------------------------------------------------------------
    // Run control
    // -----------------------------------------------------------------

    /// Suspend turn processing. A turn in progress is unaffected.
    pub const fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume turn processing.
    pub const fn resume(&mut self) {
        self.paused = false;
    }

    /// Stop for good. A turn in progress is unaffected.
    pub const fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether turn processing is suspended.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the engine has stopped.
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    // -----------------------------------------------------------------
    // The turn
    // -----------------------------------------------------------------

    /// Advance the world by one turn.
    ///
    /// Returns `Ok(None)` without doing anything if the engine is paused
    /// or stopped.
    ///
    /// # Errors
    ///
    /// Returns [`TurnError`] if the clock cannot advance. No phase runs in
    /// that case.
    pub fn process_turn(&mut self) -> Result<Option<TurnSummary>, TurnError> {
        if self.stopped || self.paused {
            debug!(
                stopped = self.stopped,
                paused = self.paused,
                "Turn skipped"
            );
            return Ok(None);
        }

        let turn = self.clock.advance()?;
        let year = self.clock.year();
        let first_event = self.events.len();
        info!(turn, year, "Turn started");

        self.phase_city_yields();
        self.phase_nation_yields();
        self.phase_cities();
        self.phase_nations();
        self.phase_ai(turn, year);
        self.phase_victory();
        self.phase_sync(turn, year);
        self.phase_autosave_and_limits(turn, year);

        let emitted = self.events.since(first_event);
        let count = |kind: EventType| emitted.iter().filter(|e| e.event_type == kind).count();
        let summary = TurnSummary {
            turn,
            year,
            events: emitted.len(),
            cities_founded: count(EventType::CityFounded),
            techs_discovered: count(EventType::TechDiscovered),
            nations_alive: self.living_nations().len(),
            victor: self.victor,
            stopped: self.stopped,
        };

        info!(
            turn,
            year,
            events = summary.events,
            cities_founded = summary.cities_founded,
            nations_alive = summary.nations_alive,
            "Turn complete"
        );

        Ok(Some(summary))
    }

    /// Phase 1: recompute city yields.
    fn phase_city_yields(&mut self) {
        let mut recomputed: u32 = 0;
        for city_id in self.cities.clone() {
            let Some(mut city) = self.store.city(city_id) else {
                continue;
            };
            let map = &*self.map;
            if city.recompute_yields(|c| map.tile(c).map(|t| t.yields), &self.rules.buildings) {
                recomputed = recomputed.saturating_add(1);
                self.store.put(city.into());
            }
        }
        debug!(cities = recomputed, "City yields recomputed");
    }

    /// Phase 2: reset and re-accumulate nation yields and resources.
    fn phase_nation_yields(&mut self) {
        for nation_id in self.nations.clone() {
            let Some(mut nation) = self.store.nation(nation_id) else {
                continue;
            };
            if !nation.is_alive() {
                continue;
            }

            nation.reset_yields();
            for city_id in &nation.cities {
                if let Some(city) = self.store.city(*city_id) {
                    nation.yields.accumulate(&city.yields);
                }
            }

            let yields = nation.yields;
            let resources = &mut nation.resources;
            resources.gold = resources.gold.saturating_add(yields.gold);
            resources.faith = resources.faith.saturating_add(yields.faith);
            resources.science = resources.science.saturating_add(yields.science);
            resources.culture = resources.culture.saturating_add(yields.culture);
            nation.policy.process_turn(yields.culture);

            debug!(
                nation_id = %nation.id,
                gold = nation.resources.gold,
                science = yields.science,
                culture = yields.culture,
                "Nation yields accumulated"
            );
            self.store.put(nation.into());
        }
    }

    /// Phase 3: population, production, expansion for every city.
    fn phase_cities(&mut self) {
        for city_id in self.cities.clone() {
            let Some(mut city) = self.store.city(city_id) else {
                continue;
            };
            let Some(owner) = self.store.nation(city.owner) else {
                continue;
            };
            if !owner.is_alive() {
                continue;
            }

            let growth = city.population.process_turn(city.yields.food);
            if growth.grew {
                let event = self
                    .new_event(
                        EventType::CityGrew,
                        Significance::Minor,
                        format!("{} grew to population {}", city.name, growth.population),
                    )
                    .with_participant(
                        EntityKind::City,
                        city.id,
                        &city.name,
                        ParticipantRole::Subject,
                    )
                    .with_participant(
                        EntityKind::Nation,
                        owner.id,
                        &owner.name,
                        ParticipantRole::Owner,
                    )
                    .at(city.coord);
                self.record(event);
            }
            if growth.starved {
                let event = self
                    .new_event(
                        EventType::CityStarved,
                        Significance::Moderate,
                        format!(
                            "Famine in {} reduced it to population {}",
                            city.name, growth.population
                        ),
                    )
                    .with_participant(
                        EntityKind::City,
                        city.id,
                        &city.name,
                        ParticipantRole::Subject,
                    )
                    .with_participant(
                        EntityKind::Nation,
                        owner.id,
                        &owner.name,
                        ParticipantRole::Owner,
                    )
                    .at(city.coord);
                self.record(event);
            }

            let built = city.production.process_turn(city.yields.production);
            if let Some(item) = built.completed {
                self.finish_item(&city, &owner, &item);
            }

            let candidates = self.expansion_candidates(&city);
            let expansion = city.expansion.process_turn(city.yields.culture, &candidates);
            if let Some(coord) = expansion.acquired {
                self.claim_tile(coord, owner.id);
                let event = self
                    .new_event(
                        EventType::BordersExpanded,
                        Significance::Minor,
                        format!("The borders of {} expanded to {coord}", city.name),
                    )
                    .with_participant(
                        EntityKind::City,
                        city.id,
                        &city.name,
                        ParticipantRole::Subject,
                    )
                    .with_participant(
                        EntityKind::Nation,
                        owner.id,
                        &owner.name,
                        ParticipantRole::Owner,
                    )
                    .at(coord);
                self.record(event);
            }

            debug!(
                city_id = %city.id,
                population = city.population.population(),
                food_stored = city.population.food_stored(),
                production = city.production.progress(),
                tiles = city.expansion.owned_tiles().len(),
                "City processed"
            );
            self.store.put(city.into());
        }
    }

    /// Phase 4: research, eras, diplomacy decay.
    fn phase_nations(&mut self) {
        for nation_id in self.nations.clone() {
            let Some(mut nation) = self.store.nation(nation_id) else {
                continue;
            };
            if !nation.is_alive() {
                continue;
            }

            let research = nation.tech.process_turn(nation.yields.science);
            if let Some(tech_id) = research.completed {
                let definition = self.rules.techs.get(&tech_id).copied();
                let tech_name = definition.map_or_else(|| tech_id.clone(), |d| d.name.to_owned());
                info!(nation_id = %nation.id, tech = %tech_id, "Technology discovered");
                let event = self
                    .new_event(
                        EventType::TechDiscovered,
                        Significance::Moderate,
                        format!("{} discovered {tech_name}", nation.name),
                    )
                    .with_participant(
                        EntityKind::Nation,
                        nation.id,
                        &nation.name,
                        ParticipantRole::Subject,
                    );
                self.record(event);

                if let Some(definition) = definition
                    && nation.tech.advance_era(definition.era)
                {
                    nation.era = definition.era;
                    info!(nation_id = %nation.id, era = ?definition.era, "Era advanced");
                    let event = self
                        .new_event(
                            EventType::EraAdvanced,
                            Significance::Major,
                            format!("{} entered the {:?} era", nation.name, definition.era),
                        )
                        .with_participant(
                            EntityKind::Nation,
                            nation.id,
                            &nation.name,
                            ParticipantRole::Subject,
                        );
                    self.record(event);
                }
            }

            for (counterpart, relationship) in &mut nation.diplomacy {
                let decay = relationship.process_turn();
                if !decay.expired.is_empty() {
                    debug!(
                        nation_id = %nation_id,
                        counterpart = %counterpart,
                        expired = decay.expired.len(),
                        "Opinion modifiers expired"
                    );
                }
            }

            self.store.put(nation.into());
        }
    }

    /// Phase 5: run the AI for every living AI nation.
    fn phase_ai(&mut self, turn: u32, year: i32) {
        for nation_id in self.nations.clone() {
            let Some(nation) = self.store.nation(nation_id) else {
                continue;
            };
            if !nation.is_alive() || !nation.is_ai {
                continue;
            }

            let ctx = AiContext {
                map: &*self.map,
                store: &*self.store,
                rules: &self.rules,
                world_id: self.world_id,
            };
            let decisions = self.ai.make_decisions(&nation, turn, year, &ctx);
            debug!(nation_id = %nation_id, decisions = decisions.len(), "AI decided");

            for decision in decisions {
                let outcome = self.execute_decision(nation_id, decision);
                debug!(
                    nation_id = %nation_id,
                    success = outcome.success,
                    description = %outcome.description,
                    "AI decision executed"
                );
            }
        }
    }

    /// Phase 6: declare a winner when one nation remains.
    fn phase_victory(&mut self) {
        if !self.config.engine.victory_check || self.victor.is_some() {
            return;
        }
        let alive = self.living_nations();
        let [winner] = alive.as_slice() else {
            return;
        };

        info!(nation_id = %winner.id, name = %winner.name, "Victory");
        let event = self
            .new_event(
                EventType::Victory,
                Significance::Historic,
                format!("{} stands alone and wins", winner.name),
            )
            .with_participant(EntityKind::Nation, winner.id, &winner.name, ParticipantRole::Victor);
        self.victor = Some(winner.id);
        self.record(event);
        self.stopped = true;
    }

    /// Phase 7: hand the turn's changes to the durable store.
    fn phase_sync(&mut self, turn: u32, year: i32) {
        if self.sync.is_none() {
            return;
        }

        let mut upserts: Vec<StoredEntity> = Vec::new();
        upserts.extend(
            self.nations
                .iter()
                .filter_map(|id| self.store.nation(*id))
                .map(StoredEntity::from),
        );
        upserts.extend(
            self.cities
                .iter()
                .filter_map(|id| self.store.city(*id))
                .map(StoredEntity::from),
        );
        upserts.extend(
            self.units
                .iter()
                .filter_map(|id| self.store.unit(*id))
                .map(StoredEntity::from),
        );
        upserts.extend(
            self.events
                .since(self.synced_events)
                .iter()
                .cloned()
                .map(StoredEntity::from),
        );
        self.synced_events = self.events.len();

        let batch = SyncBatch {
            turn,
            year,
            upserts,
            deletes: std::mem::take(&mut self.pending_deletes),
        };
        debug!(
            turn,
            upserts = batch.upserts.len(),
            deletes = batch.deletes.len(),
            "Sync dispatched"
        );
        if let Some(sync) = &self.sync {
            sync.dispatch(batch);
        }
    }

    /// Phase 8: periodic autosave, then the max-turn stop.
    fn phase_autosave_and_limits(&mut self, turn: u32, year: i32) {
        let engine = &self.config.engine;
        if engine.autosave_interval > 0
            && turn.checked_rem(engine.autosave_interval) == Some(0)
            && let Some(dir) = &engine.autosave_dir
        {
            let entities: Vec<StoredEntity> = self
                .store
                .all_ids()
                .iter()
                .filter_map(|key| self.store.get(key))
                .collect();
            let snapshot = Snapshot::new(turn, year, entities);
            if let Err(err) = save_snapshot(dir, &snapshot) {
                warn!(turn, error = %err, "Autosave failed");
            }
        }

        let max_turns = self.config.engine.max_turns;
        if max_turns > 0 && turn >= max_turns && !self.stopped {
            info!(turn, max_turns, "Turn limit reached");
            self.stopped = true;
        }
    }

    // -----------------------------------------------------------------
    // Helpers shared with the actions
    // -----------------------------------------------------------------

    /// Next derived id in the engine's namespace.
    fn next_uuid(&mut self, kind: EntityKind) -> Uuid {
        self.sequence = self.sequence.saturating_add(1);
        let name = format!("{}:{}", kind.key_prefix(), self.sequence);
        Uuid::new_v5(&self.namespace, name.as_bytes())
    }

    /// Start an event stamped with the current turn and year.
    fn new_event(
        &mut self,
        event_type: EventType,
        significance: Significance,
        description: String,
    ) -> HistoricalEvent {
        let id = EventId::from(self.next_uuid(EntityKind::Event));
        HistoricalEvent::new(
            id,
            event_type,
            self.clock.year(),
            self.clock.turn(),
            significance,
            description,
        )
    }

    /// Append an event to the chronicle and the store.
    fn record(&mut self, event: HistoricalEvent) {
        self.store.put(StoredEntity::from(event.clone()));
        self.events.append(event);
    }

    /// Living nations in registration order.
    fn living_nations(&self) -> Vec<Nation> {
        self.nations
            .iter()
            .filter_map(|id| self.store.nation(*id))
            .filter(Nation::is_alive)
            .collect()
    }

    fn claim_tile(&mut self, coord: TileCoord, owner: NationId) {
        if let Err(err) = self.map.set_owner(coord, Some(owner)) {
            warn!(coord = %coord, error = %err, "Tile ownership not recorded");
        }
    }

    /// Unowned tiles bordering a city's territory, nearest first.
    fn expansion_candidates(&self, city: &City) -> Vec<TileCandidate> {
        let mut frontier: BTreeSet<TileCoord> = BTreeSet::new();
        for owned in city.expansion.owned_tiles() {
            for neighbor in self.map.neighbors(*owned) {
                if !city.expansion.owns(neighbor) {
                    frontier.insert(neighbor);
                }
            }
        }

        let mut candidates: Vec<TileCandidate> = frontier
            .into_iter()
            .filter_map(|coord| self.map.tile(coord))
            .filter(|tile| tile.owner.is_none())
            .map(|tile| TileCandidate {
                coord: tile.coord,
                yields: tile.yields,
                has_luxury: tile.has_luxury(),
                has_strategic: tile.has_strategic(),
                distance: city.coord.manhattan_distance(tile.coord),
            })
            .collect();
        candidates.sort_by_key(|c| (c.distance, c.coord.y, c.coord.x));
        candidates
    }

    /// Record a finished production item. Settlers head for their nation's
    /// best city site; other units, and settlers with no site to go to,
    /// stay on the city tile.
    fn finish_item(&mut self, city: &City, owner: &Nation, item: &ProductionItem) {
        let (event_type, significance) = if item.kind == ProductionKind::Wonder {
            (EventType::WonderBuilt, Significance::Major)
        } else {
            (EventType::ProductionCompleted, Significance::Moderate)
        };

        if item.kind == ProductionKind::Unit {
            let id = UnitId::from(self.next_uuid(EntityKind::Unit));
            let mut unit = Unit::new(id, owner.id, item.id.clone(), city.coord);
            if unit.is_settler()
                && let Some(site) = self.ai.find_city_founding_location(
                    owner,
                    &*self.map,
                    &*self.store,
                    self.world_id,
                )
            {
                unit.coord = site;
            }
            debug!(
                unit_id = %id,
                unit_type = %item.id,
                city_id = %city.id,
                coord = %unit.coord,
                "Unit trained"
            );
            self.units.push(id);
            self.store.put(unit.into());
        }

        info!(city_id = %city.id, item = %item.id, "Production completed");
        let event = self
            .new_event(
                event_type,
                significance,
                format!("{} completed {}", city.name, item.name),
            )
            .with_participant(EntityKind::City, city.id, &city.name, ParticipantRole::Subject)
            .with_participant(EntityKind::Nation, owner.id, &owner.name, ParticipantRole::Owner)
            .at(city.coord);
        self.record(event);
    }

    /// Remove a unit from the store and the sync.
    fn remove_unit(&mut self, id: UnitId) {
        let key = unit_key(id);
        self.store.delete(&key);
        self.units.retain(|u| *u != id);
        self.pending_deletes.push(key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_store::InMemoryStore;
    use annals_types::{CultureTraits, DiplomaticState, Era, Yields};
    use annals_world::map_from_template;

    use super::*;
    use crate::ai::BasicAiController;

    fn engine(rows: &[&str]) -> SimulationEngine {
        engine_with(rows, SimulationConfig::default())
    }

    fn engine_with(rows: &[&str], config: SimulationConfig) -> SimulationEngine {
        SimulationEngine::new(
            config,
            Box::new(InMemoryStore::new()),
            Box::new(map_from_template(rows).unwrap()),
            Box::new(BasicAiController::default()),
        )
        .unwrap()
    }

    fn add(engine: &mut SimulationEngine, name: &str) -> NationId {
        let nation = engine.new_nation(name, CultureTraits::default());
        engine.add_nation(nation)
    }

    /// A lone nation's city on open grassland, with the victory check off.
    fn sandbox_city() -> (SimulationEngine, NationId, CityId) {
        let mut config = SimulationConfig::default();
        config.engine.victory_check = false;
        let mut engine = engine_with(&["GGGG", "GGGG", "GGGG"], config);
        let nation = add(&mut engine, "Akkad");
        let city = engine.found_city(nation, TileCoord::new(1, 1)).city.unwrap();
        (engine, nation, city)
    }

    fn lock_yields(engine: &mut SimulationEngine, city_id: CityId, yields: Yields) {
        let mut city = engine.city(city_id).unwrap();
        city.yields = yields;
        city.yields_locked = true;
        engine.store.put(city.into());
    }

    fn count(engine: &SimulationEngine, kind: EventType) -> usize {
        engine
            .events()
            .all()
            .iter()
            .filter(|e| e.event_type == kind)
            .count()
    }

    #[test]
    fn paused_and_stopped_engines_skip_turns() {
        let mut engine = engine(&["GG"]);
        engine.pause();
        assert!(engine.process_turn().unwrap().is_none());
        assert_eq!(engine.turn(), 0);
        engine.resume();
        assert!(engine.process_turn().unwrap().is_some());
        engine.stop();
        assert!(engine.process_turn().unwrap().is_none());
        assert_eq!(engine.turn(), 1);
    }

    #[test]
    fn turn_advances_year() {
        let mut engine = engine(&["GG"]);
        let summary = engine.process_turn().unwrap().unwrap();
        assert_eq!(summary.turn, 1);
        assert_eq!(summary.year, -3960);
    }

    #[test]
    fn locked_yields_survive_recompute() {
        let mut engine = engine(&["GGGG", "GGGG"]);
        let nation = add(&mut engine, "Akkad");
        let city_id = engine.found_city(nation, TileCoord::new(1, 1)).city.unwrap();

        let mut city = engine.city(city_id).unwrap();
        city.yields = Yields {
            food: 9,
            ..Yields::founding_baseline()
        };
        city.yields_locked = true;
        engine.store.put(city.into());

        engine.process_turn().unwrap();
        assert_eq!(engine.city(city_id).unwrap().yields.food, 9);
    }

    #[test]
    fn nation_banks_city_gold() {
        let mut engine = engine(&["GGGG", "GGGG"]);
        let nation = add(&mut engine, "Akkad");
        engine.found_city(nation, TileCoord::new(1, 1));

        engine.process_turn().unwrap();
        let state = engine.nation(nation).unwrap();
        // Capital: center tile has no gold, capital bonus adds 2.
        assert_eq!(state.yields.gold, 2);
        assert_eq!(state.resources.gold, 2);
        assert!(state.policy.culture_stored() > 0);
    }

    #[test]
    fn lone_nation_wins_on_first_turn() {
        let mut engine = engine(&["GG"]);
        let akkad = add(&mut engine, "Akkad");
        let summary = engine.process_turn().unwrap().unwrap();
        assert_eq!(summary.victor, Some(akkad));
        assert!(engine.is_stopped());
    }

    #[test]
    fn sandbox_without_victory_check_keeps_running() {
        let mut config = SimulationConfig::default();
        config.engine.victory_check = false;
        let mut engine = engine_with(&["GG"], config);
        add(&mut engine, "Akkad");
        for _ in 0..3 {
            let summary = engine.process_turn().unwrap().unwrap();
            assert!(summary.victor.is_none());
        }
        assert!(!engine.is_stopped());
    }

    #[test]
    fn no_nations_means_no_victor() {
        let mut engine = engine(&["GG"]);
        let summary = engine.process_turn().unwrap().unwrap();
        assert!(summary.victor.is_none());
        assert!(!summary.stopped);
    }

    #[test]
    fn last_nation_standing_wins() {
        let mut engine = engine(&["GG"]);
        let akkad = add(&mut engine, "Akkad");
        let elam = add(&mut engine, "Elam");
        engine.eliminate_nation(elam);

        let summary = engine.process_turn().unwrap().unwrap();
        assert_eq!(summary.victor, Some(akkad));
        assert!(summary.stopped);
        let victory = engine
            .events()
            .all()
            .iter()
            .filter(|e| e.event_type == EventType::Victory)
            .count();
        assert_eq!(victory, 1);
        assert!(engine.process_turn().unwrap().is_none());
    }

    #[test]
    fn famine_shrinks_city_after_three_hungry_turns() {
        let (mut engine, _, city_id) = sandbox_city();
        let fed = Yields {
            food: 5,
            ..Yields::founding_baseline()
        };
        lock_yields(&mut engine, city_id, fed);
        for _ in 0..5 {
            engine.process_turn().unwrap();
        }
        assert_eq!(engine.city(city_id).unwrap().population.population(), 2);

        let hungry = Yields {
            food: 0,
            ..Yields::founding_baseline()
        };
        lock_yields(&mut engine, city_id, hungry);
        engine.process_turn().unwrap();
        engine.process_turn().unwrap();
        assert_eq!(count(&engine, EventType::CityStarved), 0);
        engine.process_turn().unwrap();

        let city = engine.city(city_id).unwrap();
        assert_eq!(city.population.population(), 1);
        assert_eq!(city.population.food_stored(), 0);
        assert_eq!(count(&engine, EventType::CityStarved), 1);
        let famine = engine
            .events()
            .all()
            .iter()
            .find(|e| e.event_type == EventType::CityStarved)
            .unwrap();
        assert_eq!(famine.location, Some(TileCoord::new(1, 1)));
    }

    #[test]
    fn culture_expands_borders_and_claims_the_tile() {
        let (mut engine, nation, city_id) = sandbox_city();
        let cultured = Yields {
            culture: 10,
            ..Yields::founding_baseline()
        };
        lock_yields(&mut engine, city_id, cultured);
        engine.process_turn().unwrap();

        assert_eq!(count(&engine, EventType::BordersExpanded), 1);
        let expanded = engine
            .events()
            .all()
            .iter()
            .find(|e| e.event_type == EventType::BordersExpanded)
            .unwrap();
        let coord = expanded.location.unwrap();
        assert!(engine.map().neighbors(TileCoord::new(1, 1)).contains(&coord));
        assert!(engine.city(city_id).unwrap().expansion.owns(coord));
        assert_eq!(engine.map().tile(coord).unwrap().owner, Some(nation));
    }

    #[test]
    fn finished_wonder_is_a_major_event() {
        let (mut engine, nation, city_id) = sandbox_city();
        let mut state = engine.nation(nation).unwrap();
        state.tech.grant_free_tech();
        assert!(state.tech.use_free_tech("mining"));
        engine.store.put(state.into());
        assert!(engine.enqueue_production(city_id, "stonehenge").success);

        let productive = Yields {
            production: 185,
            ..Yields::founding_baseline()
        };
        lock_yields(&mut engine, city_id, productive);
        engine.process_turn().unwrap();

        assert_eq!(count(&engine, EventType::WonderBuilt), 1);
        assert_eq!(count(&engine, EventType::ProductionCompleted), 0);
        let wonder = engine
            .events()
            .all()
            .iter()
            .find(|e| e.event_type == EventType::WonderBuilt)
            .unwrap();
        assert_eq!(wonder.significance, Significance::Major);
        assert!(engine.city(city_id).unwrap().production.has_wonder("stonehenge"));
    }

    #[test]
    fn classical_tech_advances_the_era() {
        let (mut engine, nation, city_id) = sandbox_city();
        let mut state = engine.nation(nation).unwrap();
        assert!(state.tech.set_research("currency", 105));
        engine.store.put(state.into());

        let studious = Yields {
            science: 200,
            ..Yields::founding_baseline()
        };
        lock_yields(&mut engine, city_id, studious);
        let summary = engine.process_turn().unwrap().unwrap();

        assert_eq!(summary.techs_discovered, 1);
        assert_eq!(count(&engine, EventType::EraAdvanced), 1);
        let state = engine.nation(nation).unwrap();
        assert!(state.tech.has_researched("currency"));
        assert_eq!(state.era, Era::Classical);
        assert_eq!(state.tech.era(), Era::Classical);
    }

    #[test]
    fn diplomacy_decays_during_the_turn() {
        let mut engine = engine(&["GGGG"]);
        let akkad = add(&mut engine, "Akkad");
        let elam = add(&mut engine, "Elam");
        assert!(engine.declare_war(akkad, elam).success);

        engine.process_turn().unwrap();
        engine.process_turn().unwrap();
        let view = engine.nation(akkad).unwrap();
        assert_eq!(view.relationship(elam).unwrap().turns_at_war(), 2);

        assert!(engine.make_peace(akkad, elam).success);
        engine.process_turn().unwrap();
        let view = engine.nation(akkad).unwrap();
        let rel = view.relationship(elam).unwrap();
        assert_eq!(rel.state(), DiplomaticState::Peace);
        assert_eq!(rel.turns_at_peace(), 1);
        let bonus = rel.modifiers().get("Peace treaty").unwrap();
        assert!((bonus.value - 19.5).abs() < 1e-9);
        assert!((rel.opinion() + 30.5).abs() < 1e-9);
    }

    #[test]
    fn max_turns_stops_engine() {
        let mut config = SimulationConfig::default();
        config.engine.max_turns = 2;
        let mut engine = engine_with(&["GG"], config);
        assert!(!engine.process_turn().unwrap().unwrap().stopped);
        assert!(engine.process_turn().unwrap().unwrap().stopped);
        assert!(engine.process_turn().unwrap().is_none());
    }

    #[test]
    fn expansion_candidates_are_unowned_and_nearest_first() {
        let mut engine = engine(&["GGG", "GGG", "GGG"]);
        let akkad = add(&mut engine, "Akkad");
        let elam = add(&mut engine, "Elam");
        let city_id = engine.found_city(akkad, TileCoord::new(1, 1)).city.unwrap();
        engine.claim_tile(TileCoord::new(0, 0), elam);

        let city = engine.city(city_id).unwrap();
        let candidates = engine.expansion_candidates(&city);
        assert_eq!(candidates.len(), 7);
        assert!(candidates.iter().all(|c| c.coord != TileCoord::new(0, 0)));
        assert_eq!(candidates.first().map(|c| c.distance), Some(1));
        assert_eq!(candidates.last().map(|c| c.distance), Some(2));
    }
}
