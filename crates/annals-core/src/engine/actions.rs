//! State-changing operations on behalf of players and the AI.
//!
//! Every operation returns a structured result. Unknown ids, missing
//! prerequisites, and empty treasuries are ordinary refusals, never errors,
//! and a refused operation leaves the world untouched.

use annals_civ::{AdoptResult, City, Nation, RushResult, TilePurchase, TreatyResult};
use annals_types::{
    CityId, CultureTraits, DiplomaticState, EntityKind, EventType, NationId, ParticipantRole,
    Significance, TileCoord, TreatyKind,
};
use serde::Serialize;
use tracing::{debug, info};

use super::SimulationEngine;
use crate::ai::{Decision, DecisionOutcome};

/// Outcome of a city founding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundingResult {
    /// Whether a city was founded.
    pub success: bool,
    /// The new city.
    pub city: Option<CityId>,
    /// Human-readable summary.
    pub description: String,
}

impl FoundingResult {
    fn refused(description: impl Into<String>) -> Self {
        Self {
            success: false,
            city: None,
            description: description.into(),
        }
    }
}

fn treaty_refused(description: impl Into<String>) -> TreatyResult {
    TreatyResult {
        success: false,
        kind: None,
        description: description.into(),
    }
}

fn purchase_refused(description: impl Into<String>) -> TilePurchase {
    TilePurchase {
        expanded: false,
        gold_spent: 0,
        description: description.into(),
    }
}

fn rush_refused(description: impl Into<String>) -> RushResult {
    RushResult {
        success: false,
        gold_spent: 0,
        completed: None,
        description: description.into(),
    }
}

fn adopt_refused(description: impl Into<String>) -> AdoptResult {
    AdoptResult {
        adopted: false,
        used_free_policy: false,
        culture_spent: 0,
        description: description.into(),
    }
}

/// Name for the next city of `nation`: the first city carries the
/// nation's name, later ones are numbered.
fn city_name(nation: &Nation) -> String {
    match nation.city_count() {
        0 => nation.name.clone(),
        n => format!("{} {}", nation.name, n.saturating_add(1)),
    }
}

impl SimulationEngine {
    // -----------------------------------------------------------------
    // Nations
    // -----------------------------------------------------------------

    /// Create a nation in this world with the next derived id. It is not
    /// registered until passed to [`add_nation`](Self::add_nation).
    pub fn new_nation(&mut self, name: impl Into<String>, traits: CultureTraits) -> Nation {
        let id = NationId::from(self.next_uuid(EntityKind::Nation));
        Nation::new(id, name, traits, self.world_id)
    }

    /// Register a nation. Re-adding an id replaces its record but keeps
    /// its place in the turn order.
    pub fn add_nation(&mut self, mut nation: Nation) -> NationId {
        nation.world_id = self.world_id;
        let id = nation.id;
        if !self.nations.contains(&id) {
            self.nations.push(id);
        }
        info!(nation_id = %id, name = %nation.name, ai = nation.is_ai, "Nation registered");
        self.store.put(nation.into());
        id
    }

    /// Remove a nation from play. Its cities stay on the map but are no
    /// longer processed.
    pub fn eliminate_nation(&mut self, nation_id: NationId) -> DecisionOutcome {
        let Some(mut nation) = self.store.nation(nation_id) else {
            return DecisionOutcome::failed(format!("Unknown nation {nation_id}"));
        };
        if nation.is_eliminated {
            return DecisionOutcome::failed(format!("{} is already eliminated", nation.name));
        }

        nation.is_eliminated = true;
        info!(nation_id = %nation_id, name = %nation.name, "Nation eliminated");
        let description = format!("{} has fallen", nation.name);
        let event = self
            .new_event(EventType::NationEliminated, Significance::Major, description.clone())
            .with_participant(
                EntityKind::Nation,
                nation.id,
                &nation.name,
                ParticipantRole::Subject,
            );
        self.record(event);
        self.store.put(nation.into());
        DecisionOutcome::succeeded(description)
    }

    // -----------------------------------------------------------------
    // Cities
    // -----------------------------------------------------------------

    /// Why `coord` cannot hold a new city, if it cannot.
    fn check_site(&self, coord: TileCoord) -> Result<(), String> {
        let Some(tile) = self.map.tile(coord) else {
            return Err(format!("No tile at {coord}"));
        };
        if tile.terrain.is_unsettleable() || tile.impassable {
            return Err(format!("{:?} at {coord} cannot hold a city", tile.terrain));
        }
        if tile.owner.is_some() {
            return Err(format!("{coord} is already claimed"));
        }
        Ok(())
    }

    /// Found a city for `nation_id` at `coord`. The nation's first city
    /// becomes its capital.
    pub fn found_city(&mut self, nation_id: NationId, coord: TileCoord) -> FoundingResult {
        let Some(mut nation) = self.store.nation(nation_id) else {
            return FoundingResult::refused(format!("Unknown nation {nation_id}"));
        };
        if !nation.is_alive() {
            return FoundingResult::refused(format!("{} is out of the game", nation.name));
        }
        if let Err(reason) = self.check_site(coord) {
            return FoundingResult::refused(reason);
        }

        let city_id = CityId::from(self.next_uuid(EntityKind::City));
        let mut city = City::new(
            city_id,
            city_name(&nation),
            nation.id,
            coord,
            self.clock.year(),
            self.world_id,
        );
        if nation.cities.is_empty() {
            city = city.as_capital();
        }

        nation.cities.push(city_id);
        nation.first_city_founded = true;
        if nation.starting_position == Some(coord) {
            nation.starting_position_used = true;
        }
        self.cities.push(city_id);
        self.claim_tile(coord, nation.id);

        info!(
            nation_id = %nation.id,
            city_id = %city_id,
            name = %city.name,
            coord = %coord,
            capital = city.is_capital,
            "City founded"
        );
        let description = format!("{} founded {} at {coord}", nation.name, city.name);
        let event = self
            .new_event(EventType::CityFounded, Significance::Major, description.clone())
            .with_participant(EntityKind::Nation, nation.id, &nation.name, ParticipantRole::Founder)
            .with_participant(EntityKind::City, city_id, &city.name, ParticipantRole::Subject)
            .at(coord);
        self.record(event);

        self.store.put(city.into());
        self.store.put(nation.into());
        FoundingResult {
            success: true,
            city: Some(city_id),
            description,
        }
    }

    /// Found a city where the nation's resources point: an existing
    /// settler's tile, else the unused starting position, else `preferred`.
    /// The first of those that can hold a city wins. The settler is
    /// consumed only when the city is founded on its tile.
    ///
    /// A settler whose tile can no longer hold a city moves to `preferred`
    /// first, so a claimed tile never strands it.
    fn found_city_for(
        &mut self,
        nation_id: NationId,
        preferred: Option<TileCoord>,
    ) -> DecisionOutcome {
        let Some(nation) = self.store.nation(nation_id) else {
            return DecisionOutcome::failed(format!("Unknown nation {nation_id}"));
        };
        let mut settler = self
            .units
            .iter()
            .filter_map(|id| self.store.unit(*id))
            .find(|u| u.owner == nation_id && u.is_settler());

        if let Some(unit) = settler.as_mut()
            && self.check_site(unit.coord).is_err()
            && let Some(target) = preferred.filter(|c| self.check_site(*c).is_ok())
        {
            debug!(unit_id = %unit.id, from = %unit.coord, to = %target, "Settler moved");
            unit.coord = target;
            self.store.put(unit.clone().into());
        }

        let site = [
            settler.as_ref().map(|u| u.coord),
            nation.unused_starting_position(),
            preferred,
        ]
        .into_iter()
        .flatten()
        .find(|coord| self.check_site(*coord).is_ok());
        let Some(site) = site else {
            return DecisionOutcome::failed(format!("{} found no site for a city", nation.name));
        };

        let founded = self.found_city(nation_id, site);
        if founded.success
            && let Some(settler) = settler.filter(|u| u.coord == site)
        {
            debug!(unit_id = %settler.id, nation_id = %nation_id, "Settler consumed");
            self.remove_unit(settler.id);
        }
        DecisionOutcome {
            success: founded.success,
            description: founded.description,
        }
    }

    /// Append a catalog item to a city's production queue.
    pub fn enqueue_production(&mut self, city_id: CityId, item_id: &str) -> DecisionOutcome {
        let Some(mut city) = self.store.city(city_id) else {
            return DecisionOutcome::failed(format!("Unknown city {city_id}"));
        };
        let Some(owner) = self.store.nation(city.owner) else {
            return DecisionOutcome::failed(format!("{} has no owner", city.name));
        };
        let Some(definition) = self.rules.buildings.get(item_id) else {
            return DecisionOutcome::failed(format!("Unknown item {item_id}"));
        };
        if let Some(tech) = definition.required_tech
            && !owner.tech.has_researched(tech)
        {
            return DecisionOutcome::failed(format!("{} requires {tech}", definition.name));
        }
        let Ok(item) = self.rules.buildings.item(item_id) else {
            return DecisionOutcome::failed(format!("Unknown item {item_id}"));
        };

        let name = item.name.clone();
        match city.production.enqueue(item) {
            Ok(()) => {
                debug!(city_id = %city_id, item = %item_id, "Production queued");
                self.store.put(city.into());
                DecisionOutcome::succeeded(format!("{} queued {name}", owner.name))
            }
            Err(refusal) => {
                DecisionOutcome::failed(format!("{name} refused in {}: {refusal:?}", city.name))
            }
        }
    }

    /// Complete the head of a city's queue with the owner's gold.
    pub fn rush_production(&mut self, city_id: CityId) -> RushResult {
        let Some(mut city) = self.store.city(city_id) else {
            return rush_refused(format!("Unknown city {city_id}"));
        };
        let Some(mut owner) = self.store.nation(city.owner) else {
            return rush_refused(format!("{} has no owner", city.name));
        };

        let result = city.production.rush(|cost| owner.spend_gold(cost));
        if !result.success {
            return result;
        }
        if let Some(item) = &result.completed {
            self.finish_item(&city, &owner, item);
        }
        self.store.put(city.into());
        self.store.put(owner.into());
        result
    }

    /// Buy a frontier tile for a city with the owner's gold.
    pub fn purchase_tile(&mut self, city_id: CityId, coord: TileCoord) -> TilePurchase {
        let Some(mut city) = self.store.city(city_id) else {
            return purchase_refused(format!("Unknown city {city_id}"));
        };
        let Some(mut owner) = self.store.nation(city.owner) else {
            return purchase_refused(format!("{} has no owner", city.name));
        };
        if !self
            .expansion_candidates(&city)
            .iter()
            .any(|c| c.coord == coord)
        {
            return purchase_refused(format!(
                "{coord} is not an unclaimed tile on the border of {}",
                city.name
            ));
        }

        let purchase = city
            .expansion
            .purchase_tile(coord, |price| owner.spend_gold(price));
        if !purchase.expanded {
            return purchase;
        }

        self.claim_tile(coord, owner.id);
        let event = self
            .new_event(
                EventType::BordersExpanded,
                Significance::Minor,
                format!("{} bought {coord} for {} gold", city.name, purchase.gold_spent),
            )
            .with_participant(EntityKind::City, city.id, &city.name, ParticipantRole::Subject)
            .with_participant(EntityKind::Nation, owner.id, &owner.name, ParticipantRole::Owner)
            .at(coord);
        self.record(event);
        self.store.put(city.into());
        self.store.put(owner.into());
        purchase
    }

    // -----------------------------------------------------------------
    // Research and policy
    // -----------------------------------------------------------------

    /// Point a nation's research at `tech_id`.
    pub fn set_research(&mut self, nation_id: NationId, tech_id: &str) -> DecisionOutcome {
        let Some(mut nation) = self.store.nation(nation_id) else {
            return DecisionOutcome::failed(format!("Unknown nation {nation_id}"));
        };
        let Some(definition) = self.rules.techs.get(tech_id).copied() else {
            return DecisionOutcome::failed(format!("Unknown technology {tech_id}"));
        };
        if let Some(missing) = definition
            .prerequisites
            .iter()
            .find(|p| !nation.tech.has_researched(p))
        {
            return DecisionOutcome::failed(format!("{} requires {missing}", definition.name));
        }
        if !nation.tech.set_research(definition.id, definition.cost) {
            return DecisionOutcome::failed(format!(
                "{} already knows {}",
                nation.name, definition.name
            ));
        }

        debug!(nation_id = %nation_id, tech = %tech_id, "Research set");
        let description = format!("{} is researching {}", nation.name, definition.name);
        self.store.put(nation.into());
        DecisionOutcome::succeeded(description)
    }

    /// Adopt a policy with banked culture or a free policy.
    pub fn adopt_policy(&mut self, nation_id: NationId, policy_id: &str) -> AdoptResult {
        let Some(definition) = self.rules.policies.get(policy_id).cloned() else {
            return adopt_refused(format!("Unknown policy {policy_id}"));
        };
        let Some(mut nation) = self.store.nation(nation_id) else {
            return adopt_refused(format!("Unknown nation {nation_id}"));
        };

        let result = nation.policy.adopt(&definition);
        if !result.adopted {
            return result;
        }

        let event = self
            .new_event(
                EventType::PolicyAdopted,
                Significance::Moderate,
                format!("{} adopted {}", nation.name, definition.name),
            )
            .with_participant(
                EntityKind::Nation,
                nation.id,
                &nation.name,
                ParticipantRole::Subject,
            );
        self.record(event);
        self.store.put(nation.into());
        result
    }

    /// Mark a policy tree complete for a nation. Completion is never
    /// inferred from unlocked policies; only this call sets it.
    pub fn complete_policy_tree(&mut self, nation_id: NationId, tree: &str) -> DecisionOutcome {
        let Some(mut nation) = self.store.nation(nation_id) else {
            return DecisionOutcome::failed(format!("Unknown nation {nation_id}"));
        };
        if !nation.policy.complete_tree(tree) {
            return DecisionOutcome::failed(format!("{} already completed {tree}", nation.name));
        }

        info!(nation_id = %nation_id, tree = %tree, "Policy tree completed");
        let description = format!("{} completed the {tree} tree", nation.name);
        self.store.put(nation.into());
        DecisionOutcome::succeeded(description)
    }

    // -----------------------------------------------------------------
    // Diplomacy
    // -----------------------------------------------------------------

    /// Load two distinct nations.
    fn pair(&self, a: NationId, b: NationId) -> Result<(Nation, Nation), String> {
        if a == b {
            return Err(String::from("A nation cannot negotiate with itself"));
        }
        let first = self
            .store
            .nation(a)
            .ok_or_else(|| format!("Unknown nation {a}"))?;
        let second = self
            .store
            .nation(b)
            .ok_or_else(|| format!("Unknown nation {b}"))?;
        Ok((first, second))
    }

    /// `aggressor` declares war on `target`. Both views enter war and the
    /// target records a grievance against the aggressor.
    pub fn declare_war(&mut self, aggressor: NationId, target: NationId) -> DecisionOutcome {
        let (mut attacker, mut defender) = match self.pair(aggressor, target) {
            Ok(pair) => pair,
            Err(reason) => return DecisionOutcome::failed(reason),
        };
        let turn = self.clock.turn();
        if !attacker.relationship_mut(target).declare_war(turn) {
            return DecisionOutcome::failed(format!(
                "{} cannot declare war on {} from its current standing",
                attacker.name, defender.name
            ));
        }
        let view = defender.relationship_mut(aggressor);
        view.declare_war(turn);
        view.add_grievance(format!("War declared by {}", attacker.name), turn);

        info!(aggressor = %aggressor, target = %target, "War declared");
        let description = format!("{} declared war on {}", attacker.name, defender.name);
        let event = self
            .new_event(EventType::WarDeclared, Significance::Major, description.clone())
            .with_participant(
                EntityKind::Nation,
                attacker.id,
                &attacker.name,
                ParticipantRole::Subject,
            )
            .with_participant(
                EntityKind::Nation,
                defender.id,
                &defender.name,
                ParticipantRole::Target,
            );
        self.record(event);
        self.store.put(attacker.into());
        self.store.put(defender.into());
        DecisionOutcome::succeeded(description)
    }

    /// End the war between two nations on both sides.
    pub fn make_peace(&mut self, a: NationId, b: NationId) -> DecisionOutcome {
        let (mut first, mut second) = match self.pair(a, b) {
            Ok(pair) => pair,
            Err(reason) => return DecisionOutcome::failed(reason),
        };
        let turn = self.clock.turn();
        if !first.relationship_mut(b).make_peace(turn) {
            return DecisionOutcome::failed(format!(
                "{} is not at war with {}",
                first.name, second.name
            ));
        }
        second.relationship_mut(a).make_peace(turn);

        info!(first = %a, second = %b, "Peace signed");
        let description = format!("{} and {} made peace", first.name, second.name);
        let event = self
            .new_event(EventType::PeaceSigned, Significance::Major, description.clone())
            .with_participant(EntityKind::Nation, first.id, &first.name, ParticipantRole::Subject)
            .with_participant(EntityKind::Nation, second.id, &second.name, ParticipantRole::Target);
        self.record(event);
        self.store.put(first.into());
        self.store.put(second.into());
        DecisionOutcome::succeeded(description)
    }

    /// Queue a treaty proposal from `from` in `to`'s view of `from`.
    /// Returns the proposal's index in that queue.
    pub fn propose_treaty(
        &mut self,
        from: NationId,
        to: NationId,
        kind: TreatyKind,
    ) -> Option<usize> {
        let (_, mut recipient) = self.pair(from, to).ok()?;
        let index = recipient
            .relationship_mut(from)
            .propose(kind, self.clock.turn());
        debug!(from = %from, to = %to, kind = ?kind, index, "Treaty proposed");
        self.store.put(recipient.into());
        Some(index)
    }

    /// Accept or reject the proposal at `index` in `recipient`'s view of
    /// `proposer`. An accepted treaty also takes effect in the proposer's
    /// view. Opinions on the two sides are never reconciled.
    pub fn respond_to_proposal(
        &mut self,
        recipient: NationId,
        proposer: NationId,
        index: usize,
        accept: bool,
    ) -> TreatyResult {
        let (mut receiving, mut proposing) = match self.pair(recipient, proposer) {
            Ok(pair) => pair,
            Err(reason) => return treaty_refused(reason),
        };
        let turn = self.clock.turn();
        let view = receiving.relationship_mut(proposer);
        let result = if accept {
            view.accept(index, turn)
        } else {
            view.reject(index, turn)
        };

        if accept
            && result.success
            && let Some(kind) = result.kind
        {
            let mirror = proposing.relationship_mut(recipient);
            match kind {
                TreatyKind::Peace => {
                    mirror.make_peace(turn);
                }
                TreatyKind::Alliance => {
                    mirror.set_state(DiplomaticState::Alliance, turn);
                }
                TreatyKind::Trade => {
                    mirror.set_state(DiplomaticState::Trade, turn);
                }
                TreatyKind::OpenBorders | TreatyKind::ResearchAgreement => {
                    let slot = mirror.propose(kind, turn);
                    mirror.accept(slot, turn);
                }
            }

            let (event_type, significance) = if kind == TreatyKind::Peace {
                (EventType::PeaceSigned, Significance::Major)
            } else {
                (EventType::TreatySigned, Significance::Moderate)
            };
            info!(recipient = %recipient, proposer = %proposer, kind = ?kind, "Treaty accepted");
            let event = self
                .new_event(
                    event_type,
                    significance,
                    format!("{} accepted {kind:?} from {}", receiving.name, proposing.name),
                )
                .with_participant(
                    EntityKind::Nation,
                    receiving.id,
                    &receiving.name,
                    ParticipantRole::Subject,
                )
                .with_participant(
                    EntityKind::Nation,
                    proposing.id,
                    &proposing.name,
                    ParticipantRole::Target,
                );
            self.record(event);
            self.store.put(proposing.into());
        }

        self.store.put(receiving.into());
        result
    }

    // -----------------------------------------------------------------
    // AI decisions
    // -----------------------------------------------------------------

    /// Carry out one AI decision for `nation_id`.
    pub fn execute_decision(&mut self, nation_id: NationId, decision: Decision) -> DecisionOutcome {
        match decision {
            Decision::FoundCity { location } => self.found_city_for(nation_id, location),
            Decision::SetResearch { tech } => self.set_research(nation_id, &tech),
            Decision::AdoptPolicy { policy } => {
                let result = self.adopt_policy(nation_id, &policy);
                DecisionOutcome {
                    success: result.adopted,
                    description: result.description,
                }
            }
            Decision::EnqueueProduction { city, item } => {
                if self.store.city(city).is_some_and(|c| c.owner == nation_id) {
                    self.enqueue_production(city, &item)
                } else {
                    DecisionOutcome::failed(format!("City {city} does not belong to {nation_id}"))
                }
            }
            Decision::Custom { name } => {
                DecisionOutcome::failed(format!("Unknown decision: {name}"))
            }
        }
    }
}
