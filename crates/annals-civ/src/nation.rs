//! Nations: identity, banked resources, and nation-level managers.

use std::collections::BTreeMap;

use annals_types::{
    CityId, CultureTraits, Era, NationId, Resources, TerrainKind, TileCoord, WorldId, Yields,
};
use serde::{Deserialize, Serialize};

use crate::diplomacy::DiplomacyManager;
use crate::policy::PolicyManager;
use crate::tech::TechManager;

/// A simulated civilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nation {
    /// Unique id.
    pub id: NationId,
    /// Display name.
    pub name: String,
    /// World the nation lives in.
    pub world_id: WorldId,
    /// Character profile.
    #[serde(default)]
    pub traits: CultureTraits,
    /// Terrain the nation likes to settle on.
    #[serde(default)]
    pub preferred_terrain: Option<TerrainKind>,
    /// Yields summed over all cities this turn.
    #[serde(default)]
    pub yields: Yields,
    /// Banked resources.
    #[serde(default)]
    pub resources: Resources,
    /// Research.
    #[serde(default)]
    pub tech: TechManager,
    /// Policies.
    #[serde(default)]
    pub policy: PolicyManager,
    /// This nation's view of each counterpart.
    #[serde(default)]
    pub diplomacy: BTreeMap<NationId, DiplomacyManager>,
    /// Owned cities in founding order.
    #[serde(default)]
    pub cities: Vec<CityId>,
    /// Whether the nation takes part in the simulation.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Whether the AI plays this nation.
    #[serde(default)]
    pub is_ai: bool,
    /// Whether the nation has been eliminated.
    #[serde(default)]
    pub is_eliminated: bool,
    /// Current era.
    #[serde(default)]
    pub era: Era,
    /// Where the first city goes if no settler exists.
    #[serde(default)]
    pub starting_position: Option<TileCoord>,
    /// Whether the starting position has been consumed.
    #[serde(default)]
    pub starting_position_used: bool,
    /// Set once when the first city is founded.
    #[serde(default)]
    pub first_city_founded: bool,
}

const fn default_true() -> bool {
    true
}

impl Nation {
    /// Create an active, human-controlled nation with no cities.
    pub fn new(
        id: NationId,
        name: impl Into<String>,
        traits: CultureTraits,
        world_id: WorldId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            world_id,
            traits,
            preferred_terrain: None,
            yields: Yields::default(),
            resources: Resources::default(),
            tech: TechManager::new(),
            policy: PolicyManager::new(),
            diplomacy: BTreeMap::new(),
            cities: Vec::new(),
            is_active: true,
            is_ai: false,
            is_eliminated: false,
            era: Era::default(),
            starting_position: None,
            starting_position_used: false,
            first_city_founded: false,
        }
    }

    /// Hand the nation to the AI.
    #[must_use]
    pub const fn ai_controlled(mut self) -> Self {
        self.is_ai = true;
        self
    }

    /// Set the starting position.
    #[must_use]
    pub const fn with_starting_position(mut self, coord: TileCoord) -> Self {
        self.starting_position = Some(coord);
        self
    }

    /// Set the preferred settling terrain.
    #[must_use]
    pub const fn with_preferred_terrain(mut self, terrain: TerrainKind) -> Self {
        self.preferred_terrain = Some(terrain);
        self
    }

    /// Number of owned cities.
    pub fn city_count(&self) -> usize {
        self.cities.len()
    }

    /// Whether the nation still plays: active and not eliminated.
    pub const fn is_alive(&self) -> bool {
        self.is_active && !self.is_eliminated
    }

    /// Starting position if not yet consumed.
    pub const fn unused_starting_position(&self) -> Option<TileCoord> {
        if self.starting_position_used {
            None
        } else {
            self.starting_position
        }
    }

    /// This nation's view of `counterpart`, if any.
    pub fn relationship(&self, counterpart: NationId) -> Option<&DiplomacyManager> {
        self.diplomacy.get(&counterpart)
    }

    /// This nation's view of `counterpart`, created neutral on first use.
    pub fn relationship_mut(&mut self, counterpart: NationId) -> &mut DiplomacyManager {
        self.diplomacy.entry(counterpart).or_default()
    }

    /// Spend `amount` gold if the treasury covers it.
    pub const fn spend_gold(&mut self, amount: u32) -> bool {
        if self.resources.gold < amount {
            return false;
        }
        self.resources.gold = self.resources.gold.saturating_sub(amount);
        true
    }

    /// Clear per-turn yields before re-accumulating from cities.
    pub fn reset_yields(&mut self) {
        self.yields = Yields::default();
    }
}
