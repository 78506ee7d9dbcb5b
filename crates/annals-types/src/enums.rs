//! Enumeration types for the Annals simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Yields and eras
// ---------------------------------------------------------------------------

/// One of the six per-turn yields a city or nation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum YieldKind {
    /// Feeds population growth.
    Food,
    /// Builds items in the production queue.
    Production,
    /// Currency for purchases.
    Gold,
    /// Drives technology research.
    Science,
    /// Drives policy adoption and border growth.
    Culture,
    /// Religious output, accumulated only.
    Faith,
}

/// Technological era of a nation. Ordered: a nation's era only moves forward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Era {
    /// Starting era.
    #[default]
    Ancient,
    /// Classical antiquity.
    Classical,
    /// Medieval.
    Medieval,
    /// Renaissance.
    Renaissance,
    /// Industrial.
    Industrial,
    /// Modern.
    Modern,
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain kind of a map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TerrainKind {
    /// Fertile grassland.
    Grassland,
    /// Open plains.
    Plains,
    /// Arid desert.
    Desert,
    /// Cold tundra.
    Tundra,
    /// Snowfield.
    Snow,
    /// Rolling hills.
    Hills,
    /// Forest.
    Forest,
    /// Marshland.
    Marsh,
    /// Shallow coastal water.
    Coast,
    /// Deep ocean.
    Ocean,
    /// Inland water (lakes).
    Water,
    /// Mountain range.
    Mountain,
    /// High mountain peaks.
    HighMountain,
    /// Snow-capped mountains.
    SnowMountain,
}

impl TerrainKind {
    /// Whether a city can never be founded on this terrain.
    pub const fn is_unsettleable(self) -> bool {
        matches!(
            self,
            Self::Mountain
                | Self::HighMountain
                | Self::SnowMountain
                | Self::Ocean
                | Self::Water
        )
    }

    /// Whether the tile is water of any depth.
    pub const fn is_water(self) -> bool {
        matches!(self, Self::Coast | Self::Ocean | Self::Water)
    }
}

/// Classification of a special resource on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ResourceClass {
    /// Yield-boosting resource (wheat, fish).
    Bonus,
    /// Military or industrial resource (iron, horses).
    Strategic,
    /// Happiness resource (silk, gems).
    Luxury,
}

// ---------------------------------------------------------------------------
// City and nation state
// ---------------------------------------------------------------------------

/// Population growth state of a city.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum GrowthStatus {
    /// Food surplus is positive.
    Growing,
    /// Food surplus is exactly zero.
    #[default]
    Stagnant,
    /// Food surplus is negative.
    Starving,
}

/// Kind of item in a city production queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ProductionKind {
    /// A city building, built at most once per city.
    Building,
    /// A unit, may be produced repeatedly.
    Unit,
    /// A wonder, built at most once per city.
    Wonder,
    /// A project, may be produced repeatedly.
    Project,
}

/// Diplomatic state of one nation toward a counterpart.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum DiplomaticState {
    /// No formal relationship.
    #[default]
    Neutral,
    /// At war.
    War,
    /// Peace treaty in force.
    Peace,
    /// Formal alliance.
    Alliance,
    /// Trade partnership.
    Trade,
}

/// Kind of treaty that can be proposed between two nations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TreatyKind {
    /// End a war.
    Peace,
    /// Form an alliance.
    Alliance,
    /// Trade agreement (enters the Trade state).
    Trade,
    /// Open borders agreement.
    OpenBorders,
    /// Research agreement.
    ResearchAgreement,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Type of a historical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EventType {
    /// A city was founded.
    CityFounded,
    /// A city grew by one population.
    CityGrew,
    /// A city lost population to starvation.
    CityStarved,
    /// A production item finished.
    ProductionCompleted,
    /// A wonder finished.
    WonderBuilt,
    /// A city acquired a tile.
    BordersExpanded,
    /// A technology was discovered.
    TechDiscovered,
    /// A nation entered a new era.
    EraAdvanced,
    /// A policy was adopted.
    PolicyAdopted,
    /// War was declared.
    WarDeclared,
    /// Peace was made.
    PeaceSigned,
    /// A non-peace treaty was accepted.
    TreatySigned,
    /// A nation was eliminated.
    NationEliminated,
    /// One nation remains.
    Victory,
}

/// How much an event matters to the chronicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Significance {
    /// Routine bookkeeping (growth, borders).
    Minor,
    /// Noteworthy (production, technology).
    Moderate,
    /// Major (founding, war, wonders).
    Major,
    /// Defines an age (victory).
    Historic,
}

/// Kind of an entity, used both as event participant type and as the stored
/// record discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// A nation.
    Nation,
    /// A city.
    City,
    /// A unit.
    Unit,
    /// A historical event.
    Event,
}

impl EntityKind {
    /// Store key prefix for this kind (`nation`, `city`, `unit`, `event`).
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Nation => "nation",
            Self::City => "city",
            Self::Unit => "unit",
            Self::Event => "event",
        }
    }
}

/// Role a participant plays in an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ParticipantRole {
    /// The entity the event happened to.
    Subject,
    /// The entity acted upon.
    Target,
    /// The nation that founded a city.
    Founder,
    /// The owner of the subject.
    Owner,
    /// The winner.
    Victor,
}
