//! Core value structs shared across the workspace.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::YieldKind;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// Map coordinate of a tile. Tiles are identified by their coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Create a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance `|dx| + |dy|`.
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }
}

impl core::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Yields and resources
// ---------------------------------------------------------------------------

/// Per-turn output of a city or nation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct Yields {
    /// Food.
    pub food: u32,
    /// Production.
    pub production: u32,
    /// Gold.
    pub gold: u32,
    /// Science.
    pub science: u32,
    /// Culture.
    pub culture: u32,
    /// Faith.
    pub faith: u32,
}

impl Yields {
    /// Yields of a freshly founded city before its first recompute.
    pub const fn founding_baseline() -> Self {
        Self {
            food: 2,
            production: 1,
            gold: 2,
            science: 0,
            culture: 0,
            faith: 0,
        }
    }

    /// Read one yield by kind.
    pub const fn get(&self, kind: YieldKind) -> u32 {
        match kind {
            YieldKind::Food => self.food,
            YieldKind::Production => self.production,
            YieldKind::Gold => self.gold,
            YieldKind::Science => self.science,
            YieldKind::Culture => self.culture,
            YieldKind::Faith => self.faith,
        }
    }

    /// Add another yield bundle into this one (saturating).
    pub const fn accumulate(&mut self, other: &Self) {
        self.food = self.food.saturating_add(other.food);
        self.production = self.production.saturating_add(other.production);
        self.gold = self.gold.saturating_add(other.gold);
        self.science = self.science.saturating_add(other.science);
        self.culture = self.culture.saturating_add(other.culture);
        self.faith = self.faith.saturating_add(other.faith);
    }
}

/// Banked resources of a nation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct Resources {
    /// Gold treasury.
    pub gold: u32,
    /// Lifetime science produced.
    pub science: u32,
    /// Lifetime culture produced.
    pub culture: u32,
    /// Faith bank.
    pub faith: u32,
}

// ---------------------------------------------------------------------------
// Culture traits
// ---------------------------------------------------------------------------

/// Six 0-100 scalars describing a nation's character. They steer the AI and
/// site scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(default)]
pub struct CultureTraits {
    /// Drive to found new cities.
    pub expansionist: u8,
    /// Affinity for the sea (coastal site bonus).
    pub seafaring: u8,
    /// Willingness to fight.
    pub militaristic: u8,
    /// Focus on research.
    pub scientific: u8,
    /// Focus on culture and policies.
    pub cultural: u8,
    /// Focus on trade and gold.
    pub commercial: u8,
}

impl CultureTraits {
    /// Upper bound of every trait.
    pub const MAX: u8 = 100;

    /// Build a profile, clamping each value to `0..=100`.
    pub fn new(
        expansionist: u8,
        seafaring: u8,
        militaristic: u8,
        scientific: u8,
        cultural: u8,
        commercial: u8,
    ) -> Self {
        Self {
            expansionist: expansionist.min(Self::MAX),
            seafaring: seafaring.min(Self::MAX),
            militaristic: militaristic.min(Self::MAX),
            scientific: scientific.min(Self::MAX),
            cultural: cultural.min(Self::MAX),
            commercial: commercial.min(Self::MAX),
        }
    }
}

impl Default for CultureTraits {
    fn default() -> Self {
        Self::new(50, 50, 50, 50, 50, 50)
    }
}
