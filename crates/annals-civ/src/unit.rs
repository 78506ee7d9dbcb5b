//! Units produced by cities.

use annals_types::{NationId, TileCoord, UnitId};
use serde::{Deserialize, Serialize};

use crate::catalog::SETTLER;

/// A unit on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique id.
    pub id: UnitId,
    /// Owning nation.
    pub owner: NationId,
    /// Catalog id of the unit type.
    pub unit_type: String,
    /// Position.
    pub coord: TileCoord,
}

impl Unit {
    /// Create a unit.
    pub fn new(
        id: UnitId,
        owner: NationId,
        unit_type: impl Into<String>,
        coord: TileCoord,
    ) -> Self {
        Self {
            id,
            owner,
            unit_type: unit_type.into(),
            coord,
        }
    }

    /// Whether this unit can found a city.
    pub fn is_settler(&self) -> bool {
        self.unit_type == SETTLER
    }
}
