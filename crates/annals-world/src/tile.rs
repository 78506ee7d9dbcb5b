//! Tile records: terrain, yields, resources, river, ownership.

use annals_types::{NationId, ResourceClass, TerrainKind, TileCoord, Yields};
use serde::{Deserialize, Serialize};

/// A named special resource sitting on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileResource {
    /// Resource class.
    pub class: ResourceClass,
    /// Resource name (`iron`, `silk`, ...).
    pub name: String,
}

/// Everything the simulation needs to know about one map tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Coordinate, which is also the tile's identity.
    pub coord: TileCoord,
    /// Terrain kind.
    pub terrain: TerrainKind,
    /// Yields produced when the tile is worked.
    pub yields: Yields,
    /// Special resource, if any.
    pub resource: Option<TileResource>,
    /// Whether a river runs through the tile.
    pub has_river: bool,
    /// Owning nation, if claimed.
    pub owner: Option<NationId>,
    /// Whether units can never enter the tile.
    pub impassable: bool,
}

impl TileRecord {
    /// Build a tile with the default yields for its terrain, river, and
    /// resource.
    pub fn new(
        coord: TileCoord,
        terrain: TerrainKind,
        has_river: bool,
        resource: Option<TileResource>,
    ) -> Self {
        let mut yields = base_yields(terrain);
        if has_river {
            yields.gold = yields.gold.saturating_add(1);
        }
        if let Some(res) = &resource {
            match res.class {
                ResourceClass::Bonus => yields.food = yields.food.saturating_add(1),
                ResourceClass::Strategic => {
                    yields.production = yields.production.saturating_add(1);
                }
                ResourceClass::Luxury => yields.gold = yields.gold.saturating_add(2),
            }
        }
        Self {
            coord,
            terrain,
            yields,
            resource,
            has_river,
            owner: None,
            impassable: matches!(
                terrain,
                TerrainKind::HighMountain | TerrainKind::SnowMountain
            ),
        }
    }

    /// Whether the tile carries a resource of the given class.
    pub fn has_resource(&self, class: ResourceClass) -> bool {
        self.resource.as_ref().is_some_and(|r| r.class == class)
    }

    /// Whether the tile carries a luxury resource.
    pub fn has_luxury(&self) -> bool {
        self.has_resource(ResourceClass::Luxury)
    }

    /// Whether the tile carries a strategic resource.
    pub fn has_strategic(&self) -> bool {
        self.has_resource(ResourceClass::Strategic)
    }

    /// Whether the tile carries a bonus resource.
    pub fn has_bonus(&self) -> bool {
        self.has_resource(ResourceClass::Bonus)
    }
}

/// Worked-tile yields for a bare terrain kind.
pub const fn base_yields(terrain: TerrainKind) -> Yields {
    let (food, production, gold) = match terrain {
        TerrainKind::Grassland | TerrainKind::Water => (2, 0, 0),
        TerrainKind::Plains | TerrainKind::Forest => (1, 1, 0),
        TerrainKind::Tundra | TerrainKind::Marsh => (1, 0, 0),
        TerrainKind::Hills => (0, 2, 0),
        TerrainKind::Coast | TerrainKind::Ocean => (1, 0, 1),
        TerrainKind::Desert
        | TerrainKind::Snow
        | TerrainKind::Mountain
        | TerrainKind::HighMountain
        | TerrainKind::SnowMountain => (0, 0, 0),
    };
    Yields {
        food,
        production,
        gold,
        science: 0,
        culture: 0,
        faith: 0,
    }
}
