//! The terrain/map collaborator.
//!
//! The simulation core never owns geometry. It talks to the map through the
//! [`TerrainMap`] trait: coordinate lookups, a deterministic tile listing,
//! neighbor queries, and ownership updates. [`GridMap`] is the in-memory
//! rectangular implementation used by the engine binary and tests.
//!
//! All lookups are synchronous and in-memory.

use std::collections::BTreeMap;

use annals_types::{NationId, TileCoord};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::tile::TileRecord;

/// Per-coordinate tile access used by the simulation engine and the AI.
pub trait TerrainMap: Send {
    /// Look up a tile by coordinate.
    fn tile(&self, coord: TileCoord) -> Option<&TileRecord>;

    /// All tiles, in a stable order (row-major by coordinate).
    fn tiles(&self) -> Vec<&TileRecord>;

    /// Coordinates of existing tiles adjacent to `coord`.
    fn neighbors(&self, coord: TileCoord) -> Vec<TileCoord>;

    /// Set or clear the owner of a tile.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TileNotFound`] if no tile exists at `coord`.
    fn set_owner(&mut self, coord: TileCoord, owner: Option<NationId>) -> Result<(), WorldError>;
}

/// Offsets of the eight tiles around a coordinate.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A rectangular grid of tiles keyed by coordinate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridMap {
    /// Tiles indexed by coordinate.
    tiles: BTreeMap<TileCoord, TileRecord>,
}

impl GridMap {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            tiles: BTreeMap::new(),
        }
    }

    /// Build a map from a list of tiles.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateTile`] if two tiles share a coordinate.
    pub fn from_tiles(tiles: Vec<TileRecord>) -> Result<Self, WorldError> {
        let mut map = Self::new();
        for tile in tiles {
            map.insert(tile)?;
        }
        Ok(map)
    }

    /// Insert one tile.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateTile`] if the coordinate is taken.
    pub fn insert(&mut self, tile: TileRecord) -> Result<(), WorldError> {
        if self.tiles.contains_key(&tile.coord) {
            return Err(WorldError::DuplicateTile(tile.coord));
        }
        self.tiles.insert(tile.coord, tile);
        Ok(())
    }

    /// Mutable access to a tile.
    pub fn tile_mut(&mut self, coord: TileCoord) -> Option<&mut TileRecord> {
        self.tiles.get_mut(&coord)
    }

    /// Number of tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Whether the map has no tiles.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Coordinates owned by `nation`.
    pub fn owned_by(&self, nation: NationId) -> Vec<TileCoord> {
        self.tiles
            .values()
            .filter(|t| t.owner == Some(nation))
            .map(|t| t.coord)
            .collect()
    }
}

impl TerrainMap for GridMap {
    fn tile(&self, coord: TileCoord) -> Option<&TileRecord> {
        self.tiles.get(&coord)
    }

    fn tiles(&self) -> Vec<&TileRecord> {
        // BTreeMap orders by (x, y); present row-major instead.
        let mut all: Vec<&TileRecord> = self.tiles.values().collect();
        all.sort_by_key(|t| (t.coord.y, t.coord.x));
        all
    }

    fn neighbors(&self, coord: TileCoord) -> Vec<TileCoord> {
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|(dx, dy)| {
                let x = coord.x.checked_add(*dx)?;
                let y = coord.y.checked_add(*dy)?;
                let candidate = TileCoord::new(x, y);
                self.tiles.contains_key(&candidate).then_some(candidate)
            })
            .collect()
    }

    fn set_owner(&mut self, coord: TileCoord, owner: Option<NationId>) -> Result<(), WorldError> {
        let tile = self
            .tiles
            .get_mut(&coord)
            .ok_or(WorldError::TileNotFound(coord))?;
        tile.owner = owner;
        Ok(())
    }
}
