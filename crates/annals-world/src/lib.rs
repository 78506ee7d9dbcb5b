//! Terrain and map collaborator for the Annals simulation.
//!
//! The simulation engine only sees the map through [`TerrainMap`]: per-tile
//! records with terrain, yields, resource flags, river flag, ownership, and
//! impassability, keyed by coordinate.
//!
//! # Modules
//!
//! - [`error`] -- Error types for map operations.
//! - [`map`] -- The [`TerrainMap`] trait and the in-memory [`GridMap`].
//! - [`starting_world`] -- The default hand-authored starting map.
//! - [`tile`] -- [`TileRecord`] and terrain base yields.

pub mod error;
pub mod map;
pub mod starting_world;
pub mod tile;

pub use error::WorldError;
pub use map::{GridMap, TerrainMap};
pub use starting_world::{StartingWorld, create_starting_world, map_from_template};
pub use tile::{TileRecord, TileResource, base_yields};
