//! Shared type definitions for the Annals simulation.
//!
//! This crate is the single source of truth for identifiers, enums, and
//! value records used across the workspace. Types are exported to
//! `TypeScript` via `ts-rs` for chronicle viewers.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Enumeration types (terrain, eras, events, diplomacy)
//! - [`structs`] -- Value structs (coordinates, yields, culture traits)
//! - [`events`] -- Immutable historical event records

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

pub use enums::{
    DiplomaticState, EntityKind, Era, EventType, GrowthStatus, ParticipantRole, ProductionKind,
    ResourceClass, Significance, TerrainKind, TreatyKind, YieldKind,
};
pub use events::{HistoricalEvent, Participant};
pub use ids::{CityId, EventId, NationId, UnitId, WorldId};
pub use structs::{CultureTraits, Resources, TileCoord, Yields};
