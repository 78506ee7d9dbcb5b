//! Storage for the Annals simulation.
//!
//! The engine works against an [`EntityStore`] during a turn. After the turn
//! it hands the changes to a [`DurableStore`] through a [`SyncHandle`],
//! which never blocks the turn.
//!
//! ```text
//! process_turn
//!   |
//!   +-- read/write records --> EntityStore (InMemoryStore)
//!   |
//!   +-- end of turn --------> SyncHandle --(ordered writer)--> DurableStore
//!                                                      |-- JsonFileStore
//!                                                      +-- MemoryDurableStore
//! ```
//!
//! # Modules
//!
//! - [`entity`] -- Tagged records and key patterns
//! - [`memory`] -- Working store trait and in-memory implementation
//! - [`durable`] -- Sync batches and durable sinks
//! - [`sync`] -- Fire-and-forget dispatch to a single ordered writer
//! - [`snapshot`] -- Autosave files
//! - [`error`] -- Shared error types

pub mod durable;
pub mod entity;
pub mod error;
pub mod memory;
pub mod snapshot;
pub mod sync;

pub use durable::{DurableStore, JsonFileStore, Manifest, MemoryDurableStore, SyncBatch};
pub use entity::{StoredEntity, city_key, event_key, nation_key, parse_key, unit_key};
pub use error::StoreError;
pub use memory::{EntityStore, InMemoryStore};
pub use snapshot::{Snapshot, load_snapshot, save_snapshot};
pub use sync::{SyncHandle, SyncStats};
