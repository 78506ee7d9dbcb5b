//! Nations, cities, and the per-turn managers that evolve them.
//!
//! Each manager is a plain value owned by exactly one entity and mutated
//! only by that entity's per-turn call:
//!
//! - [`population`] -- food bank, growth, starvation
//! - [`production`] -- FIFO production queue with overflow
//! - [`expansion`] -- culture-funded territory
//! - [`tech`] -- single-slot research and era
//! - [`policy`] -- culture-funded social policies
//! - [`diplomacy`] -- one directed relationship toward a counterpart
//!
//! Every manager implements [`ManagerRecord`] for persistence. Shared
//! arithmetic lives in [`formula`] and stacking adjustments in
//! [`modifier`]. Rule data lives in [`catalog`].

pub mod catalog;
pub mod city;
pub mod diplomacy;
pub mod error;
pub mod expansion;
pub mod formula;
pub mod modifier;
pub mod nation;
pub mod policy;
pub mod population;
pub mod production;
pub mod record;
pub mod tech;
pub mod unit;

pub use catalog::{
    BuildingCatalog, BuildingDefinition, PolicyCatalog, SETTLER, TechDefinition, TechTree,
};
pub use city::City;
pub use diplomacy::{DiplomacyManager, DiplomacyTurn, TreatyProposal, TreatyResult};
pub use error::CivError;
pub use expansion::{ExpansionManager, ExpansionTurn, TileCandidate, TilePurchase, TileSelection};
pub use modifier::{Modifier, ModifierLedger};
pub use nation::Nation;
pub use policy::{AdoptResult, PolicyDefinition, PolicyManager};
pub use population::{PopulationManager, PopulationTurn};
pub use production::{
    EnqueueRefusal, ProductionItem, ProductionManager, ProductionTurn, RushResult,
};
pub use record::ManagerRecord;
pub use tech::{TechManager, TechTurn};
pub use unit::Unit;
