//! Tagged entity records and their key scheme.
//!
//! Every record carries an explicit `kind` discriminator, so loading a record
//! is one exhaustive match instead of probing for fields.
//!
//! # Key Patterns
//!
//! | Pattern | Record |
//! |---------|--------|
//! | `nation:{uuid}` | [`Nation`] |
//! | `city:{uuid}` | [`City`] |
//! | `unit:{uuid}` | [`Unit`] |
//! | `event:{uuid}` | [`HistoricalEvent`] |

use annals_civ::{City, Nation, Unit};
use annals_types::{CityId, EntityKind, EventId, HistoricalEvent, NationId, UnitId};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A stored record of one of the four entity kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StoredEntity {
    /// A nation.
    Nation(Nation),
    /// A city.
    City(City),
    /// A unit.
    Unit(Unit),
    /// A historical event.
    Event(HistoricalEvent),
}

impl StoredEntity {
    /// Discriminator of this record.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Nation(_) => EntityKind::Nation,
            Self::City(_) => EntityKind::City,
            Self::Unit(_) => EntityKind::Unit,
            Self::Event(_) => EntityKind::Event,
        }
    }

    /// Store key of this record.
    pub fn key(&self) -> String {
        match self {
            Self::Nation(n) => nation_key(n.id),
            Self::City(c) => city_key(c.id),
            Self::Unit(u) => unit_key(u.id),
            Self::Event(e) => event_key(e.id),
        }
    }
}

impl From<Nation> for StoredEntity {
    fn from(nation: Nation) -> Self {
        Self::Nation(nation)
    }
}

impl From<City> for StoredEntity {
    fn from(city: City) -> Self {
        Self::City(city)
    }
}

impl From<Unit> for StoredEntity {
    fn from(unit: Unit) -> Self {
        Self::Unit(unit)
    }
}

impl From<HistoricalEvent> for StoredEntity {
    fn from(event: HistoricalEvent) -> Self {
        Self::Event(event)
    }
}

/// `nation:{uuid}`
pub fn nation_key(id: NationId) -> String {
    format!("{}:{id}", EntityKind::Nation.key_prefix())
}

/// `city:{uuid}`
pub fn city_key(id: CityId) -> String {
    format!("{}:{id}", EntityKind::City.key_prefix())
}

/// `unit:{uuid}`
pub fn unit_key(id: UnitId) -> String {
    format!("{}:{id}", EntityKind::Unit.key_prefix())
}

/// `event:{uuid}`
pub fn event_key(id: EventId) -> String {
    format!("{}:{id}", EntityKind::Event.key_prefix())
}

/// Split a key into its kind and id part.
///
/// # Errors
///
/// Returns [`StoreError::MalformedKey`] for unknown prefixes or a missing
/// separator.
pub fn parse_key(key: &str) -> Result<(EntityKind, &str), StoreError> {
    let (prefix, id) = key
        .split_once(':')
        .ok_or_else(|| StoreError::MalformedKey(key.to_owned()))?;
    let kind = [
        EntityKind::Nation,
        EntityKind::City,
        EntityKind::Unit,
        EntityKind::Event,
    ]
    .into_iter()
    .find(|k| k.key_prefix() == prefix)
    .ok_or_else(|| StoreError::MalformedKey(key.to_owned()))?;
    if id.is_empty() {
        return Err(StoreError::MalformedKey(key.to_owned()));
    }
    Ok((kind, id))
}
