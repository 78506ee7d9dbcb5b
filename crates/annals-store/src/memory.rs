//! The working entity store the engine reads and writes during a turn.

use std::collections::BTreeMap;

use annals_civ::{City, Nation, Unit};
use annals_types::{CityId, NationId, UnitId};

use crate::entity::{StoredEntity, city_key, nation_key, unit_key};

/// Synchronous, last-write-wins key-value store of entity records.
///
/// Implementations assume a single writer. The typed helpers are provided
/// on top of the five primitive operations.
pub trait EntityStore: Send {
    /// Read the record at `key`.
    fn get(&self, key: &str) -> Option<StoredEntity>;

    /// Write `entity` at `key`, replacing any previous record.
    fn set(&mut self, key: String, entity: StoredEntity);

    /// Remove the record at `key`. Returns whether one existed.
    fn delete(&mut self, key: &str) -> bool;

    /// Whether a record exists at `key`.
    fn has(&self, key: &str) -> bool;

    /// Every key, in key order.
    fn all_ids(&self) -> Vec<String>;

    /// Store a record under its own key.
    fn put(&mut self, entity: StoredEntity) {
        self.set(entity.key(), entity);
    }

    /// Read a nation. Records of another kind read as absent.
    fn nation(&self, id: NationId) -> Option<Nation> {
        match self.get(&nation_key(id))? {
            StoredEntity::Nation(nation) => Some(nation),
            StoredEntity::City(_) | StoredEntity::Unit(_) | StoredEntity::Event(_) => None,
        }
    }

    /// Read a city. Records of another kind read as absent.
    fn city(&self, id: CityId) -> Option<City> {
        match self.get(&city_key(id))? {
            StoredEntity::City(city) => Some(city),
            StoredEntity::Nation(_) | StoredEntity::Unit(_) | StoredEntity::Event(_) => None,
        }
    }

    /// Read a unit. Records of another kind read as absent.
    fn unit(&self, id: UnitId) -> Option<Unit> {
        match self.get(&unit_key(id))? {
            StoredEntity::Unit(unit) => Some(unit),
            StoredEntity::Nation(_) | StoredEntity::City(_) | StoredEntity::Event(_) => None,
        }
    }

    /// Every city record, in key order.
    fn cities(&self) -> Vec<City> {
        self.all_ids()
            .iter()
            .filter_map(|key| match self.get(key) {
                Some(StoredEntity::City(city)) => Some(city),
                _ => None,
            })
            .collect()
    }

    /// Every unit record, in key order.
    fn units(&self) -> Vec<Unit> {
        self.all_ids()
            .iter()
            .filter_map(|key| match self.get(key) {
                Some(StoredEntity::Unit(unit)) => Some(unit),
                _ => None,
            })
            .collect()
    }
}

/// [`EntityStore`] backed by an ordered map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: BTreeMap<String, StoredEntity>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every record, in key order.
    pub fn snapshot(&self) -> Vec<StoredEntity> {
        self.entries.values().cloned().collect()
    }
}

impl FromIterator<StoredEntity> for InMemoryStore {
    fn from_iter<I: IntoIterator<Item = StoredEntity>>(iter: I) -> Self {
        let mut store = Self::new();
        for entity in iter {
            store.put(entity);
        }
        store
    }
}

impl EntityStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<StoredEntity> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: String, entity: StoredEntity) {
        self.entries.insert(key, entity);
    }

    fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn all_ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_types::{CultureTraits, TileCoord, WorldId};

    use super::*;

    #[test]
    fn last_write_wins() {
        let mut store = InMemoryStore::new();
        let mut nation = Nation::new(
            NationId::new(),
            "Akkad",
            CultureTraits::default(),
            WorldId::new(),
        );
        store.put(nation.clone().into());
        nation.resources.gold = 99;
        store.put(nation.clone().into());
        assert_eq!(store.len(), 1);
        assert_eq!(store.nation(nation.id).unwrap().resources.gold, 99);
    }

    #[test]
    fn missing_and_mismatched_read_as_absent() {
        let mut store = InMemoryStore::new();
        let unit = Unit::new(UnitId::new(), NationId::new(), "settler", TileCoord::new(0, 0));
        assert!(store.unit(unit.id).is_none());
        // A unit stored under a nation key does not read as a nation.
        let nation_id = NationId::from(unit.id.into_inner());
        store.set(nation_key(nation_id), unit.clone().into());
        assert!(store.nation(nation_id).is_none());
        assert!(store.has(&nation_key(nation_id)));
        assert!(store.delete(&nation_key(nation_id)));
        assert!(!store.delete(&nation_key(nation_id)));
    }

    #[test]
    fn lists_by_kind_in_key_order() {
        let owner = NationId::new();
        let world = WorldId::new();
        let entities: [StoredEntity; 3] = [
            City::new(CityId::new(), "Ur", owner, TileCoord::new(0, 0), 0, world).into(),
            City::new(CityId::new(), "Uruk", owner, TileCoord::new(5, 0), 0, world).into(),
            Unit::new(UnitId::new(), owner, "settler", TileCoord::new(2, 2)).into(),
        ];
        let store: InMemoryStore = entities.into_iter().collect();
        assert_eq!(store.cities().len(), 2);
        assert_eq!(store.units().len(), 1);
        let ids = store.all_ids();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
