//! Historical event log for the Annals simulation.
//!
//! Every notable change in a turn produces an immutable
//! [`HistoricalEvent`]. The [`EventLog`] keeps them in append order and
//! maintains three lookup indices: by year, by participating nation, and by
//! map location. Events are never mutated or removed once appended.

use std::collections::BTreeMap;

use annals_types::{EventId, HistoricalEvent, NationId, TileCoord};
use serde::{Deserialize, Serialize};

/// Append-only event store with year, nation, and location indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<HistoricalEvent>", into = "Vec<HistoricalEvent>")]
pub struct EventLog {
    events: Vec<HistoricalEvent>,
    by_year: BTreeMap<i32, Vec<usize>>,
    by_nation: BTreeMap<NationId, Vec<usize>>,
    by_location: BTreeMap<TileCoord, Vec<usize>>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and index it. Returns its id.
    pub fn append(&mut self, event: HistoricalEvent) -> EventId {
        let index = self.events.len();
        let id = event.id;

        self.by_year.entry(event.year).or_default().push(index);
        for nation in event.nation_participants() {
            self.by_nation.entry(nation).or_default().push(index);
        }
        if let Some(location) = event.location {
            self.by_location.entry(location).or_default().push(index);
        }

        tracing::debug!(
            event_id = %id,
            event_type = ?event.event_type,
            year = event.year,
            turn = event.turn_number,
            "Event recorded"
        );
        self.events.push(event);
        id
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All events in append order.
    pub fn all(&self) -> &[HistoricalEvent] {
        &self.events
    }

    /// Events appended at or after position `start`.
    pub fn since(&self, start: usize) -> &[HistoricalEvent] {
        self.events.get(start..).unwrap_or_default()
    }

    /// Look up an event by id.
    pub fn get(&self, id: EventId) -> Option<&HistoricalEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Events dated `year`.
    pub fn in_year(&self, year: i32) -> Vec<&HistoricalEvent> {
        self.resolve(self.by_year.get(&year))
    }

    /// Events dated within `from..=to`.
    pub fn in_years(&self, from: i32, to: i32) -> Vec<&HistoricalEvent> {
        if from > to {
            return Vec::new();
        }
        self.by_year
            .range(from..=to)
            .flat_map(|(_, slots)| slots.iter().filter_map(|i| self.events.get(*i)))
            .collect()
    }

    /// Events in which `nation` participates.
    pub fn for_nation(&self, nation: NationId) -> Vec<&HistoricalEvent> {
        self.resolve(self.by_nation.get(&nation))
    }

    /// Events located at `coord`.
    pub fn at(&self, coord: TileCoord) -> Vec<&HistoricalEvent> {
        self.resolve(self.by_location.get(&coord))
    }

    fn resolve(&self, slots: Option<&Vec<usize>>) -> Vec<&HistoricalEvent> {
        slots
            .map(|slots| slots.iter().filter_map(|i| self.events.get(*i)).collect())
            .unwrap_or_default()
    }
}

impl From<Vec<HistoricalEvent>> for EventLog {
    fn from(events: Vec<HistoricalEvent>) -> Self {
        let mut log = Self::new();
        for event in events {
            log.append(event);
        }
        log
    }
}

impl From<EventLog> for Vec<HistoricalEvent> {
    fn from(log: EventLog) -> Self {
        log.events
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_types::{EntityKind, EventType, ParticipantRole, Significance};

    use super::*;

    fn founded(nation: NationId, year: i32, at: TileCoord) -> HistoricalEvent {
        HistoricalEvent::new(
            EventId::new(),
            EventType::CityFounded,
            year,
            1,
            Significance::Major,
            "A city was founded",
        )
        .with_participant(EntityKind::Nation, nation, "Akkad", ParticipantRole::Founder)
        .at(at)
    }

    #[test]
    fn indexes_by_year_nation_and_location() {
        let akkad = NationId::new();
        let elam = NationId::new();
        let mut log = EventLog::new();
        log.append(founded(akkad, -4000, TileCoord::new(3, 3)));
        log.append(founded(elam, -4000, TileCoord::new(11, 3)));
        let war = HistoricalEvent::new(
            EventId::new(),
            EventType::WarDeclared,
            -3950,
            2,
            Significance::Major,
            "War",
        )
        .with_participant(EntityKind::Nation, akkad, "Akkad", ParticipantRole::Subject)
        .with_participant(EntityKind::Nation, elam, "Elam", ParticipantRole::Target);
        let war_id = log.append(war);

        assert_eq!(log.len(), 3);
        assert_eq!(log.in_year(-4000).len(), 2);
        assert_eq!(log.in_year(-3950).len(), 1);
        assert!(log.in_year(0).is_empty());
        assert_eq!(log.for_nation(akkad).len(), 2);
        assert_eq!(log.for_nation(elam).len(), 2);
        assert_eq!(log.at(TileCoord::new(11, 3)).len(), 1);
        assert!(log.at(TileCoord::new(0, 0)).is_empty());
        assert_eq!(log.get(war_id).unwrap().event_type, EventType::WarDeclared);
        assert_eq!(log.in_years(-4000, -3900).len(), 3);
        assert_eq!(log.since(2).len(), 1);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn duplicate_participant_indexed_once() {
        let akkad = NationId::new();
        let mut log = EventLog::new();
        let event = founded(akkad, 1, TileCoord::new(0, 0)).with_participant(
            EntityKind::Nation,
            akkad,
            "Akkad",
            ParticipantRole::Owner,
        );
        log.append(event);
        assert_eq!(log.for_nation(akkad).len(), 1);
    }

    #[test]
    fn serializes_as_plain_list_and_rebuilds_indices() {
        let akkad = NationId::new();
        let mut log = EventLog::new();
        log.append(founded(akkad, 10, TileCoord::new(1, 1)));
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
        let restored: EventLog = serde_json::from_value(json).unwrap();
        assert_eq!(restored.for_nation(akkad).len(), 1);
        assert_eq!(restored.at(TileCoord::new(1, 1)).len(), 1);
    }
}
