//! Historical event records.
//!
//! Events are immutable once created. The engine builds them with
//! [`HistoricalEvent::new`] and the builder methods, then hands them to the
//! event log and the entity store. Nothing mutates an event after that.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{EntityKind, EventType, ParticipantRole, Significance};
use crate::ids::{EventId, NationId};
use crate::structs::TileCoord;

/// One entity taking part in an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Kind of the participating entity.
    pub entity_type: EntityKind,
    /// Stable id of the entity, as a string.
    pub entity_id: String,
    /// Display name at the time of the event.
    pub entity_name: String,
    /// Role in the event.
    pub role: ParticipantRole,
}

/// An immutable entry in the chronicle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoricalEvent {
    /// Unique event id.
    pub id: EventId,
    /// What happened.
    pub event_type: EventType,
    /// In-world year.
    pub year: i32,
    /// Turn number.
    pub turn_number: u32,
    /// How much it matters.
    pub significance: Significance,
    /// Participants in order of mention.
    pub participants: Vec<Participant>,
    /// Tile where the event took place, if any.
    pub location: Option<TileCoord>,
    /// Human-readable summary.
    pub description: String,
}

impl HistoricalEvent {
    /// Start a new event with no participants and no location.
    pub fn new(
        id: EventId,
        event_type: EventType,
        year: i32,
        turn_number: u32,
        significance: Significance,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            event_type,
            year,
            turn_number,
            significance,
            participants: Vec::new(),
            location: None,
            description: description.into(),
        }
    }

    /// Append a participant.
    #[must_use]
    pub fn with_participant(
        mut self,
        entity_type: EntityKind,
        entity_id: impl ToString,
        entity_name: impl Into<String>,
        role: ParticipantRole,
    ) -> Self {
        self.participants.push(Participant {
            entity_type,
            entity_id: entity_id.to_string(),
            entity_name: entity_name.into(),
            role,
        });
        self
    }

    /// Attach the map location.
    #[must_use]
    pub const fn at(mut self, location: TileCoord) -> Self {
        self.location = Some(location);
        self
    }

    /// Nation ids among the participants, in order, without duplicates.
    pub fn nation_participants(&self) -> Vec<NationId> {
        let mut out: Vec<NationId> = Vec::new();
        for p in &self.participants {
            if p.entity_type != EntityKind::Nation {
                continue;
            }
            let Ok(uuid) = uuid::Uuid::parse_str(&p.entity_id) else {
                continue;
            };
            let id = NationId::from(uuid);
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_participants_in_order() {
        let nation = NationId::new();
        let event = HistoricalEvent::new(
            EventId::new(),
            EventType::CityFounded,
            -4000,
            1,
            Significance::Major,
            "Rome founded",
        )
        .with_participant(EntityKind::City, "c1", "Rome", ParticipantRole::Subject)
        .with_participant(EntityKind::Nation, nation, "Romans", ParticipantRole::Founder)
        .at(TileCoord::new(3, 4));

        assert_eq!(event.participants.len(), 2);
        assert_eq!(event.participants[0].entity_name, "Rome");
        assert_eq!(event.location, Some(TileCoord::new(3, 4)));
        assert_eq!(event.nation_participants(), vec![nation]);
    }
}
