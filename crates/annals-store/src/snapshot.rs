//! Full-state autosave snapshots.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::StoredEntity;
use crate::error::StoreError;

/// Every record of a world at the end of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Turn the snapshot was taken after.
    pub turn: u32,
    /// Year at that turn.
    pub year: i32,
    /// Wall-clock time of the save.
    pub saved_at: DateTime<Utc>,
    /// Records in key order.
    pub entities: Vec<StoredEntity>,
}

impl Snapshot {
    /// Take a snapshot stamped with the current time.
    pub fn new(turn: u32, year: i32, entities: Vec<StoredEntity>) -> Self {
        Self {
            turn,
            year,
            saved_at: Utc::now(),
            entities,
        }
    }
}

/// File name used for the autosave of `turn`.
pub fn snapshot_file_name(turn: u32) -> String {
    format!("autosave_turn_{turn:05}.json")
}

/// Write `snapshot` into `dir`, creating it if needed. Returns the path.
///
/// # Errors
///
/// Returns [`StoreError`] if the directory or file cannot be written.
pub fn save_snapshot(dir: &Path, snapshot: &Snapshot) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(snapshot_file_name(snapshot.turn));
    std::fs::write(&path, serde_json::to_string(snapshot)?)?;
    tracing::info!(
        turn = snapshot.turn,
        entities = snapshot.entities.len(),
        path = %path.display(),
        "Autosave written"
    );
    Ok(path)
}

/// Read a snapshot written by [`save_snapshot`].
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use annals_civ::Nation;
    use annals_types::{CultureTraits, NationId, WorldId};

    use super::*;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let nation = Nation::new(NationId::new(), "Elam", CultureTraits::default(), WorldId::new());
        let snapshot = Snapshot::new(10, -3500, vec![nation.into()]);
        let path = save_snapshot(dir.path(), &snapshot).unwrap();
        assert!(path.ends_with("autosave_turn_00010.json"));
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }
}
