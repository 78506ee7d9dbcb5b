//! Persistence records for manager state.
//!
//! Every manager serializes to a plain JSON record and restores from one.
//! All manager structs carry `#[serde(default)]`, so any missing field falls
//! back to that manager's own default. Derived values (costs, thresholds) are
//! never stored; they are recomputed from the stored counters, which keeps a
//! round trip exact. [`ManagerRecord::normalize`] re-establishes invariants
//! that a hand-written or partial record could violate.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CivError;

/// Serialize/deserialize pair for a manager.
pub trait ManagerRecord: Serialize + DeserializeOwned + Default {
    /// Re-establish invariants after loading. The default does nothing.
    fn normalize(&mut self) {}

    /// Encode the manager as a JSON record.
    ///
    /// # Errors
    ///
    /// Returns [`CivError::Record`] if serialization fails.
    fn to_record(&self) -> Result<serde_json::Value, CivError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode a manager from a JSON record. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CivError::Record`] if a present field has the wrong shape.
    fn from_record(record: &serde_json::Value) -> Result<Self, CivError> {
        let mut manager: Self = serde_json::from_value(record.clone())?;
        manager.normalize();
        Ok(manager)
    }
}
