//! Named, source-keyed adjustments.
//!
//! A [`ModifierLedger`] holds at most one [`Modifier`] per source string.
//! Setting a modifier replaces any existing one from the same source, and
//! setting a value of zero removes it. The effective total is the sum of
//! all active values. Decaying modifiers move toward zero by their rate each
//! time [`ModifierLedger::decay`] runs and are pruned once they reach zero.
//!
//! The same ledger type backs flat adjustments (food per turn, opinion) and
//! percentage adjustments (growth %, production %, cost %); the caller
//! decides how the total is interpreted.

use serde::{Deserialize, Serialize};

/// Values closer to zero than this are treated as zero.
const ZERO_EPSILON: f64 = 1e-9;

/// A single adjustment from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Unique key within the owning ledger.
    pub source: String,
    /// Current value.
    pub value: f64,
    /// Amount the value moves toward zero per decay step, if any.
    #[serde(default)]
    pub decay: Option<f64>,
}

impl Modifier {
    /// Whether this modifier decays over time.
    pub fn is_decaying(&self) -> bool {
        self.decay.is_some_and(|rate| rate.abs() > ZERO_EPSILON)
    }
}

fn is_zero(value: f64) -> bool {
    value.abs() < ZERO_EPSILON
}

/// An ordered set of modifiers keyed by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModifierLedger {
    /// Active modifiers in insertion order.
    modifiers: Vec<Modifier>,
}

impl ModifierLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            modifiers: Vec::new(),
        }
    }

    /// Set a non-decaying modifier. Zero removes the source.
    pub fn set(&mut self, source: impl Into<String>, value: f64) {
        self.upsert(source.into(), value, None);
    }

    /// Set a modifier that decays toward zero by `rate` per step.
    pub fn set_decaying(&mut self, source: impl Into<String>, value: f64, rate: f64) {
        self.upsert(source.into(), value, Some(rate.abs()));
    }

    fn upsert(&mut self, source: String, value: f64, decay: Option<f64>) {
        if is_zero(value) {
            self.remove(&source);
            return;
        }
        if let Some(existing) = self.modifiers.iter_mut().find(|m| m.source == source) {
            existing.value = value;
            existing.decay = decay;
        } else {
            self.modifiers.push(Modifier {
                source,
                value,
                decay,
            });
        }
    }

    /// Remove the modifier from `source`, returning it.
    pub fn remove(&mut self, source: &str) -> Option<Modifier> {
        let idx = self.modifiers.iter().position(|m| m.source == source)?;
        Some(self.modifiers.remove(idx))
    }

    /// Look up the modifier from `source`.
    pub fn get(&self, source: &str) -> Option<&Modifier> {
        self.modifiers.iter().find(|m| m.source == source)
    }

    /// Whether a modifier from `source` is active.
    pub fn contains(&self, source: &str) -> bool {
        self.get(source).is_some()
    }

    /// Sum of all active values.
    pub fn total(&self) -> f64 {
        self.modifiers.iter().map(|m| m.value).sum()
    }

    /// Number of active modifiers.
    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Iterate over active modifiers in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Move every decaying modifier toward zero by its rate, never crossing
    /// zero. Returns the sources pruned this step.
    pub fn decay(&mut self) -> Vec<String> {
        for modifier in &mut self.modifiers {
            let Some(rate) = modifier.decay else {
                continue;
            };
            modifier.value = if modifier.value > 0.0 {
                (modifier.value - rate).max(0.0)
            } else {
                (modifier.value + rate).min(0.0)
            };
        }
        let mut pruned = Vec::new();
        self.modifiers.retain(|m| {
            if is_zero(m.value) {
                pruned.push(m.source.clone());
                false
            } else {
                true
            }
        });
        pruned
    }
}
