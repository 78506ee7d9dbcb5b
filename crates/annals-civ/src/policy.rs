//! Social policies bought with culture.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::formula;
use crate::modifier::ModifierLedger;
use crate::record::ManagerRecord;

/// A policy as listed in a policy tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDefinition {
    /// Unique policy id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Tree the policy belongs to.
    pub tree: String,
    /// Policies that must be unlocked first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// Outcome of an adoption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoptResult {
    /// Whether the policy was unlocked.
    pub adopted: bool,
    /// Whether a free-policy token paid for it.
    pub used_free_policy: bool,
    /// Culture taken from the bank.
    pub culture_spent: u32,
    /// Human-readable summary.
    pub description: String,
}

impl AdoptResult {
    fn refused(description: String) -> Self {
        Self {
            adopted: false,
            used_free_policy: false,
            culture_spent: 0,
            description,
        }
    }
}

/// Policy state for one nation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyManager {
    culture_stored: u32,
    policies_adopted: u32,
    unlocked: BTreeSet<String>,
    adopted_trees: BTreeSet<String>,
    completed_trees: BTreeSet<String>,
    free_policies: u32,
    /// Culture percentage modifiers.
    culture_modifiers: ModifierLedger,
    /// Policy cost percentage modifiers.
    cost_modifiers: ModifierLedger,
}

impl PolicyManager {
    /// No policies, empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Culture in the bank.
    pub const fn culture_stored(&self) -> u32 {
        self.culture_stored
    }

    /// Number of policies adopted so far.
    pub const fn policies_adopted(&self) -> u32 {
        self.policies_adopted
    }

    /// Unspent free-policy tokens.
    pub const fn free_policies(&self) -> u32 {
        self.free_policies
    }

    /// Whether `policy` is unlocked.
    pub fn is_unlocked(&self, policy: &str) -> bool {
        self.unlocked.contains(policy)
    }

    /// Whether any policy from `tree` has been adopted.
    pub fn has_adopted_tree(&self, tree: &str) -> bool {
        self.adopted_trees.contains(tree)
    }

    /// Whether `tree` was marked complete.
    pub fn is_tree_complete(&self, tree: &str) -> bool {
        self.completed_trees.contains(tree)
    }

    /// Unlocked policies in id order.
    pub fn unlocked(&self) -> impl Iterator<Item = &str> {
        self.unlocked.iter().map(String::as_str)
    }

    /// Set or clear a culture-percentage modifier.
    pub fn set_culture_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.culture_modifiers.set(source, percent);
    }

    /// Set or clear a policy-cost percentage modifier.
    pub fn set_cost_modifier(&mut self, source: impl Into<String>, percent: f64) {
        self.cost_modifiers.set(source, percent);
    }

    /// Culture needed for the next policy.
    pub fn next_cost(&self) -> u32 {
        formula::policy_cost(self.policies_adopted, self.cost_modifiers.total())
    }

    /// Bank one turn of culture. Returns the amount banked after modifiers.
    pub fn process_turn(&mut self, culture: u32) -> u32 {
        let gained = formula::scaled_floor(culture, self.culture_modifiers.total());
        self.culture_stored = self.culture_stored.saturating_add(gained);
        gained
    }

    /// Add a free-policy token.
    pub const fn grant_free_policy(&mut self) {
        self.free_policies = self.free_policies.saturating_add(1);
    }

    /// Whether `policy` could be adopted now, ignoring cost.
    pub fn prerequisites_met(&self, policy: &PolicyDefinition) -> bool {
        !self.is_unlocked(&policy.id)
            && policy
                .prerequisites
                .iter()
                .all(|prereq| self.is_unlocked(prereq))
    }

    /// Whether `policy` could be adopted now, cost included.
    pub fn can_adopt(&self, policy: &PolicyDefinition) -> bool {
        self.prerequisites_met(policy)
            && (self.free_policies > 0 || self.culture_stored >= self.next_cost())
    }

    /// Adopt `policy`, spending a free-policy token if one is available and
    /// culture otherwise.
    pub fn adopt(&mut self, policy: &PolicyDefinition) -> AdoptResult {
        if self.is_unlocked(&policy.id) {
            return AdoptResult::refused(format!("{} is already adopted", policy.name));
        }
        if let Some(missing) = policy
            .prerequisites
            .iter()
            .find(|prereq| !self.is_unlocked(prereq))
        {
            return AdoptResult::refused(format!("{} requires {missing}", policy.name));
        }

        let (used_free_policy, culture_spent) = if self.free_policies > 0 {
            self.free_policies = self.free_policies.saturating_sub(1);
            (true, 0)
        } else {
            let cost = self.next_cost();
            if self.culture_stored < cost {
                return AdoptResult::refused(format!(
                    "{} needs {cost} culture, have {}",
                    policy.name, self.culture_stored
                ));
            }
            self.culture_stored = self.culture_stored.saturating_sub(cost);
            (false, cost)
        };

        self.unlocked.insert(policy.id.clone());
        self.adopted_trees.insert(policy.tree.clone());
        self.policies_adopted = self.policies_adopted.saturating_add(1);
        AdoptResult {
            adopted: true,
            used_free_policy,
            culture_spent,
            description: format!("Adopted {}", policy.name),
        }
    }

    /// Mark `tree` complete. Returns false if it already was.
    pub fn complete_tree(&mut self, tree: impl Into<String>) -> bool {
        self.completed_trees.insert(tree.into())
    }
}

impl ManagerRecord for PolicyManager {}
