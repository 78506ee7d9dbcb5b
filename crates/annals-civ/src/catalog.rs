//! Rule catalogs: technologies, policies, and production items.
//!
//! The catalogs are static tables. Managers store only ids, so the tables
//! can change without invalidating saved records.

use std::collections::BTreeSet;

use annals_types::{Era, ProductionKind, Yields};

use crate::error::CivError;
use crate::policy::{PolicyDefinition, PolicyManager};
use crate::production::{ProductionItem, ProductionManager};

/// Catalog id of the settler unit.
pub const SETTLER: &str = "settler";

// ---------------------------------------------------------------------------
// Technologies
// ---------------------------------------------------------------------------

/// One technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TechDefinition {
    /// Unique id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Era the technology belongs to.
    pub era: Era,
    /// Base research cost.
    pub cost: u32,
    /// Technologies that must be researched first.
    pub prerequisites: &'static [&'static str],
}

const fn tech(
    id: &'static str,
    name: &'static str,
    era: Era,
    cost: u32,
    prerequisites: &'static [&'static str],
) -> TechDefinition {
    TechDefinition {
        id,
        name,
        era,
        cost,
        prerequisites,
    }
}

const STANDARD_TECHS: &[TechDefinition] = &[
    tech("agriculture", "Agriculture", Era::Ancient, 20, &[]),
    tech("pottery", "Pottery", Era::Ancient, 35, &["agriculture"]),
    tech("animal_husbandry", "Animal Husbandry", Era::Ancient, 35, &["agriculture"]),
    tech("mining", "Mining", Era::Ancient, 35, &["agriculture"]),
    tech("writing", "Writing", Era::Ancient, 55, &["pottery"]),
    tech("bronze_working", "Bronze Working", Era::Ancient, 55, &["mining"]),
    tech("the_wheel", "The Wheel", Era::Ancient, 55, &["animal_husbandry"]),
    tech("philosophy", "Philosophy", Era::Classical, 175, &["writing"]),
    tech("currency", "Currency", Era::Classical, 105, &["bronze_working"]),
    tech("mathematics", "Mathematics", Era::Classical, 105, &["the_wheel"]),
    tech("iron_working", "Iron Working", Era::Classical, 105, &["bronze_working"]),
    tech("civil_service", "Civil Service", Era::Medieval, 400, &["philosophy", "currency"]),
    tech("education", "Education", Era::Medieval, 485, &["civil_service"]),
    tech("astronomy", "Astronomy", Era::Renaissance, 780, &["education", "mathematics"]),
    tech("printing_press", "Printing Press", Era::Renaissance, 780, &["education"]),
    tech("steam_power", "Steam Power", Era::Industrial, 1680, &["printing_press"]),
    tech("electricity", "Electricity", Era::Modern, 2500, &["steam_power", "astronomy"]),
];

/// The technology tree.
#[derive(Debug, Clone)]
pub struct TechTree {
    techs: &'static [TechDefinition],
}

impl Default for TechTree {
    fn default() -> Self {
        Self::standard()
    }
}

impl TechTree {
    /// The built-in tree.
    pub const fn standard() -> Self {
        Self {
            techs: STANDARD_TECHS,
        }
    }

    /// Look up a technology.
    pub fn get(&self, id: &str) -> Option<&TechDefinition> {
        self.techs.iter().find(|t| t.id == id)
    }

    /// Look up a technology, failing for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`CivError::UnknownTech`] when `id` is not in the tree.
    pub fn require(&self, id: &str) -> Result<&TechDefinition, CivError> {
        self.get(id)
            .ok_or_else(|| CivError::UnknownTech(id.to_owned()))
    }

    /// Every technology in tree order.
    pub fn iter(&self) -> impl Iterator<Item = &TechDefinition> {
        self.techs.iter()
    }

    /// Unresearched technologies whose prerequisites are all researched.
    pub fn available(&self, researched: &BTreeSet<String>) -> Vec<&TechDefinition> {
        self.techs
            .iter()
            .filter(|t| !researched.contains(t.id))
            .filter(|t| t.prerequisites.iter().all(|p| researched.contains(*p)))
            .collect()
    }

    /// Cheapest available technology; earlier in the tree wins ties.
    pub fn cheapest_available(&self, researched: &BTreeSet<String>) -> Option<&TechDefinition> {
        self.available(researched)
            .into_iter()
            .fold(None, |best: Option<&TechDefinition>, t| match best {
                Some(b) if b.cost <= t.cost => Some(b),
                _ => Some(t),
            })
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

const STANDARD_POLICIES: &[(&str, &str, &str, &[&str])] = &[
    ("tradition", "aristocracy", "Aristocracy", &[]),
    ("tradition", "oligarchy", "Oligarchy", &[]),
    ("tradition", "legalism", "Legalism", &["aristocracy"]),
    ("tradition", "landed_elite", "Landed Elite", &["legalism"]),
    ("tradition", "monarchy", "Monarchy", &["legalism"]),
    ("liberty", "collective_rule", "Collective Rule", &[]),
    ("liberty", "citizenship", "Citizenship", &[]),
    ("liberty", "republic", "Republic", &["collective_rule"]),
    ("liberty", "representation", "Representation", &["citizenship"]),
    ("piety", "organized_religion", "Organized Religion", &[]),
    ("piety", "mandate_of_heaven", "Mandate of Heaven", &["organized_religion"]),
    ("piety", "theocracy", "Theocracy", &["organized_religion"]),
];

/// Policy trees and their policies.
#[derive(Debug, Clone)]
pub struct PolicyCatalog {
    policies: Vec<PolicyDefinition>,
}

impl Default for PolicyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl PolicyCatalog {
    /// The built-in trees: tradition, liberty, piety.
    pub fn standard() -> Self {
        let policies = STANDARD_POLICIES
            .iter()
            .map(|(tree, id, name, prereqs)| PolicyDefinition {
                id: (*id).to_owned(),
                name: (*name).to_owned(),
                tree: (*tree).to_owned(),
                prerequisites: prereqs.iter().map(|p| (*p).to_owned()).collect(),
            })
            .collect();
        Self { policies }
    }

    /// Look up a policy.
    pub fn get(&self, id: &str) -> Option<&PolicyDefinition> {
        self.policies.iter().find(|p| p.id == id)
    }

    /// Look up a policy, failing for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns [`CivError::UnknownPolicy`] when `id` is not in the catalog.
    pub fn require(&self, id: &str) -> Result<&PolicyDefinition, CivError> {
        self.get(id)
            .ok_or_else(|| CivError::UnknownPolicy(id.to_owned()))
    }

    /// Policies belonging to `tree`.
    pub fn tree<'a>(&'a self, tree: &'a str) -> impl Iterator<Item = &'a PolicyDefinition> {
        self.policies.iter().filter(move |p| p.tree == tree)
    }

    /// Whether every policy of `tree` is unlocked in `manager`.
    pub fn tree_fully_unlocked(&self, tree: &str, manager: &PolicyManager) -> bool {
        let mut policies = self.tree(tree).peekable();
        policies.peek().is_some() && policies.all(|p| manager.is_unlocked(&p.id))
    }

    /// First policy in catalog order whose prerequisites are met.
    pub fn next_adoptable(&self, manager: &PolicyManager) -> Option<&PolicyDefinition> {
        self.policies.iter().find(|p| manager.prerequisites_met(p))
    }
}

// ---------------------------------------------------------------------------
// Buildings, wonders, units
// ---------------------------------------------------------------------------

/// One producible item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildingDefinition {
    /// Unique id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Building, wonder, unit, or project.
    pub kind: ProductionKind,
    /// Production cost.
    pub cost: u32,
    /// Yields added to the city once built.
    pub yields: Yields,
    /// Technology needed to build it.
    pub required_tech: Option<&'static str>,
}

const fn bonus(
    food: u32,
    production: u32,
    gold: u32,
    science: u32,
    culture: u32,
    faith: u32,
) -> Yields {
    Yields {
        food,
        production,
        gold,
        science,
        culture,
        faith,
    }
}

const NO_YIELDS: Yields = bonus(0, 0, 0, 0, 0, 0);

const fn entry(
    id: &'static str,
    name: &'static str,
    kind: ProductionKind,
    cost: u32,
    yields: Yields,
    required_tech: Option<&'static str>,
) -> BuildingDefinition {
    BuildingDefinition {
        id,
        name,
        kind,
        cost,
        yields,
        required_tech,
    }
}

const BUILDING: ProductionKind = ProductionKind::Building;
const WONDER: ProductionKind = ProductionKind::Wonder;
const UNIT: ProductionKind = ProductionKind::Unit;

const STANDARD_ITEMS: &[BuildingDefinition] = &[
    entry("monument", "Monument", BUILDING, 40, bonus(0, 0, 0, 0, 2, 0), None),
    entry("shrine", "Shrine", BUILDING, 40, bonus(0, 0, 0, 0, 0, 1), None),
    entry("granary", "Granary", BUILDING, 60, bonus(2, 0, 0, 0, 0, 0), Some("pottery")),
    entry("library", "Library", BUILDING, 75, bonus(0, 0, 0, 2, 0, 0), Some("writing")),
    entry("workshop", "Workshop", BUILDING, 100, bonus(0, 2, 0, 0, 0, 0), Some("mining")),
    entry("market", "Market", BUILDING, 100, bonus(0, 0, 2, 0, 0, 0), Some("currency")),
    entry("pyramids", "Pyramids", WONDER, 185, bonus(0, 2, 0, 0, 1, 0), Some("bronze_working")),
    entry("great_library", "Great Library", WONDER, 185, bonus(0, 0, 0, 3, 1, 0), Some("writing")),
    entry("stonehenge", "Stonehenge", WONDER, 185, bonus(0, 0, 0, 0, 1, 3), Some("mining")),
    entry(SETTLER, "Settler", UNIT, 60, NO_YIELDS, None),
    entry("warrior", "Warrior", UNIT, 40, NO_YIELDS, None),
    entry("worker", "Worker", UNIT, 50, NO_YIELDS, None),
];

/// Producible items.
#[derive(Debug, Clone)]
pub struct BuildingCatalog {
    items: &'static [BuildingDefinition],
}

impl Default for BuildingCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl BuildingCatalog {
    /// The built-in items.
    pub const fn standard() -> Self {
        Self {
            items: STANDARD_ITEMS,
        }
    }

    /// Look up an item.
    pub fn get(&self, id: &str) -> Option<&BuildingDefinition> {
        self.items.iter().find(|b| b.id == id)
    }

    /// Queue entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CivError::UnknownItem`] when `id` is not in the catalog.
    pub fn item(&self, id: &str) -> Result<ProductionItem, CivError> {
        self.get(id)
            .map(|b| ProductionItem::new(b.kind, b.id, b.name, b.cost))
            .ok_or_else(|| CivError::UnknownItem(id.to_owned()))
    }

    /// Sum of the yield bonuses of everything `production` has built.
    pub fn built_yields(&self, production: &ProductionManager) -> Yields {
        let mut total = Yields::default();
        for id in production.buildings().chain(production.wonders()) {
            if let Some(def) = self.get(id) {
                total.accumulate(&def.yields);
            }
        }
        total
    }

    /// First building or wonder in catalog order that the city has not
    /// built or queued and whose technology is researched.
    pub fn next_building(
        &self,
        researched: &BTreeSet<String>,
        production: &ProductionManager,
    ) -> Option<&BuildingDefinition> {
        self.items.iter().find(|b| {
            matches!(b.kind, ProductionKind::Building | ProductionKind::Wonder)
                && b.required_tech.is_none_or(|t| researched.contains(t))
                && !production.has_building(b.id)
                && !production.has_wonder(b.id)
                && !production.queue().any(|q| q.id == b.id)
        })
    }
}
