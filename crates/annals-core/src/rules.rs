//! Rule catalogs shared by the engine and the AI.

use annals_civ::{BuildingCatalog, PolicyCatalog, TechTree};

/// Technologies, policies, and producible items of one ruleset.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    /// Technology tree.
    pub techs: TechTree,
    /// Policy trees.
    pub policies: PolicyCatalog,
    /// Buildings, wonders, and units.
    pub buildings: BuildingCatalog,
}

impl Rules {
    /// The built-in ruleset.
    pub fn standard() -> Self {
        Self {
            techs: TechTree::standard(),
            policies: PolicyCatalog::standard(),
            buildings: BuildingCatalog::standard(),
        }
    }
}
