//! Default starting map for the Annals simulation.
//!
//! A fixed 16x10 continent ringed by coast and ocean, with a central
//! mountain spine, two river valleys, and a handful of resources. The
//! layout is hand-authored; map generation is not part of this crate.

use annals_types::{ResourceClass, TerrainKind, TileCoord};

use crate::error::WorldError;
use crate::map::GridMap;
use crate::tile::{TileRecord, TileResource};

/// Row-major terrain template. Lowercase glyphs carry a river.
const TEMPLATE: &[&str] = &[
    "OOOOOOOOOOOOOOOO",
    "OCCCCCCCCCCCCCCO",
    "OCGGPPFFHHPPGGCO",
    "OCGgPPFMMHPpGGCO",
    "OCPgGGFM^HPpPPCO",
    "OCPgGGHHFFGpGDCO",
    "OCTTPPWWFFGGDDCO",
    "OCSS*TPPHHPPDDCO",
    "OCCCCCCCCCCCCCCO",
    "OOOOOOOOOOOOOOOO",
];

/// Resources placed on the template: `(x, y, class, name)`.
const RESOURCES: &[(i32, i32, ResourceClass, &str)] = &[
    (5, 2, ResourceClass::Bonus, "wheat"),
    (8, 2, ResourceClass::Strategic, "iron"),
    (12, 5, ResourceClass::Luxury, "silk"),
    (6, 4, ResourceClass::Bonus, "deer"),
    (13, 6, ResourceClass::Luxury, "gems"),
    (2, 5, ResourceClass::Strategic, "horses"),
    (1, 3, ResourceClass::Bonus, "fish"),
];

/// Starting positions for up to three nations, in assignment order.
const STARTING_POSITIONS: &[(i32, i32)] = &[(3, 3), (11, 3), (5, 6)];

/// The starting map plus the positions nations are assigned.
#[derive(Debug, Clone)]
pub struct StartingWorld {
    /// The map.
    pub map: GridMap,
    /// Starting positions in assignment order.
    pub starting_positions: Vec<TileCoord>,
}

/// Map a template glyph to `(terrain, has_river)`.
const fn glyph_terrain(glyph: char) -> Option<(TerrainKind, bool)> {
    let terrain = match glyph {
        'G' | 'g' => TerrainKind::Grassland,
        'P' | 'p' => TerrainKind::Plains,
        'D' => TerrainKind::Desert,
        'T' => TerrainKind::Tundra,
        'S' => TerrainKind::Snow,
        'H' => TerrainKind::Hills,
        'F' => TerrainKind::Forest,
        'M' => TerrainKind::Mountain,
        '^' => TerrainKind::HighMountain,
        '*' => TerrainKind::SnowMountain,
        'C' => TerrainKind::Coast,
        'O' => TerrainKind::Ocean,
        'W' => TerrainKind::Water,
        _ => return None,
    };
    Some((terrain, glyph.is_ascii_lowercase()))
}

/// Build a map from row-major template lines.
///
/// # Errors
///
/// Returns [`WorldError::UnknownGlyph`] for unrecognized characters and
/// [`WorldError::TemplateTooLarge`] if a dimension overflows `i32`.
pub fn map_from_template(rows: &[&str]) -> Result<GridMap, WorldError> {
    let mut map = GridMap::new();
    for (row_idx, row) in rows.iter().enumerate() {
        let y = i32::try_from(row_idx).map_err(|_err| WorldError::TemplateTooLarge)?;
        for (col_idx, glyph) in row.chars().enumerate() {
            let x = i32::try_from(col_idx).map_err(|_err| WorldError::TemplateTooLarge)?;
            let coord = TileCoord::new(x, y);
            let (terrain, river) =
                glyph_terrain(glyph).ok_or(WorldError::UnknownGlyph { glyph, coord })?;
            let resource = RESOURCES
                .iter()
                .find(|(rx, ry, _, _)| *rx == x && *ry == y)
                .map(|(_, _, class, name)| TileResource {
                    class: *class,
                    name: (*name).to_owned(),
                });
            map.insert(TileRecord::new(coord, terrain, river, resource))?;
        }
    }
    Ok(map)
}

/// Create the default starting world.
///
/// # Errors
///
/// Propagates [`WorldError`] from template parsing.
pub fn create_starting_world() -> Result<StartingWorld, WorldError> {
    let map = map_from_template(TEMPLATE)?;
    tracing::debug!(tiles = map.len(), "Starting map built");
    Ok(StartingWorld {
        map,
        starting_positions: STARTING_POSITIONS
            .iter()
            .map(|(x, y)| TileCoord::new(*x, *y))
            .collect(),
    })
}
