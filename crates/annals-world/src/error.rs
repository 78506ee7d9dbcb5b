//! Error types for the `annals-world` crate.

use annals_types::TileCoord;

/// Errors that can occur during map operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// No tile exists at the coordinate.
    #[error("tile not found: {0}")]
    TileNotFound(TileCoord),

    /// Two tiles were supplied for the same coordinate.
    #[error("duplicate tile at {0}")]
    DuplicateTile(TileCoord),

    /// A map template contained an unknown terrain glyph.
    #[error("unknown terrain glyph {glyph:?} at {coord}")]
    UnknownGlyph {
        /// The offending character.
        glyph: char,
        /// Where it appeared.
        coord: TileCoord,
    },

    /// A map template dimension does not fit in a coordinate.
    #[error("map template too large")]
    TemplateTooLarge,
}
