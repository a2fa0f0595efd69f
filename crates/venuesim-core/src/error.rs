//! Configuration-time errors.
//!
//! Nothing in the tick loop can fail; every fatal precondition is checked
//! when the grid, hotspots and config are assembled into an engine.

use crate::components::TileCoord;

#[derive(Debug)]
pub enum ConfigError {
    /// Width or height is zero
    EmptyGrid,
    /// The tile buffer does not match `width * height`
    DimensionMismatch { expected: usize, found: usize },
    /// Rows of an ASCII layout differ in length
    RaggedRows { row: usize, expected: usize, found: usize },
    /// Unknown character in an ASCII layout
    UnknownGlyph { glyph: char, x: usize, y: usize },
    /// The grid has no walkable tile at all
    NoWalkableTiles,
    /// Tile size must be a positive, finite number
    InvalidTileSize(f32),
    /// A hotspot tile lies outside the grid
    HotspotOutOfBounds { category: String, tile: TileCoord },
    /// A hotspot tile cannot be stood on
    HotspotNotWalkable { category: String, tile: TileCoord },
    /// A tuning value is out of its legal range
    InvalidParameter { name: &'static str, reason: String },
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EmptyGrid => write!(f, "Grid has zero width or height"),
            ConfigError::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "Tile buffer size mismatch: expected {}, found {}",
                    expected, found
                )
            }
            ConfigError::RaggedRows {
                row,
                expected,
                found,
            } => write!(
                f,
                "Layout row {} has {} tiles, expected {}",
                row, found, expected
            ),
            ConfigError::UnknownGlyph { glyph, x, y } => {
                write!(f, "Unknown layout glyph '{}' at ({}, {})", glyph, x, y)
            }
            ConfigError::NoWalkableTiles => write!(f, "Grid has no walkable tiles"),
            ConfigError::InvalidTileSize(size) => write!(f, "Invalid tile size: {}", size),
            ConfigError::HotspotOutOfBounds { category, tile } => {
                write!(f, "Hotspot '{}' tile {} is out of bounds", category, tile)
            }
            ConfigError::HotspotNotWalkable { category, tile } => {
                write!(f, "Hotspot '{}' tile {} is not walkable", category, tile)
            }
            ConfigError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "Config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ConfigError::DimensionMismatch {
            expected: 12,
            found: 10,
        };
        assert_eq!(
            err.to_string(),
            "Tile buffer size mismatch: expected 12, found 10"
        );

        let err = ConfigError::HotspotNotWalkable {
            category: "bar".into(),
            tile: TileCoord::new(3, 4),
        };
        assert_eq!(err.to_string(), "Hotspot 'bar' tile (3, 4) is not walkable");
    }

    #[test]
    fn test_json_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: ConfigError = parse.unwrap_err().into();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
