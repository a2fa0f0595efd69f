//! Hotspot registry - named lists of point-of-interest tiles.
//!
//! Categories are kept in a `BTreeMap` so iteration order is stable, which
//! keeps the weighted goal draw reproducible for a given seed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::TileCoord;
use crate::error::ConfigError;
use crate::grid::TileGrid;

/// Well-known category names
pub mod categories {
    pub const BAR: &str = "bar";
    pub const DINING: &str = "dining";
    pub const RESTROOM: &str = "restroom";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HotspotRegistry {
    categories: BTreeMap<String, Vec<TileCoord>>,
}

impl HotspotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a category
    pub fn with_category(mut self, name: impl Into<String>, tiles: Vec<TileCoord>) -> Self {
        self.categories.insert(name.into(), tiles);
        self
    }

    /// Collect categories from tile codes painted on the grid,
    /// e.g. `[("bar", tile_types::BAR)]`.
    pub fn from_tile_types(grid: &TileGrid, mapping: &[(&str, u8)]) -> Self {
        let mut registry = Self::new();
        for &(name, code) in mapping {
            let tiles = grid.tiles_of_type(code);
            if !tiles.is_empty() {
                registry.categories.insert(name.to_string(), tiles);
            }
        }
        registry
    }

    /// Every hotspot tile must be on the grid and walkable
    pub fn validate(&self, grid: &TileGrid) -> Result<(), ConfigError> {
        for (name, tiles) in &self.categories {
            for &tile in tiles {
                if !grid.in_bounds(tile) {
                    return Err(ConfigError::HotspotOutOfBounds {
                        category: name.clone(),
                        tile,
                    });
                }
                if !grid.is_walkable(tile) {
                    return Err(ConfigError::HotspotNotWalkable {
                        category: name.clone(),
                        tile,
                    });
                }
            }
        }
        Ok(())
    }

    /// Non-empty categories in name order
    pub fn categories(&self) -> impl Iterator<Item = (&str, &[TileCoord])> {
        self.categories
            .iter()
            .filter(|(_, tiles)| !tiles.is_empty())
            .map(|(name, tiles)| (name.as_str(), tiles.as_slice()))
    }

    pub fn tiles(&self, category: &str) -> &[TileCoord] {
        self.categories
            .get(category)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, category: &str, tile: TileCoord) -> bool {
        self.tiles(category).contains(&tile)
    }

    /// True when no category has any tile
    pub fn is_empty(&self) -> bool {
        self.categories().next().is_none()
    }

    /// Number of non-empty categories
    pub fn len(&self) -> usize {
        self.categories().count()
    }
}
