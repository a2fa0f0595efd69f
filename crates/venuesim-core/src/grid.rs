//! Static tile grid - the venue floor plan the crowd walks on.
//!
//! The grid is supplied once at setup and never mutated by the simulation.
//! Tiles are stored row-major as `u8` type codes; walkability is a lookup
//! table indexed by code so callers can decide which furniture blocks agents.

use crate::components::{TileCoord, Vec2};
use crate::error::ConfigError;

/// Tile type codes - simple `u8` constants, shared with whatever loads maps.
pub mod tile_types {
    pub const VOID: u8 = 0;
    pub const FLOOR: u8 = 1;
    pub const WALL: u8 = 2;
    pub const BAR: u8 = 3;
    pub const DINING: u8 = 4;
    pub const RESTROOM: u8 = 5;
    pub const COUNTER: u8 = 6;

    /// Codes agents may stand on by default
    pub const DEFAULT_WALKABLE: [u8; 4] = [FLOOR, BAR, DINING, RESTROOM];

    /// ASCII glyph for a layout row, `None` if unknown
    pub fn from_glyph(glyph: char) -> Option<u8> {
        match glyph {
            ' ' => Some(VOID),
            '.' => Some(FLOOR),
            '#' => Some(WALL),
            'b' => Some(BAR),
            'd' => Some(DINING),
            'r' => Some(RESTROOM),
            '=' => Some(COUNTER),
            _ => None,
        }
    }
}

/// Fixed 2D array of tile codes plus a walkability predicate
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<u8>,
    walkable: [bool; 256],
    tile_size: f32,
}

impl TileGrid {
    /// Build a grid from a row-major tile buffer (`tiles[y * width + x]`).
    ///
    /// Rejects empty grids, buffers of the wrong length, non-positive tile
    /// sizes and grids without a single walkable tile.
    pub fn new(
        width: usize,
        height: usize,
        tiles: Vec<u8>,
        tile_size: f32,
    ) -> Result<Self, ConfigError> {
        Self::with_walkable_codes(
            width,
            height,
            tiles,
            tile_size,
            &tile_types::DEFAULT_WALKABLE,
        )
    }

    /// Like [`TileGrid::new`] with an explicit set of walkable codes.
    pub fn with_walkable_codes(
        width: usize,
        height: usize,
        tiles: Vec<u8>,
        tile_size: f32,
        walkable_codes: &[u8],
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if tiles.len() != width * height {
            return Err(ConfigError::DimensionMismatch {
                expected: width * height,
                found: tiles.len(),
            });
        }
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return Err(ConfigError::InvalidTileSize(tile_size));
        }

        let mut walkable = [false; 256];
        for &code in walkable_codes {
            walkable[code as usize] = true;
        }

        let grid = Self {
            width,
            height,
            tiles,
            walkable,
            tile_size,
        };

        if grid.walkable_count() == 0 {
            return Err(ConfigError::NoWalkableTiles);
        }
        Ok(grid)
    }

    /// Parse an ASCII layout, first row is `y = 0`.
    ///
    /// Glyphs: `#` wall, `.` floor, `b` bar, `d` dining, `r` restroom,
    /// `=` counter, space for void.
    pub fn from_rows(rows: &[&str], tile_size: f32) -> Result<Self, ConfigError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut tiles = Vec::with_capacity(width * height);

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(ConfigError::RaggedRows {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let code =
                    tile_types::from_glyph(glyph).ok_or(ConfigError::UnknownGlyph { glyph, x, y })?;
                tiles.push(code);
            }
        }

        Self::new(width, height, tiles, tile_size)
    }

    /// Open rectangular room: a wall border around plain floor.
    pub fn walled_room(width: usize, height: usize, tile_size: f32) -> Result<Self, ConfigError> {
        let mut tiles = vec![tile_types::FLOOR; width * height];
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    tiles[y * width + x] = tile_types::WALL;
                }
            }
        }
        Self::new(width, height, tiles, tile_size)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// World units per tile edge
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Total world extent `(width, height)` in world units
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as usize) < self.width && (tile.y as usize) < self.height
    }

    /// Row-major cell index, `None` if out of bounds
    pub fn index(&self, tile: TileCoord) -> Option<usize> {
        if self.in_bounds(tile) {
            Some(tile.y as usize * self.width + tile.x as usize)
        } else {
            None
        }
    }

    /// Tile code at `tile`, `None` if out of bounds
    pub fn tile_type(&self, tile: TileCoord) -> Option<u8> {
        self.index(tile).map(|i| self.tiles[i])
    }

    /// Bounds-checked walkability query
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.tile_type(tile)
            .map(|code| self.walkable[code as usize])
            .unwrap_or(false)
    }

    /// World position of a tile's centre
    pub fn tile_center(&self, tile: TileCoord) -> Vec2 {
        Vec2::new(
            tile.x as f32 * self.tile_size + self.tile_size * 0.5,
            tile.y as f32 * self.tile_size + self.tile_size * 0.5,
        )
    }

    /// Tile containing a world position (may be out of bounds)
    pub fn tile_at(&self, position: Vec2) -> TileCoord {
        TileCoord::new(
            (position.x / self.tile_size).floor() as i32,
            (position.y / self.tile_size).floor() as i32,
        )
    }

    pub fn walkable_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|&&code| self.walkable[code as usize])
            .count()
    }

    /// First walkable tile in row-major order. Always `Some` for a grid
    /// built through the validating constructors.
    pub fn first_walkable(&self) -> Option<TileCoord> {
        self.tiles
            .iter()
            .position(|&code| self.walkable[code as usize])
            .map(|i| TileCoord::new((i % self.width) as i32, (i / self.width) as i32))
    }

    /// All walkable tiles in row-major order
    pub fn walkable_tiles(&self) -> Vec<TileCoord> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, &code)| self.walkable[code as usize])
            .map(|(i, _)| TileCoord::new((i % self.width) as i32, (i / self.width) as i32))
            .collect()
    }

    /// All tiles carrying `code`, row-major
    pub fn tiles_of_type(&self, code: u8) -> Vec<TileCoord> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == code)
            .map(|(i, _)| TileCoord::new((i % self.width) as i32, (i / self.width) as i32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_grid() {
        assert!(matches!(
            TileGrid::new(0, 5, vec![], 32.0),
            Err(ConfigError::EmptyGrid)
        ));
    }

    #[test]
    fn test_rejects_size_mismatch() {
        let err = TileGrid::new(3, 3, vec![tile_types::FLOOR; 8], 32.0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DimensionMismatch {
                expected: 9,
                found: 8
            }
        ));
    }

    #[test]
    fn test_rejects_all_walls() {
        let err = TileGrid::new(2, 2, vec![tile_types::WALL; 4], 32.0).unwrap_err();
        assert!(matches!(err, ConfigError::NoWalkableTiles));
    }

    #[test]
    fn test_rejects_bad_tile_size() {
        assert!(matches!(
            TileGrid::new(1, 1, vec![tile_types::FLOOR], 0.0),
            Err(ConfigError::InvalidTileSize(_))
        ));
        assert!(matches!(
            TileGrid::new(1, 1, vec![tile_types::FLOOR], f32::NAN),
            Err(ConfigError::InvalidTileSize(_))
        ));
    }

    #[test]
    fn test_walkability_bounds_checked() {
        let grid = TileGrid::from_rows(&["###", "#.#", "###"], 16.0).unwrap();
        assert!(grid.is_walkable(TileCoord::new(1, 1)));
        assert!(!grid.is_walkable(TileCoord::new(0, 0)));
        assert!(!grid.is_walkable(TileCoord::new(-1, 1)));
        assert!(!grid.is_walkable(TileCoord::new(3, 1)));
        assert_eq!(grid.walkable_tiles(), vec![TileCoord::new(1, 1)]);
    }

    #[test]
    fn test_first_walkable_row_major() {
        let grid = TileGrid::from_rows(&["####", "##..", "#..."], 16.0).unwrap();
        assert_eq!(grid.first_walkable(), Some(TileCoord::new(2, 1)));
    }

    #[test]
    fn test_custom_walkable_codes() {
        let tiles = vec![tile_types::FLOOR, tile_types::COUNTER];
        let grid = TileGrid::with_walkable_codes(2, 1, tiles, 10.0, &[tile_types::COUNTER]).unwrap();
        assert!(!grid.is_walkable(TileCoord::new(0, 0)));
        assert!(grid.is_walkable(TileCoord::new(1, 0)));
    }

    #[test]
    fn test_tile_center_round_trip() {
        let grid = TileGrid::walled_room(10, 8, 32.0).unwrap();
        let tile = TileCoord::new(4, 6);
        let center = grid.tile_center(tile);
        assert_eq!(center, Vec2::new(144.0, 208.0));
        assert_eq!(grid.tile_at(center), tile);
        assert_eq!(grid.world_size(), Vec2::new(320.0, 256.0));
    }

    #[test]
    fn test_from_rows_errors() {
        assert!(matches!(
            TileGrid::from_rows(&["...", ".."], 1.0),
            Err(ConfigError::RaggedRows { row: 1, .. })
        ));
        assert!(matches!(
            TileGrid::from_rows(&["..?"], 1.0),
            Err(ConfigError::UnknownGlyph { glyph: '?', x: 2, y: 0 })
        ));
    }

    #[test]
    fn test_walled_room_border() {
        let grid = TileGrid::walled_room(5, 4, 1.0).unwrap();
        assert_eq!(grid.walkable_count(), 3 * 2);
        assert_eq!(grid.tile_type(TileCoord::new(0, 2)), Some(tile_types::WALL));
        assert_eq!(grid.tile_type(TileCoord::new(2, 2)), Some(tile_types::FLOOR));
    }
}
