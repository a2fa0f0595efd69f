//! Occupancy field - per-tick count of agents standing on each tile.
//!
//! This is the only crowd-avoidance signal the pathfinder sees, so it is
//! rebuilt from scratch at the start of every tick rather than patched as
//! agents move.

use hecs::World;

use crate::components::{Agent, TileCoord, TilePosition};
use crate::grid::TileGrid;

#[derive(Debug, Clone)]
pub struct OccupancyField {
    width: usize,
    height: usize,
    counts: Vec<u32>,
}

impl OccupancyField {
    /// Zeroed field matching the grid dimensions
    pub fn new(grid: &TileGrid) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            counts: vec![0; grid.width() * grid.height()],
        }
    }

    pub fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    /// Recount from the agents' current tiles
    pub fn rebuild(&mut self, world: &World) {
        self.rebuild_from_tiles(
            world
                .query::<(&Agent, &TilePosition)>()
                .iter()
                .map(|(_, (_, tile))| tile.0),
        );
    }

    /// Recount from any tile sequence; out-of-bounds tiles are ignored.
    pub fn rebuild_from_tiles(&mut self, tiles: impl IntoIterator<Item = TileCoord>) {
        self.clear();
        for tile in tiles {
            if let Some(i) = self.index(tile) {
                self.counts[i] += 1;
            }
        }
    }

    /// Agents on `tile`, 0 when out of bounds
    pub fn count(&self, tile: TileCoord) -> u32 {
        self.index(tile).map(|i| self.counts[i]).unwrap_or(0)
    }

    /// Sum over all tiles - equals the population after a rebuild
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Largest count on any tile
    pub fn peak(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major counts for heatmap overlays
    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        if tile.x >= 0 && tile.y >= 0 && (tile.x as usize) < self.width && (tile.y as usize) < self.height {
            Some(tile.y as usize * self.width + tile.x as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_agents_per_tile() {
        let grid = TileGrid::walled_room(6, 6, 16.0).unwrap();
        let mut world = World::new();
        world.spawn((Agent { index: 0 }, TilePosition(TileCoord::new(2, 2))));
        world.spawn((Agent { index: 1 }, TilePosition(TileCoord::new(2, 2))));
        world.spawn((Agent { index: 2 }, TilePosition(TileCoord::new(3, 1))));
        // Entities without the Agent marker don't count
        world.spawn((TilePosition(TileCoord::new(3, 1)),));

        let mut field = OccupancyField::new(&grid);
        field.rebuild(&world);

        assert_eq!(field.count(TileCoord::new(2, 2)), 2);
        assert_eq!(field.count(TileCoord::new(3, 1)), 1);
        assert_eq!(field.count(TileCoord::new(4, 4)), 0);
        assert_eq!(field.total(), 3);
        assert_eq!(field.peak(), 2);
    }

    #[test]
    fn test_rebuild_discards_previous_counts() {
        let grid = TileGrid::walled_room(4, 4, 1.0).unwrap();
        let mut field = OccupancyField::new(&grid);
        field.rebuild_from_tiles([TileCoord::new(1, 1), TileCoord::new(1, 1)]);
        assert_eq!(field.count(TileCoord::new(1, 1)), 2);

        field.rebuild_from_tiles([TileCoord::new(2, 2)]);
        assert_eq!(field.count(TileCoord::new(1, 1)), 0);
        assert_eq!(field.total(), 1);
    }

    #[test]
    fn test_out_of_bounds_ignored() {
        let grid = TileGrid::walled_room(3, 3, 1.0).unwrap();
        let mut field = OccupancyField::new(&grid);
        field.rebuild_from_tiles([TileCoord::new(-1, 0), TileCoord::new(5, 5)]);
        assert_eq!(field.total(), 0);
        assert_eq!(field.count(TileCoord::new(-1, 0)), 0);
    }
}
