//! Systems - logic that operates on components

mod ambient;
mod goals;
mod movement;
mod needs;
mod occupancy;
mod pathfinding;
mod population;

pub use ambient::*;
pub use goals::*;
pub use movement::*;
pub use needs::*;
pub use occupancy::*;
pub use pathfinding::*;
pub use population::*;

use rand::Rng;

use crate::config::SimConfig;
use crate::grid::TileGrid;
use crate::hotspots::HotspotRegistry;

/// Read-only venue data plus the shared RNG, handed to per-agent systems.
///
/// Borrowed from the engine for the duration of one tick so the agent
/// `World` can be queried mutably alongside it.
pub struct SimContext<'a, R: Rng> {
    pub grid: &'a TileGrid,
    pub hotspots: &'a HotspotRegistry,
    pub occupancy: &'a OccupancyField,
    pub config: &'a SimConfig,
    pub rng: &'a mut R,
}
