//! VenueSim Core - Tile-Grid Crowd Simulation Engine
//!
//! A frame-driven simulation of patrons wandering a tile-based venue. Each
//! agent picks weighted destinations among named hotspots, walks toward
//! them one tile at a time while steering around crowds, and slowly grows
//! a need that sends it to the relieving hotspot. An ambient generator
//! scatters transient hazards and attention markers as an external
//! disorder level rises.
//!
//! # Architecture
//!
//! Agents live in an Entity Component System via `hecs`:
//! - **Entities**: agents, indexed by roster position
//! - **Components**: pure data (TilePosition, Movement, Goal, Needs, Patience, ...)
//! - **Systems**: logic that queries and updates components
//!
//! Everything random draws from one seeded generator owned by the engine,
//! so a run is reproducible from its seed and elapsed-time sequence.
//!
//! # Example
//!
//! ```rust,no_run
//! use venuesim_core::prelude::*;
//!
//! let grid = TileGrid::walled_room(40, 26, 32.0)?;
//! let hotspots = HotspotRegistry::new()
//!     .with_category("restroom", vec![TileCoord::new(3, 3)]);
//!
//! let mut engine = SimulationEngine::new(grid, hotspots, SimConfig::default())?;
//! engine.repopulate(engine.population_target());
//!
//! loop {
//!     engine.tick(1.0 / 60.0); // 60 FPS
//!     for agent in engine.agents() {
//!         // draw agent.position with agent.tint
//!     }
//! }
//! # Ok::<(), venuesim_core::error::ConfigError>(())
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod hotspots;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::SimConfig;
    pub use crate::engine::{AgentSnapshot, SimulationEngine};
    pub use crate::error::ConfigError;
    pub use crate::grid::{tile_types, TileGrid};
    pub use crate::hotspots::{categories, HotspotRegistry};
    pub use crate::systems::{AttentionSnapshot, HazardSnapshot};
}
