//! Simulation engine - main entry point for running the venue simulation

use hecs::{Entity, World};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::config::SimConfig;
use crate::error::ConfigError;
use crate::grid::TileGrid;
use crate::hotspots::HotspotRegistry;
use crate::systems::*;

/// Read-only view of one agent, for rendering and inspection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub index: u32,
    pub tile: TileCoord,
    pub position: Vec2,
    pub target: Vec2,
    pub goal: TileCoord,
    pub need: f32,
    pub patience: f32,
    pub tint: Tint,
    pub state: AgentState,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world containing all agents
    world: World,
    /// Agent entities in roster order
    roster: Vec<Entity>,
    grid: TileGrid,
    hotspots: HotspotRegistry,
    occupancy: OccupancyField,
    config: SimConfig,
    rng: StdRng,
    ambient: AmbientEvents,
    /// External disorder metric, read once per tick
    disorder: f32,
    time_scale: f32,
    /// Simulated seconds since creation
    sim_time: f64,
    tick_count: u64,
}

impl SimulationEngine {
    /// Create an empty venue. The grid, hotspots and tuning are validated
    /// here so that nothing can fail mid-tick.
    pub fn new(grid: TileGrid, hotspots: HotspotRegistry, config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        hotspots.validate(&grid)?;

        info!(
            "Venue created: {}x{} tiles ({} walkable), {} hotspot categories, seed {}",
            grid.width(),
            grid.height(),
            grid.walkable_count(),
            hotspots.len(),
            config.seed
        );

        Ok(Self {
            world: World::new(),
            roster: Vec::new(),
            occupancy: OccupancyField::new(&grid),
            rng: StdRng::seed_from_u64(config.seed),
            time_scale: config.time_scale,
            grid,
            hotspots,
            config,
            ambient: AmbientEvents::new(),
            disorder: 0.0,
            sim_time: 0.0,
            tick_count: 0,
        })
    }

    /// Discard every agent and spawn `count` new ones
    pub fn repopulate(&mut self, count: usize) {
        self.world.clear();
        let mut ctx = SimContext {
            grid: &self.grid,
            hotspots: &self.hotspots,
            occupancy: &self.occupancy,
            config: &self.config,
            rng: &mut self.rng,
        };
        self.roster = spawn_population(&mut self.world, count, &mut ctx);
        self.occupancy.rebuild(&self.world);
        info!("Repopulated venue with {} agents", count);
    }

    /// Advance the simulation by `elapsed` real seconds.
    ///
    /// The step is clamped to `max_step` and scaled by the time scale. A
    /// zero step (paused, or non-finite input) only refreshes occupancy.
    pub fn tick(&mut self, elapsed: f32) {
        let elapsed = if elapsed.is_finite() { elapsed } else { 0.0 };
        let step = elapsed.clamp(0.0, self.config.max_step) * self.time_scale;

        self.tick_count += 1;
        self.occupancy.rebuild(&self.world);
        if step <= 0.0 {
            return;
        }
        self.sim_time += step as f64;

        needs_system(&mut self.world, self.config.needs.rate * step);

        let mut ctx = SimContext {
            grid: &self.grid,
            hotspots: &self.hotspots,
            occupancy: &self.occupancy,
            config: &self.config,
            rng: &mut self.rng,
        };
        movement_system(&mut self.world, &mut ctx, step);

        self.ambient.update(
            step,
            self.disorder,
            (Vec2::ZERO, self.grid.world_size()),
            self.roster.len(),
            &self.config.ambient,
            &mut self.rng,
        );
    }

    /// Snapshot of every agent, ordered by roster index
    pub fn agents(&self) -> Vec<AgentSnapshot> {
        let mut snapshots: Vec<AgentSnapshot> = self
            .world
            .query::<(&Agent, &TilePosition, &Position, &Movement, &Goal, &Needs, &Patience, &Tint)>()
            .iter()
            .map(|(_, (agent, tile, pos, movement, goal, needs, patience, tint))| AgentSnapshot {
                index: agent.index,
                tile: tile.0,
                position: pos.0,
                target: movement.target,
                goal: goal.tile,
                need: needs.urge,
                patience: patience.remaining,
                tint: *tint,
                state: if patience.is_idle() {
                    AgentState::Idle
                } else {
                    AgentState::Moving
                },
            })
            .collect();
        snapshots.sort_by_key(|s| s.index);
        snapshots
    }

    pub fn hazards(&self) -> Vec<HazardSnapshot> {
        self.ambient.hazard_snapshots()
    }

    /// Attention markers positioned over their agents
    pub fn attention_markers(&self) -> Vec<AttentionSnapshot> {
        let positions: Vec<Vec2> = self
            .roster
            .iter()
            .map(|&entity| {
                self.world
                    .get::<&Position>(entity)
                    .map(|p| p.0)
                    .unwrap_or(Vec2::ZERO)
            })
            .collect();
        self.ambient
            .attention_snapshots(&positions, self.grid.tile_size(), &self.config.ambient)
    }

    /// Set the external disorder metric. Negative or non-finite values read as 0.
    pub fn set_disorder(&mut self, disorder: f32) {
        self.disorder = if disorder.is_finite() { disorder.max(0.0) } else { 0.0 };
    }

    pub fn disorder(&self) -> f32 {
        self.disorder
    }

    /// Set time scale (1.0 = real-time, 0.0 = paused)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Population the venue should hold at the current disorder
    pub fn population_target(&self) -> usize {
        self.config.population.target(self.disorder)
    }

    /// Occupancy as of the start of the last tick
    pub fn occupancy(&self) -> &OccupancyField {
        &self.occupancy
    }

    pub fn agent_count(&self) -> usize {
        self.roster.len()
    }

    /// Simulated seconds since creation
    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn hotspots(&self) -> &HotspotRegistry {
        &self.hotspots
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn ambient(&self) -> &AmbientEvents {
        &self.ambient
    }

    /// Roster indices of agents whose need exceeds `threshold`
    pub fn find_urgent_agents(&self, threshold: f32) -> Vec<u32> {
        find_urgent_agents(&self.world, threshold)
    }

    pub fn average_need(&self) -> f32 {
        average_need(&self.world)
    }
}
