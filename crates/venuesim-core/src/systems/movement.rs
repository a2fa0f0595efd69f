//! Movement system - continuous glide between tile centres plus the
//! per-agent arrive/step/dwell state machine.
//!
//! Motion is two-phase: positions glide smoothly in world space for
//! rendering, while tile bookkeeping only changes at the instant an agent
//! snaps onto a tile centre. Pathing decisions therefore always see
//! grid-exact state.

use hecs::World;
use log::debug;
use rand::Rng;

use super::goals::reassign_goal;
use super::needs::{begin_dwell, relieve_at};
use super::pathfinding::{next_step, Step};
use super::SimContext;
use crate::components::{Agent, Goal, Movement, Needs, Patience, Position, TilePosition, Vec2};

/// Advance `position` toward `target` by `speed * delta_seconds` world units.
///
/// Each axis is clamped independently when the step would carry it past the
/// target. Returns true once the remaining squared distance is within
/// `snap_distance_sq`; the position is then exactly `target`.
pub fn integrate_motion(
    position: &mut Vec2,
    target: Vec2,
    speed: f32,
    delta_seconds: f32,
    snap_distance_sq: f32,
) -> bool {
    let diff = target - *position;
    if diff.x * diff.x + diff.y * diff.y <= snap_distance_sq {
        *position = target;
        return true;
    }

    let direction = diff.normalize();
    let step = speed * delta_seconds;
    position.x += direction.x * step;
    position.y += direction.y * step;

    // Overshoot on an axis flips the sign of the remaining delta
    if (target.x - position.x) * diff.x < 0.0 {
        position.x = target.x;
    }
    if (target.y - position.y) * diff.y < 0.0 {
        position.y = target.y;
    }

    if position.distance_squared(&target) <= snap_distance_sq {
        *position = target;
        true
    } else {
        false
    }
}

/// Run the agent state machine for one tick.
///
/// Idle agents only count down their patience. Everyone else ages their
/// repath timer, glides toward their target and, on snapping to a tile,
/// either dwells (goal reached), plans the next step, or repicks a goal
/// when boxed in.
pub fn movement_system<R: Rng>(world: &mut World, ctx: &mut SimContext<'_, R>, delta_seconds: f32) {
    let tile_size = ctx.grid.tile_size();
    let snap = ctx.config.pathing.snap_distance * tile_size;
    let snap_distance_sq = snap * snap;

    for (_, (agent, tile, pos, movement, goal, needs, patience)) in world.query_mut::<(
        &Agent,
        &mut TilePosition,
        &mut Position,
        &mut Movement,
        &mut Goal,
        &mut Needs,
        &mut Patience,
    )>() {
        if patience.is_idle() {
            patience.tick(delta_seconds);
            continue;
        }

        goal.repath_timer -= delta_seconds;
        if goal.repath_timer <= 0.0 {
            reassign_goal(goal, needs.urge, ctx);
        }

        let arrived = integrate_motion(
            &mut pos.0,
            movement.target,
            movement.speed * tile_size,
            delta_seconds,
            snap_distance_sq,
        );
        if !arrived {
            continue;
        }

        let landed = ctx.grid.tile_at(pos.0);
        if ctx.grid.is_walkable(landed) {
            tile.0 = landed;
        } else {
            // Only reachable if a target was set off-grid; stay put on the last good tile
            pos.0 = ctx.grid.tile_center(tile.0);
            movement.target = pos.0;
        }

        match next_step(tile.0, goal.tile, ctx.grid, ctx.occupancy, &ctx.config.pathing, &mut *ctx.rng) {
            Step::Arrived => {
                begin_dwell(patience, ctx);
                relieve_at(needs, tile.0, ctx);
                reassign_goal(goal, needs.urge, ctx);
            }
            Step::Move(next) => {
                movement.target = ctx.grid.tile_center(next);
            }
            Step::Stuck => {
                debug!("Agent {} stuck at {}, picking a new goal", agent.index, tile.0);
                reassign_goal(goal, needs.urge, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TileCoord;
    use crate::config::SimConfig;
    use crate::grid::TileGrid;
    use crate::hotspots::{categories, HotspotRegistry};
    use crate::systems::OccupancyField;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_partial_move() {
        let mut pos = Vec2::new(0.0, 0.0);
        let arrived = integrate_motion(&mut pos, Vec2::new(10.0, 0.0), 2.0, 1.0, 0.01);
        assert!(!arrived);
        assert!((pos.x - 2.0).abs() < 1e-5);
        assert_eq!(pos.y, 0.0);
    }

    #[test]
    fn test_overshoot_snaps_to_target() {
        let mut pos = Vec2::new(0.0, 0.0);
        let target = Vec2::new(1.0, 0.0);
        let arrived = integrate_motion(&mut pos, target, 100.0, 1.0, 0.01);
        assert!(arrived);
        assert_eq!(pos, target);
    }

    #[test]
    fn test_axes_clamped_independently() {
        // Diagonal step far larger than the remaining distance
        let mut pos = Vec2::new(0.0, 0.0);
        let target = Vec2::new(3.0, 4.0);
        let arrived = integrate_motion(&mut pos, target, 50.0, 1.0, 0.0);
        assert!(arrived);
        assert_eq!(pos, target);
    }

    #[test]
    fn test_at_rest_arrives_immediately() {
        let mut pos = Vec2::new(5.0, 5.0);
        let target = pos;
        assert!(integrate_motion(&mut pos, target, 3.0, 0.0, 0.01));
        assert_eq!(pos, Vec2::new(5.0, 5.0));
    }

    struct Fixture {
        grid: TileGrid,
        hotspots: HotspotRegistry,
        occupancy: OccupancyField,
        config: SimConfig,
        rng: StdRng,
    }

    impl Fixture {
        fn new() -> Self {
            let grid = TileGrid::walled_room(10, 10, 16.0).unwrap();
            let hotspots = HotspotRegistry::new()
                .with_category(categories::RESTROOM, vec![TileCoord::new(8, 8)]);
            let occupancy = OccupancyField::new(&grid);
            Self {
                grid,
                hotspots,
                occupancy,
                config: SimConfig::default(),
                rng: StdRng::seed_from_u64(21),
            }
        }

        fn run(&mut self, world: &mut World, dt: f32) {
            self.occupancy.rebuild(world);
            let mut ctx = SimContext {
                grid: &self.grid,
                hotspots: &self.hotspots,
                occupancy: &self.occupancy,
                config: &self.config,
                rng: &mut self.rng,
            };
            movement_system(world, &mut ctx, dt);
        }
    }

    fn spawn_agent(world: &mut World, grid: &TileGrid, tile: TileCoord, goal: TileCoord) -> hecs::Entity {
        let center = grid.tile_center(tile);
        world.spawn((
            Agent { index: 0 },
            TilePosition(tile),
            Position(center),
            Movement::at_rest(center, 3.0),
            Goal {
                tile: goal,
                repath_timer: 100.0,
            },
            Needs::new(0.9),
            Patience::default(),
        ))
    }

    #[test]
    fn test_agent_walks_to_goal_and_dwells() {
        let mut fx = Fixture::new();
        let mut world = World::new();
        let start = TileCoord::new(2, 8);
        let goal = TileCoord::new(8, 8);
        let entity = spawn_agent(&mut world, &fx.grid, start, goal);

        let mut dwelled = false;
        for _ in 0..200 {
            fx.run(&mut world, 1.0 / 30.0);
            let patience = world.get::<&Patience>(entity).unwrap();
            if patience.is_idle() {
                dwelled = true;
                break;
            }
        }

        assert!(dwelled, "agent never reached its goal");
        assert_eq!(world.get::<&TilePosition>(entity).unwrap().0, goal);
        // Goal tile is the restroom, so the urge was relieved
        let needs = world.get::<&Needs>(entity).unwrap();
        assert!(needs.urge <= fx.config.needs.relief_level + 1e-6);
        // Idle position sits exactly on the tile centre
        assert_eq!(world.get::<&Position>(entity).unwrap().0, fx.grid.tile_center(goal));
    }

    #[test]
    fn test_idle_agent_does_not_move() {
        let mut fx = Fixture::new();
        let mut world = World::new();
        let tile = TileCoord::new(4, 4);
        let entity = spawn_agent(&mut world, &fx.grid, tile, TileCoord::new(8, 8));
        world.get::<&mut Patience>(entity).unwrap().remaining = 1.0;

        fx.run(&mut world, 0.25);

        assert_eq!(world.get::<&Patience>(entity).unwrap().remaining, 0.75);
        assert_eq!(world.get::<&Position>(entity).unwrap().0, fx.grid.tile_center(tile));
        let movement = world.get::<&Movement>(entity).unwrap();
        assert_eq!(movement.target, fx.grid.tile_center(tile));
        // Repath timer is frozen while idle
        assert_eq!(world.get::<&Goal>(entity).unwrap().repath_timer, 100.0);
    }

    #[test]
    fn test_repath_timer_forces_new_goal() {
        let mut fx = Fixture::new();
        let mut world = World::new();
        let entity = spawn_agent(&mut world, &fx.grid, TileCoord::new(4, 4), TileCoord::new(1, 1));
        world.get::<&mut Goal>(entity).unwrap().repath_timer = 0.01;

        fx.run(&mut world, 1.0 / 30.0);

        let goal = world.get::<&Goal>(entity).unwrap();
        // Only the restroom category exists, so the new goal is its single tile
        assert_eq!(goal.tile, TileCoord::new(8, 8));
        assert!(goal.repath_timer >= fx.config.agents.repath.min);
    }

    #[test]
    fn test_stuck_agent_repicks_goal() {
        let grid = TileGrid::from_rows(&["#####", "#.#.#", "#####"], 16.0).unwrap();
        let hotspots = HotspotRegistry::new();
        let occupancy = OccupancyField::new(&grid);
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut world = World::new();
        let entity = spawn_agent(&mut world, &grid, TileCoord::new(1, 1), TileCoord::new(3, 1));

        let mut ctx = SimContext {
            grid: &grid,
            hotspots: &hotspots,
            occupancy: &occupancy,
            config: &config,
            rng: &mut rng,
        };
        movement_system(&mut world, &mut ctx, 1.0 / 30.0);

        let goal = world.get::<&Goal>(entity).unwrap();
        assert!(goal.repath_timer <= config.agents.repath.max);
        assert_eq!(world.get::<&TilePosition>(entity).unwrap().0, TileCoord::new(1, 1));
    }
}
