//! Population spawning - builds a fresh crowd on random walkable tiles

use hecs::{Entity, World};
use log::debug;
use rand::Rng;

use super::goals::{random_walkable_tile, select_goal};
use super::SimContext;
use crate::components::{Agent, Goal, Movement, Needs, Patience, Position, TileCoord, TilePosition, Tint};
use crate::grid::TileGrid;

/// Spawn `count` agents into `world`, indexed `0..count`.
///
/// Each agent starts at rest on the centre of a random walkable tile with a
/// goal already drawn for its starting need. The caller is expected to have
/// cleared the previous population.
pub fn spawn_population<R: Rng>(world: &mut World, count: usize, ctx: &mut SimContext<'_, R>) -> Vec<Entity> {
    let config = ctx.config;
    let tuning = &config.agents;
    let mut entities = Vec::with_capacity(count);

    for index in 0..count {
        let tile = spawn_tile(ctx.grid, config.goals.random_tile_attempts, &mut *ctx.rng);
        let center = ctx.grid.tile_center(tile);

        let speed = tuning.speed.sample(&mut *ctx.rng);
        let repath_timer = tuning.repath.sample(&mut *ctx.rng);
        let tint = Tint {
            r: tuning.tint_r.sample(&mut *ctx.rng),
            g: tuning.tint_g.sample(&mut *ctx.rng),
            b: tuning.tint_b.sample(&mut *ctx.rng),
        };
        let needs = Needs::new(tuning.initial_need.sample(&mut *ctx.rng));
        let goal = select_goal(needs.urge, ctx.hotspots, ctx.grid, config, &mut *ctx.rng);

        let entity = world.spawn((
            Agent { index: index as u32 },
            TilePosition(tile),
            Position(center),
            Movement::at_rest(center, speed),
            Goal {
                tile: goal.tile,
                repath_timer,
            },
            needs,
            Patience::default(),
            tint,
        ));
        entities.push(entity);
    }

    entities
}

/// Random walkable tile, or the first walkable tile in row-major order when
/// the random draw runs out of attempts. Never a wall.
fn spawn_tile(grid: &TileGrid, attempts: u32, rng: &mut impl Rng) -> TileCoord {
    let tile = random_walkable_tile(grid, attempts, rng);
    if grid.is_walkable(tile) {
        return tile;
    }
    match grid.first_walkable() {
        Some(fallback) => {
            debug!("Spawn draw landed on {}, using {}", tile, fallback);
            fallback
        }
        None => tile,
    }
}
