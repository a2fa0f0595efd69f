//! Goal selection - need-weighted choice of the next destination tile.
//!
//! Each hotspot category carries a base weight. The urge category's weight
//! grows with the agent's need (`base + need * gain`), so a desperate agent
//! heads for the restroom far more often than a satisfied one. Categories
//! with no tiles never take part in the draw.

use log::warn;
use rand::Rng;

use super::SimContext;
use crate::components::{Goal, TileCoord};
use crate::config::SimConfig;
use crate::grid::TileGrid;
use crate::hotspots::HotspotRegistry;

/// Outcome of a goal draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalChoice<'a> {
    pub tile: TileCoord,
    /// Category the tile was drawn from, `None` for the random-tile fallback
    pub category: Option<&'a str>,
}

/// Effective weight of every non-empty category for an agent with `need`
pub fn category_weights<'a>(
    need: f32,
    hotspots: &'a HotspotRegistry,
    config: &SimConfig,
) -> Vec<(&'a str, &'a [TileCoord], f32)> {
    let need = need.clamp(0.0, 1.0);
    hotspots
        .categories()
        .map(|(name, tiles)| {
            let base = config.goals.base_weight(name);
            let weight = if name == config.needs.urge_category {
                base + need * config.needs.gain
            } else {
                base
            };
            (name, tiles, weight.max(0.0))
        })
        .collect()
}

/// Pick a destination for an agent between goals.
///
/// Falls back to a uniformly random walkable tile when no category has a
/// positive weight.
pub fn select_goal<'a>(
    need: f32,
    hotspots: &'a HotspotRegistry,
    grid: &TileGrid,
    config: &SimConfig,
    rng: &mut impl Rng,
) -> GoalChoice<'a> {
    let weights = category_weights(need, hotspots, config);
    let total: f32 = weights.iter().map(|(_, _, w)| *w).sum();

    if weights.is_empty() || total <= 0.0 {
        return GoalChoice {
            tile: random_walkable_tile(grid, config.goals.random_tile_attempts, rng),
            category: None,
        };
    }

    let roll = rng.gen::<f32>() * total;
    let mut acc = 0.0;
    let mut chosen = weights.len() - 1;
    for (i, (_, _, weight)) in weights.iter().enumerate() {
        acc += weight;
        if roll < acc {
            chosen = i;
            break;
        }
    }

    // Float rounding can leave `roll` past the last positive bucket
    while weights[chosen].2 <= 0.0 && chosen > 0 {
        chosen -= 1;
    }

    let (name, tiles, _) = weights[chosen];
    GoalChoice {
        tile: tiles[rng.gen_range(0..tiles.len())],
        category: Some(name),
    }
}

/// Draw a fresh goal and restart the repath countdown. Every path that
/// changes an agent's goal goes through here.
pub fn reassign_goal<R: Rng>(goal: &mut Goal, need: f32, ctx: &mut SimContext<'_, R>) {
    let choice = select_goal(need, ctx.hotspots, ctx.grid, ctx.config, &mut *ctx.rng);
    goal.tile = choice.tile;
    goal.repath_timer = ctx.config.agents.repath.sample(&mut *ctx.rng);
}

/// Rejection-sample a walkable tile. Gives up after `attempts` draws and
/// returns the origin tile instead of failing.
pub fn random_walkable_tile(grid: &TileGrid, attempts: u32, rng: &mut impl Rng) -> TileCoord {
    for _ in 0..attempts {
        let tile = TileCoord::new(
            rng.gen_range(0..grid.width()) as i32,
            rng.gen_range(0..grid.height()) as i32,
        );
        if grid.is_walkable(tile) {
            return tile;
        }
    }
    warn!(
        "No walkable tile found after {} attempts, defaulting to {}",
        attempts,
        TileCoord::ORIGIN
    );
    TileCoord::ORIGIN
}
