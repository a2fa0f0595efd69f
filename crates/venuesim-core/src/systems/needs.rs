//! Needs system - urge growth, relief at hotspots, idle dwell after arrival

use hecs::World;
use rand::Rng;

use super::SimContext;
use crate::components::{Agent, Needs, Patience, TileCoord};

/// Grow every agent's urge by `amount`, clamped at 1.0.
/// Runs every tick whatever state the agent is in.
pub fn needs_system(world: &mut World, amount: f32) {
    for (_, (_, needs)) in world.query_mut::<(&Agent, &mut Needs)>() {
        needs.grow(amount);
    }
}

/// Reset the urge if `tile` belongs to the relieving category.
/// Returns true when relief happened.
pub fn relieve_at<R: Rng>(needs: &mut Needs, tile: TileCoord, ctx: &SimContext<'_, R>) -> bool {
    if ctx.hotspots.contains(&ctx.config.needs.urge_category, tile) {
        needs.relieve(ctx.config.needs.relief_level);
        true
    } else {
        false
    }
}

/// Start the idle dwell that follows a goal arrival
pub fn begin_dwell<R: Rng>(patience: &mut Patience, ctx: &mut SimContext<'_, R>) {
    patience.remaining = ctx.config.agents.dwell.sample(&mut *ctx.rng).max(0.0);
}

/// Roster indices of agents whose urge exceeds `threshold`, ascending
pub fn find_urgent_agents(world: &World, threshold: f32) -> Vec<u32> {
    let mut urgent: Vec<u32> = world
        .query::<(&Agent, &Needs)>()
        .iter()
        .filter(|(_, (_, needs))| needs.urge > threshold)
        .map(|(_, (agent, _))| agent.index)
        .collect();
    urgent.sort_unstable();
    urgent
}

/// Mean urge over the population, 0 when empty
pub fn average_need(world: &World) -> f32 {
    let mut query = world.query::<(&Agent, &Needs)>();
    let (sum, count) = query
        .iter()
        .fold((0.0f32, 0usize), |(sum, count), (_, (_, needs))| {
            (sum + needs.urge, count + 1)
        });
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::grid::TileGrid;
    use crate::hotspots::{categories, HotspotRegistry};
    use crate::systems::OccupancyField;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_needs_grow_and_clamp() {
        let mut world = World::new();
        world.spawn((Agent { index: 0 }, Needs::new(0.2)));
        world.spawn((Agent { index: 1 }, Needs::new(0.95)));

        needs_system(&mut world, 0.1);

        let mut urges: Vec<f32> = world
            .query::<&Needs>()
            .iter()
            .map(|(_, n)| n.urge)
            .collect();
        urges.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((urges[0] - 0.3).abs() < 1e-6);
        assert_eq!(urges[1], 1.0);
    }

    #[test]
    fn test_relief_only_at_urge_category() {
        let grid = TileGrid::walled_room(8, 8, 16.0).unwrap();
        let hotspots = HotspotRegistry::new()
            .with_category(categories::RESTROOM, vec![TileCoord::new(1, 1)])
            .with_category(categories::BAR, vec![TileCoord::new(5, 5)]);
        let occupancy = OccupancyField::new(&grid);
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let ctx = SimContext {
            grid: &grid,
            hotspots: &hotspots,
            occupancy: &occupancy,
            config: &config,
            rng: &mut rng,
        };

        let mut needs = Needs::new(0.9);
        assert!(!relieve_at(&mut needs, TileCoord::new(5, 5), &ctx));
        assert_eq!(needs.urge, 0.9);

        assert!(relieve_at(&mut needs, TileCoord::new(1, 1), &ctx));
        assert!((needs.urge - config.needs.relief_level).abs() < 1e-6);
    }

    #[test]
    fn test_dwell_within_range() {
        let grid = TileGrid::walled_room(4, 4, 16.0).unwrap();
        let hotspots = HotspotRegistry::new();
        let occupancy = OccupancyField::new(&grid);
        let config = SimConfig::default();
        let mut rng = StdRng::seed_from_u64(10);
        let mut ctx = SimContext {
            grid: &grid,
            hotspots: &hotspots,
            occupancy: &occupancy,
            config: &config,
            rng: &mut rng,
        };

        let mut patience = Patience::default();
        for _ in 0..100 {
            begin_dwell(&mut patience, &mut ctx);
            assert!(patience.remaining >= config.agents.dwell.min);
            assert!(patience.remaining <= config.agents.dwell.max);
        }
    }

    #[test]
    fn test_find_urgent_agents() {
        let mut world = World::new();
        world.spawn((Agent { index: 2 }, Needs::new(0.9)));
        world.spawn((Agent { index: 0 }, Needs::new(0.1)));
        world.spawn((Agent { index: 1 }, Needs::new(0.75)));

        assert_eq!(find_urgent_agents(&world, 0.7), vec![1, 2]);
        assert!((average_need(&world) - (0.9 + 0.1 + 0.75) / 3.0).abs() < 1e-6);
        assert_eq!(average_need(&World::new()), 0.0);
    }
}
