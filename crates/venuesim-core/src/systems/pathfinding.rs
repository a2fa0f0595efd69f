//! Local pathfinder - greedy one-step planner with congestion penalty.
//!
//! No lookahead: each call scores the four orthogonal neighbours by
//! Manhattan distance to the goal plus an occupancy penalty and a little
//! noise, and returns the cheapest. O(1) per agent per tick, which is what
//! lets thousands of agents repath every frame. Local minima are handled by
//! the caller (repath timer, stuck detection) rather than by search.

use rand::seq::SliceRandom;
use rand::Rng;

use super::occupancy::OccupancyField;
use crate::components::TileCoord;
use crate::config::PathTuning;
use crate::grid::TileGrid;

/// Result of a single planning step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Already standing on the goal
    Arrived,
    /// Walk into this neighbour next
    Move(TileCoord),
    /// Every neighbour is blocked; the caller should pick a new goal
    Stuck,
}

/// Plan the next tile from `from` toward `goal`.
///
/// Neighbour order is reshuffled on every call so ties don't always break
/// the same direction.
pub fn next_step(
    from: TileCoord,
    goal: TileCoord,
    grid: &TileGrid,
    occupancy: &OccupancyField,
    pathing: &PathTuning,
    rng: &mut impl Rng,
) -> Step {
    if from == goal {
        return Step::Arrived;
    }

    let mut candidates = from.neighbors();
    candidates.shuffle(rng);

    let mut best: Option<(TileCoord, f32)> = None;
    for neighbor in candidates {
        if !grid.is_walkable(neighbor) {
            continue;
        }
        let score = step_score(neighbor, goal, occupancy, pathing) + rng.gen::<f32>() * pathing.noise;
        match best {
            Some((_, best_score)) if best_score <= score => {}
            _ => best = Some((neighbor, score)),
        }
    }

    match best {
        Some((tile, _)) => Step::Move(tile),
        None => Step::Stuck,
    }
}

/// Deterministic part of a neighbour's score
pub fn step_score(
    neighbor: TileCoord,
    goal: TileCoord,
    occupancy: &OccupancyField,
    pathing: &PathTuning,
) -> f32 {
    neighbor.manhattan(&goal) as f32 + pathing.occupancy_penalty(occupancy.count(neighbor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn open_room() -> (TileGrid, OccupancyField) {
        let grid = TileGrid::walled_room(10, 10, 16.0).unwrap();
        let occupancy = OccupancyField::new(&grid);
        (grid, occupancy)
    }

    #[test]
    fn test_arrived_at_goal() {
        let (grid, occupancy) = open_room();
        let mut rng = StdRng::seed_from_u64(1);
        let tile = TileCoord::new(4, 4);
        let step = next_step(tile, tile, &grid, &occupancy, &PathTuning::default(), &mut rng);
        assert_eq!(step, Step::Arrived);
    }

    #[test]
    fn test_steps_toward_goal() {
        let (grid, occupancy) = open_room();
        let mut rng = StdRng::seed_from_u64(2);
        let from = TileCoord::new(2, 5);
        let goal = TileCoord::new(7, 5);

        for _ in 0..50 {
            let step = next_step(from, goal, &grid, &occupancy, &PathTuning::default(), &mut rng);
            assert_eq!(step, Step::Move(TileCoord::new(3, 5)));
        }
    }

    #[test]
    fn test_avoids_crowded_neighbor() {
        let (grid, mut occupancy) = open_room();
        let from = TileCoord::new(2, 5);
        let goal = TileCoord::new(4, 5);
        // One agent straight ahead: 1 + (2 + 3) = 6 beats the detours' 3
        occupancy.rebuild_from_tiles([TileCoord::new(3, 5)]);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            match next_step(from, goal, &grid, &occupancy, &PathTuning::default(), &mut rng) {
                Step::Move(tile) => assert_ne!(tile, TileCoord::new(3, 5)),
                other => panic!("expected a move, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_crowding_is_soft() {
        // Corridor one tile wide: the only way forward is through a crowd
        let grid = TileGrid::from_rows(&["#####", "#...#", "#####"], 16.0).unwrap();
        let mut occupancy = OccupancyField::new(&grid);
        occupancy.rebuild_from_tiles([TileCoord::new(2, 1); 4]);
        let mut rng = StdRng::seed_from_u64(4);

        let step = next_step(
            TileCoord::new(1, 1),
            TileCoord::new(3, 1),
            &grid,
            &occupancy,
            &PathTuning::default(),
            &mut rng,
        );
        assert_eq!(step, Step::Move(TileCoord::new(2, 1)));
    }

    #[test]
    fn test_stuck_when_enclosed() {
        let grid = TileGrid::from_rows(&["#####", "#.#.#", "#####"], 16.0).unwrap();
        let occupancy = OccupancyField::new(&grid);
        let mut rng = StdRng::seed_from_u64(5);

        let step = next_step(
            TileCoord::new(1, 1),
            TileCoord::new(3, 1),
            &grid,
            &occupancy,
            &PathTuning::default(),
            &mut rng,
        );
        assert_eq!(step, Step::Stuck);
    }

    #[test]
    fn test_ties_break_both_ways() {
        let (grid, occupancy) = open_room();
        let mut rng = StdRng::seed_from_u64(6);
        let from = TileCoord::new(3, 3);
        let goal = TileCoord::new(6, 6);

        let mut east = 0;
        let mut north = 0;
        for _ in 0..400 {
            match next_step(from, goal, &grid, &occupancy, &PathTuning::default(), &mut rng) {
                Step::Move(t) if t == TileCoord::new(4, 3) => east += 1,
                Step::Move(t) if t == TileCoord::new(3, 4) => north += 1,
                other => panic!("unexpected step {:?}", other),
            }
        }
        assert!(east > 100, "east chosen {} times", east);
        assert!(north > 100, "north chosen {} times", north);
    }
}
