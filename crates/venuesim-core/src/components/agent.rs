//! Agent components: roster index, tile/world position, movement, goal,
//! needs, patience and tint.

use serde::{Deserialize, Serialize};

use super::common::{TileCoord, Vec2};

/// Marks an entity as a venue agent and records its roster index
/// (spawn order, `0..population`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub index: u32,
}

/// The tile the agent currently stands on. Only updated on arrival, so it
/// always names a walkable tile even mid-glide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TilePosition(pub TileCoord);

/// Continuous world position used for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// Glide state toward the centre of the next tile step
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Movement {
    /// World-space centre of the next tile
    pub target: Vec2,
    /// Tiles per second
    pub speed: f32,
}

impl Movement {
    /// A stationary movement: the target is the current position.
    pub fn at_rest(position: Vec2, speed: f32) -> Self {
        Self {
            target: position,
            speed,
        }
    }
}

/// Current destination and the countdown until it is voluntarily dropped
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Goal {
    pub tile: TileCoord,
    /// Seconds until a new goal is forced
    pub repath_timer: f32,
}

/// Need that drives the urge hotspot category - 0.0 (satisfied) to 1.0 (desperate)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Needs {
    pub urge: f32,
}

impl Needs {
    pub fn new(urge: f32) -> Self {
        Self {
            urge: urge.clamp(0.0, 1.0),
        }
    }

    /// Needs only ever rise with time
    pub fn grow(&mut self, amount: f32) {
        self.urge = (self.urge + amount.max(0.0)).clamp(0.0, 1.0);
    }

    /// Drop the urge to `level` after visiting the relieving category
    pub fn relieve(&mut self, level: f32) {
        self.urge = level.clamp(0.0, 1.0);
    }
}

/// Idle dwell after reaching a goal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Patience {
    pub remaining: f32,
}

impl Patience {
    pub fn is_idle(&self) -> bool {
        self.remaining > 0.0
    }

    /// Count down, never below zero
    pub fn tick(&mut self, delta_seconds: f32) {
        self.remaining = (self.remaining - delta_seconds).max(0.0);
    }
}

/// Render colour, fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Derived visual state exposed in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Gliding toward the next tile, or about to pick one
    Moving,
    /// Dwelling at a reached goal
    Idle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_clamped() {
        let mut needs = Needs::new(0.9);
        needs.grow(0.5);
        assert_eq!(needs.urge, 1.0);

        needs.grow(-3.0);
        assert_eq!(needs.urge, 1.0);

        needs.relieve(0.05);
        assert!((needs.urge - 0.05).abs() < f32::EPSILON);

        assert_eq!(Needs::new(-2.0).urge, 0.0);
    }

    #[test]
    fn test_patience_floor() {
        let mut patience = Patience { remaining: 0.3 };
        assert!(patience.is_idle());
        patience.tick(1.0);
        assert_eq!(patience.remaining, 0.0);
        assert!(!patience.is_idle());
    }
}
