//! Simulation tuning - every magic number the crowd and ambient systems use.
//!
//! Defaults suit a mid-sized venue of a few dozen agents; all values can be overridden
//! from JSON. Missing fields fall back to their defaults.

use std::collections::BTreeMap;
use std::io::Read;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::hotspots::categories;

/// Inclusive-exclusive float range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `min + u * (max - min)` with `u` in `[0, 1)`. A degenerate range
    /// returns `min` but still consumes one draw so the stream stays aligned.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        let u: f32 = rng.gen();
        self.min + u * (self.max - self.min)
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(ConfigError::InvalidParameter {
                name,
                reason: format!("range [{}, {}] is not ordered and finite", self.min, self.max),
            });
        }
        Ok(())
    }
}

/// Top-level configuration for a [`SimulationEngine`](crate::engine::SimulationEngine)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for the single simulation RNG
    pub seed: u64,
    /// Largest step a single tick may advance, in seconds
    pub max_step: f32,
    /// Multiplier applied to the clamped step (0 pauses)
    pub time_scale: f32,
    pub agents: AgentTuning,
    pub needs: NeedTuning,
    pub goals: GoalTuning,
    pub pathing: PathTuning,
    pub population: PopulationConfig,
    pub ambient: AmbientConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            max_step: 1.0 / 30.0,
            time_scale: 1.0,
            agents: AgentTuning::default(),
            needs: NeedTuning::default(),
            goals: GoalTuning::default(),
            pathing: PathTuning::default(),
            population: PopulationConfig::default(),
            ambient: AmbientConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse from a JSON string and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from any reader (file, stdin) and validate
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject values that would make the tick loop misbehave
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_step", self.max_step)?;
        non_negative("time_scale", self.time_scale)?;

        self.agents.speed.check("agents.speed")?;
        positive("agents.speed.min", self.agents.speed.min)?;
        self.agents.repath.check("agents.repath")?;
        positive("agents.repath.min", self.agents.repath.min)?;
        self.agents.dwell.check("agents.dwell")?;
        non_negative("agents.dwell.min", self.agents.dwell.min)?;
        self.agents.initial_need.check("agents.initial_need")?;
        unit("agents.initial_need.min", self.agents.initial_need.min)?;
        unit("agents.initial_need.max", self.agents.initial_need.max)?;
        self.agents.tint_r.check("agents.tint_r")?;
        self.agents.tint_g.check("agents.tint_g")?;
        self.agents.tint_b.check("agents.tint_b")?;

        non_negative("needs.rate", self.needs.rate)?;
        non_negative("needs.gain", self.needs.gain)?;
        unit("needs.relief_level", self.needs.relief_level)?;

        non_negative("goals.default_weight", self.goals.default_weight)?;
        for weight in self.goals.weights.values() {
            non_negative("goals.weights", *weight)?;
        }
        if self.goals.random_tile_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "goals.random_tile_attempts",
                reason: "must be at least 1".into(),
            });
        }

        non_negative("pathing.penalty_base", self.pathing.penalty_base)?;
        non_negative("pathing.penalty_per_occupant", self.pathing.penalty_per_occupant)?;
        non_negative("pathing.noise", self.pathing.noise)?;
        non_negative("pathing.snap_distance", self.pathing.snap_distance)?;

        non_negative("population.per_disorder", self.population.per_disorder)?;

        self.ambient.hazard.check("ambient.hazard")?;
        self.ambient.attention.check("ambient.attention")?;
        self.ambient.hazard_radius.check("ambient.hazard_radius")?;
        non_negative("ambient.hazard_margin", self.ambient.hazard_margin)?;
        non_negative("ambient.attention_radius", self.ambient.attention_radius)?;
        if !self.ambient.attention_offset.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "ambient.attention_offset",
                reason: "must be finite".into(),
            });
        }
        Ok(())
    }
}

/// Per-agent spawn ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentTuning {
    /// Tiles per second
    pub speed: FloatRange,
    /// Seconds between forced goal changes
    pub repath: FloatRange,
    /// Idle seconds after reaching a goal
    pub dwell: FloatRange,
    /// Urge at spawn
    pub initial_need: FloatRange,
    pub tint_r: FloatRange,
    pub tint_g: FloatRange,
    pub tint_b: FloatRange,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            speed: FloatRange::new(2.0, 4.0),
            repath: FloatRange::new(1.5, 4.5),
            dwell: FloatRange::new(0.5, 2.0),
            initial_need: FloatRange::new(0.0, 0.4),
            tint_r: FloatRange::new(0.8, 1.0),
            tint_g: FloatRange::new(0.6, 0.9),
            tint_b: FloatRange::new(0.2, 0.5),
        }
    }
}

/// Urge growth and relief
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedTuning {
    /// Urge gained per second
    pub rate: f32,
    /// Hotspot category whose weight scales with urge and which relieves it
    pub urge_category: String,
    /// Extra weight per unit of urge for the urge category
    pub gain: f32,
    /// Urge after visiting the relieving category
    pub relief_level: f32,
}

impl Default for NeedTuning {
    fn default() -> Self {
        Self {
            rate: 0.02,
            urge_category: categories::RESTROOM.to_string(),
            gain: 6.0,
            relief_level: 0.05,
        }
    }
}

/// Category weights for the goal draw
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalTuning {
    /// Base weight per category name
    pub weights: BTreeMap<String, f32>,
    /// Base weight for categories not listed in `weights`
    pub default_weight: f32,
    /// Rejection-sampling budget for a random walkable tile
    pub random_tile_attempts: u32,
}

impl GoalTuning {
    pub fn base_weight(&self, category: &str) -> f32 {
        self.weights
            .get(category)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

impl Default for GoalTuning {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(categories::BAR.to_string(), 3.0);
        weights.insert(categories::DINING.to_string(), 2.0);
        weights.insert(categories::RESTROOM.to_string(), 0.5);
        Self {
            weights,
            default_weight: 1.0,
            random_tile_attempts: 5000,
        }
    }
}

/// Local pathfinder and motion constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTuning {
    /// Penalty for stepping onto any occupied tile
    pub penalty_base: f32,
    /// Additional penalty per occupant
    pub penalty_per_occupant: f32,
    /// Upper bound of the uniform tie-break noise
    pub noise: f32,
    /// Snap distance as a fraction of the tile size
    pub snap_distance: f32,
}

impl PathTuning {
    /// 0 for an empty tile, `base + per * count` otherwise
    pub fn occupancy_penalty(&self, count: u32) -> f32 {
        if count == 0 {
            0.0
        } else {
            self.penalty_base + self.penalty_per_occupant * count as f32
        }
    }
}

impl Default for PathTuning {
    fn default() -> Self {
        Self {
            penalty_base: 2.0,
            penalty_per_occupant: 3.0,
            noise: 0.25,
            snap_distance: 0.03,
        }
    }
}

/// How many agents the venue should hold for a given disorder level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub base: usize,
    pub per_disorder: f32,
    pub max: usize,
}

impl PopulationConfig {
    /// `base + floor(disorder * per_disorder)`, clamped to `max`
    pub fn target(&self, disorder: f32) -> usize {
        let extra = if disorder.is_finite() && disorder > 0.0 {
            (disorder * self.per_disorder).floor() as usize
        } else {
            0
        };
        self.base.saturating_add(extra).min(self.max)
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            base: 30,
            per_disorder: 1.0,
            max: 200,
        }
    }
}

/// Spawn gating, rate and cap for one ambient marker population
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerTuning {
    /// Below this disorder nothing spawns
    pub threshold: f32,
    /// At or above this disorder the fast interval applies
    pub fast_threshold: f32,
    pub slow_interval: f32,
    pub fast_interval: f32,
    pub cap_base: usize,
    pub cap_per_disorder: f32,
    /// Seconds a marker lives
    pub lifetime: FloatRange,
}

impl MarkerTuning {
    pub fn is_active(&self, disorder: f32) -> bool {
        disorder >= self.threshold
    }

    /// Two-tier spawn interval
    pub fn interval(&self, disorder: f32) -> f32 {
        if disorder >= self.fast_threshold {
            self.fast_interval
        } else {
            self.slow_interval
        }
    }

    /// Concurrent marker cap at this disorder
    pub fn cap(&self, disorder: f32) -> usize {
        let extra = if disorder.is_finite() && disorder > 0.0 {
            (disorder * self.cap_per_disorder).floor() as usize
        } else {
            0
        };
        self.cap_base.saturating_add(extra)
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        positive(name, self.slow_interval)?;
        positive(name, self.fast_interval)?;
        non_negative(name, self.cap_per_disorder)?;
        self.lifetime.check(name)?;
        positive(name, self.lifetime.min)
    }
}

impl Default for MarkerTuning {
    fn default() -> Self {
        Self::hazards()
    }
}

impl MarkerTuning {
    /// Floor hazards: appear from disorder 6, frequent from 16
    pub fn hazards() -> Self {
        Self {
            threshold: 6.0,
            fast_threshold: 16.0,
            slow_interval: 1.8,
            fast_interval: 0.8,
            cap_base: 8,
            cap_per_disorder: 1.0,
            lifetime: FloatRange::new(8.0, 18.0),
        }
    }

    /// Attention bubbles over agents: appear from disorder 10, frequent from 18
    pub fn attention() -> Self {
        Self {
            threshold: 10.0,
            fast_threshold: 18.0,
            slow_interval: 1.4,
            fast_interval: 0.6,
            cap_base: 5,
            cap_per_disorder: 0.25,
            lifetime: FloatRange::new(1.2, 1.2),
        }
    }
}

/// Ambient event generator tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientConfig {
    pub hazard: MarkerTuning,
    pub attention: MarkerTuning,
    /// Hazard radius in world units
    pub hazard_radius: FloatRange,
    /// World-unit inset from the grid edge for hazard placement
    pub hazard_margin: f32,
    /// Vertical offset of an attention marker above its agent, in tiles
    pub attention_offset: f32,
    /// Attention marker radius, in tiles
    pub attention_radius: f32,
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            hazard: MarkerTuning::hazards(),
            attention: MarkerTuning::attention(),
            hazard_radius: FloatRange::new(10.0, 28.0),
            hazard_margin: 20.0,
            attention_offset: 0.6,
            attention_radius: 0.3,
        }
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{} must be positive", value),
        })
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{} must be non-negative", value),
        })
    }
}

fn unit(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("{} must lie in [0, 1]", value),
        })
    }
}
