//! Ambient event generator - transient hazards and attention markers.
//!
//! Coupled to the crowd only through the external disorder scalar. Two
//! independent populations, each gated by a disorder threshold, spawning on
//! a two-tier interval, capped by a disorder-scaled limit (oldest evicted
//! first) and decaying over a finite lifetime.

use std::collections::VecDeque;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::Vec2;
use crate::config::AmbientConfig;

/// A floor hazard (spill) placed somewhere in the play area
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hazard {
    pub position: Vec2,
    pub radius: f32,
    pub life: f32,
    pub max_life: f32,
}

/// An attention bubble over an agent. The agent is chosen lazily, once the
/// population size is known.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AttentionMarker {
    pub agent_index: Option<usize>,
    pub life: f32,
    pub max_life: f32,
}

/// Render view of a hazard
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardSnapshot {
    pub position: Vec2,
    pub radius: f32,
    /// Remaining life, 1.0 fresh to 0.0 expiring
    pub life_fraction: f32,
}

/// Render view of an attention marker, positioned over its agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttentionSnapshot {
    pub agent_index: usize,
    pub position: Vec2,
    pub radius: f32,
    pub life_fraction: f32,
}

/// Both marker populations and their spawn countdowns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AmbientEvents {
    hazards: VecDeque<Hazard>,
    attention: VecDeque<AttentionMarker>,
    hazard_timer: f32,
    attention_timer: f32,
    /// Markers spawned since creation, for reporting
    hazards_spawned: u64,
    attention_spawned: u64,
}

impl AmbientEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance both populations by `delta_seconds`.
    ///
    /// `play_area` is the world-space rectangle `(min, max)` hazards may land
    /// in before the margin is applied. `agent_count` resolves attention
    /// markers still waiting for an agent.
    pub fn update(
        &mut self,
        delta_seconds: f32,
        disorder: f32,
        play_area: (Vec2, Vec2),
        agent_count: usize,
        config: &AmbientConfig,
        rng: &mut impl Rng,
    ) {
        decay(&mut self.hazards, delta_seconds, |h| &mut h.life);
        decay(&mut self.attention, delta_seconds, |m| &mut m.life);

        if config.attention.is_active(disorder)
            && spawn_due(&mut self.attention_timer, delta_seconds, config.attention.interval(disorder))
        {
            let max_life = config.attention.lifetime.sample(rng);
            self.attention.push_back(AttentionMarker {
                agent_index: None,
                life: max_life,
                max_life,
            });
            self.attention_spawned += 1;
        }

        if config.hazard.is_active(disorder)
            && spawn_due(&mut self.hazard_timer, delta_seconds, config.hazard.interval(disorder))
        {
            let (min, max) = play_area;
            let margin = config.hazard_margin;
            let x = sample_span(min.x + margin, max.x - margin, rng);
            let y = sample_span(min.y + margin, max.y - margin, rng);
            let radius = config.hazard_radius.sample(rng);
            let max_life = config.hazard.lifetime.sample(rng);
            self.hazards.push_back(Hazard {
                position: Vec2::new(x, y),
                radius,
                life: max_life,
                max_life,
            });
            self.hazards_spawned += 1;
        }

        enforce_cap(&mut self.hazards, config.hazard.cap(disorder), "hazard");
        enforce_cap(&mut self.attention, config.attention.cap(disorder), "attention");

        self.resolve_attention(agent_count, rng);
    }

    /// Bind unassigned (or now out-of-range) attention markers to a random agent
    fn resolve_attention(&mut self, agent_count: usize, rng: &mut impl Rng) {
        for marker in self.attention.iter_mut() {
            let valid = matches!(marker.agent_index, Some(i) if i < agent_count);
            if !valid {
                marker.agent_index = if agent_count > 0 {
                    Some(rng.gen_range(0..agent_count))
                } else {
                    None
                };
            }
        }
    }

    pub fn hazards(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.iter()
    }

    pub fn attention(&self) -> impl Iterator<Item = &AttentionMarker> {
        self.attention.iter()
    }

    pub fn hazard_count(&self) -> usize {
        self.hazards.len()
    }

    pub fn attention_count(&self) -> usize {
        self.attention.len()
    }

    pub fn hazards_spawned(&self) -> u64 {
        self.hazards_spawned
    }

    pub fn attention_spawned(&self) -> u64 {
        self.attention_spawned
    }

    /// Seconds until the next hazard may spawn
    pub fn hazard_countdown(&self) -> f32 {
        self.hazard_timer
    }

    pub fn attention_countdown(&self) -> f32 {
        self.attention_timer
    }

    pub fn hazard_snapshots(&self) -> Vec<HazardSnapshot> {
        self.hazards
            .iter()
            .map(|h| HazardSnapshot {
                position: h.position,
                radius: h.radius,
                life_fraction: life_fraction(h.life, h.max_life),
            })
            .collect()
    }

    /// Attention markers placed over their agents. `agent_positions` is
    /// indexed by roster index; markers without a live agent are skipped.
    pub fn attention_snapshots(
        &self,
        agent_positions: &[Vec2],
        tile_size: f32,
        config: &AmbientConfig,
    ) -> Vec<AttentionSnapshot> {
        self.attention
            .iter()
            .filter_map(|m| {
                let index = m.agent_index?;
                let anchor = agent_positions.get(index)?;
                Some(AttentionSnapshot {
                    agent_index: index,
                    position: Vec2::new(anchor.x, anchor.y + config.attention_offset * tile_size),
                    radius: config.attention_radius * tile_size,
                    life_fraction: life_fraction(m.life, m.max_life),
                })
            })
            .collect()
    }
}

/// Count down a spawn timer. A countdown longer than the current interval
/// is cut to it first, so moving into the fast tier takes effect at once.
fn spawn_due(timer: &mut f32, delta_seconds: f32, interval: f32) -> bool {
    if *timer > interval {
        *timer = interval;
    }
    *timer -= delta_seconds;
    if *timer <= 0.0 {
        *timer = interval;
        true
    } else {
        false
    }
}

fn decay<T>(markers: &mut VecDeque<T>, delta_seconds: f32, life: impl Fn(&mut T) -> &mut f32) {
    markers.retain_mut(|m| {
        let remaining = life(m);
        *remaining -= delta_seconds;
        *remaining > 0.0
    });
}

fn enforce_cap<T>(markers: &mut VecDeque<T>, cap: usize, kind: &str) {
    let mut evicted = 0;
    while markers.len() > cap {
        markers.pop_front();
        evicted += 1;
    }
    if evicted > 0 {
        debug!("Evicted {} oldest {} marker(s), cap {}", evicted, kind, cap);
    }
}

/// Uniform in `[lo, hi)`, or the midpoint when the span is inverted
fn sample_span(lo: f32, hi: f32, rng: &mut impl Rng) -> f32 {
    if hi > lo {
        lo + rng.gen::<f32>() * (hi - lo)
    } else {
        (lo + hi) * 0.5
    }
}

fn life_fraction(life: f32, max_life: f32) -> f32 {
    if max_life > 0.0 {
        (life / max_life).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
