//! VenueSim Headless Simulation Harness
//!
//! Runs the crowd engine through scripted scenarios and checks its
//! invariants. Runs entirely in-process, no rendering.
//!
//! Usage:
//!   cargo run -p venuesim-simtest
//!   cargo run -p venuesim-simtest -- --verbose
//!   cargo run -p venuesim-simtest -- --seed 7 --config tuning.json --json
//!
//! Set `RUST_LOG=debug` to see engine logging.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use venuesim_core::config::{FloatRange, SimConfig};
use venuesim_core::prelude::*;

// ── Venue layout (same JSON a front end would load) ─────────────────────
const LAYOUT_JSON: &str = include_str!("../../../data/venue_layout.json");

#[derive(Debug, Deserialize)]
struct VenueLayout {
    name: String,
    tile_size: f32,
    rows: Vec<String>,
    hotspots: Vec<HotspotSpec>,
}

#[derive(Debug, Deserialize)]
struct HotspotSpec {
    category: String,
    tile_type: u8,
}

impl VenueLayout {
    fn build(&self) -> Result<(TileGrid, HotspotRegistry), ConfigError> {
        let rows: Vec<&str> = self.rows.iter().map(String::as_str).collect();
        let grid = TileGrid::from_rows(&rows, self.tile_size)?;
        let mapping: Vec<(&str, u8)> = self
            .hotspots
            .iter()
            .map(|h| (h.category.as_str(), h.tile_type))
            .collect();
        let hotspots = HotspotRegistry::from_tile_types(&grid, &mapping);
        Ok((grid, hotspots))
    }
}

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

/// Headless crowd scenarios with invariant checks
#[derive(Debug, Parser)]
#[command(name = "venuesim-simtest", version, about, long_about = None)]
struct Options {
    /// Print every check, not just failures
    #[arg(long)]
    verbose: bool,
    /// Emit results as a JSON array
    #[arg(long)]
    json: bool,
    /// Override the configured seed
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Tuning file replacing the default configuration
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let options = Options::parse();

    let config = match load_config(&options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: could not load config: {}", e);
            std::process::exit(2);
        }
    };
    let verbose = options.verbose;
    if !options.json {
        println!("=== VenueSim Simulation Harness (seed {}) ===\n", config.seed);
    }

    let mut results = Vec::new();

    // 1. Layout and configuration
    results.extend(validate_layout(verbose));
    results.extend(validate_config(&config, verbose));

    // 2. Population spawning
    results.extend(validate_population(&config, verbose));

    // 3. Crowd run without disorder
    results.extend(validate_calm_crowd(&config, verbose));

    // 4. Ambient events under rising disorder
    results.extend(validate_disorder_ramp(&config, verbose));

    // 5. Determinism
    results.extend(validate_determinism(&config, verbose));

    // 6. Throughput
    results.extend(measure_throughput(&config, verbose));

    // ── Summary ──
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    if options.json {
        match serde_json::to_string_pretty(&results) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("error: could not encode results: {}", e),
        }
    } else {
        println!();
        for r in &results {
            let icon = if r.passed { "✓" } else { "✗" };
            if !r.passed || verbose {
                println!("  {} {}: {}", icon, r.name, r.detail);
            }
        }
        println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn load_config(options: &Options) -> Result<SimConfig, ConfigError> {
    let mut config = match &options.config {
        Some(path) => {
            info!("Loading tuning from {}", path.display());
            SimConfig::from_reader(BufReader::new(File::open(path)?))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn section(title: &str, verbose: bool) {
    if verbose {
        println!("--- {} ---", title);
    }
}

/// Fresh engine on the bundled layout, or a failed result explaining why
fn venue_engine(config: &SimConfig, name: &str) -> Result<SimulationEngine, TestResult> {
    let layout: VenueLayout = serde_json::from_str(LAYOUT_JSON).map_err(|e| TestResult {
        name: name.into(),
        passed: false,
        detail: format!("layout JSON parse error: {}", e),
    })?;
    let built = layout
        .build()
        .and_then(|(grid, hotspots)| SimulationEngine::new(grid, hotspots, config.clone()));
    built.map_err(|e| TestResult {
        name: name.into(),
        passed: false,
        detail: format!("engine setup failed: {}", e),
    })
}

fn invariant_violations(engine: &SimulationEngine) -> Vec<String> {
    let grid = engine.grid();
    let mut problems = Vec::new();
    for agent in engine.agents() {
        if !(0.0..=1.0).contains(&agent.need) {
            problems.push(format!("agent {} need {}", agent.index, agent.need));
        }
        if !grid.is_walkable(agent.tile) {
            problems.push(format!("agent {} on unwalkable {}", agent.index, agent.tile));
        }
        if agent.patience < 0.0 {
            problems.push(format!("agent {} patience {}", agent.index, agent.patience));
        }
        if agent.state == AgentState::Idle && agent.position != grid.tile_center(agent.tile) {
            problems.push(format!("agent {} idle off-centre", agent.index));
        }
    }
    problems
}

// ── 1. Layout & Config ──────────────────────────────────────────────────

fn validate_layout(verbose: bool) -> Vec<TestResult> {
    section("Venue Layout", verbose);
    let mut results = Vec::new();

    let layout: VenueLayout = match serde_json::from_str(LAYOUT_JSON) {
        Ok(l) => l,
        Err(e) => {
            results.push(TestResult {
                name: "layout_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    let (grid, hotspots) = match layout.build() {
        Ok(built) => built,
        Err(e) => {
            results.push(TestResult {
                name: "layout_build".into(),
                passed: false,
                detail: format!("{}: {}", layout.name, e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "layout_dimensions".into(),
        passed: grid.width() == 40 && grid.height() == 26,
        detail: format!(
            "{}: {}x{} tiles, {} walkable",
            layout.name,
            grid.width(),
            grid.height(),
            grid.walkable_count()
        ),
    });

    let missing: Vec<&str> = layout
        .hotspots
        .iter()
        .map(|h| h.category.as_str())
        .filter(|c| hotspots.tiles(c).is_empty())
        .collect();
    results.push(TestResult {
        name: "layout_hotspots_present".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            hotspots
                .categories()
                .map(|(name, tiles)| format!("{}={}", name, tiles.len()))
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            format!("no tiles for {:?}", missing)
        },
    });

    let check = hotspots.validate(&grid);
    results.push(TestResult {
        name: "layout_hotspots_walkable".into(),
        passed: check.is_ok(),
        detail: match check {
            Ok(()) => "all hotspot tiles walkable".into(),
            Err(e) => e.to_string(),
        },
    });

    results
}

fn validate_config(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Configuration", verbose);
    let mut results = Vec::new();

    let check = config.validate();
    results.push(TestResult {
        name: "config_valid".into(),
        passed: check.is_ok(),
        detail: match check {
            Ok(()) => format!("max_step {:.4}s, need rate {}/s", config.max_step, config.needs.rate),
            Err(e) => e.to_string(),
        },
    });

    let round_trip = config
        .to_json_pretty()
        .and_then(|json| SimConfig::from_json(&json));
    results.push(TestResult {
        name: "config_json_round_trip".into(),
        passed: matches!(&round_trip, Ok(c) if c.seed == config.seed
            && c.goals.weights == config.goals.weights),
        detail: match &round_trip {
            Ok(_) => "seed and weights survive JSON".into(),
            Err(e) => e.to_string(),
        },
    });

    let mut bad = config.clone();
    bad.ambient.hazard.slow_interval = 0.0;
    results.push(TestResult {
        name: "config_rejects_zero_interval".into(),
        passed: bad.validate().is_err(),
        detail: "zero spawn interval refused".into(),
    });

    results
}

// ── 2. Population ───────────────────────────────────────────────────────

fn validate_population(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Population", verbose);
    let mut results = Vec::new();

    let mut engine = match venue_engine(config, "population_setup") {
        Ok(e) => e,
        Err(r) => return vec![r],
    };

    for disorder in [0.0, 10.0, 1000.0] {
        engine.set_disorder(disorder);
        let target = engine.population_target();
        engine.repopulate(target);
        let agents = engine.agents();
        let at_rest = agents
            .iter()
            .all(|a| a.target == a.position && a.position == engine.grid().tile_center(a.tile));
        results.push(TestResult {
            name: format!("population_disorder_{}", disorder),
            passed: agents.len() == target && at_rest && target <= config.population.max,
            detail: format!("target {}, spawned {}, all at rest: {}", target, agents.len(), at_rest),
        });
    }

    results.push(TestResult {
        name: "population_occupancy_sum".into(),
        passed: engine.occupancy().total() as usize == engine.agent_count(),
        detail: format!(
            "{} agents, occupancy total {}, peak {}",
            engine.agent_count(),
            engine.occupancy().total(),
            engine.occupancy().peak()
        ),
    });

    results
}

// ── 3. Calm crowd ───────────────────────────────────────────────────────

fn validate_calm_crowd(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Calm Crowd", verbose);
    let mut results = Vec::new();

    // Start everyone above 0.5 so a dip below it can only come from relief
    let mut calm = config.clone();
    calm.agents.initial_need = FloatRange::new(0.6, 0.9);
    calm.max_step = calm.max_step.max(0.1);

    let mut engine = match venue_engine(&calm, "calm_setup") {
        Ok(e) => e,
        Err(r) => return vec![r],
    };
    engine.set_disorder(0.0);
    engine.repopulate(30);
    let started_high = engine.agents().iter().all(|a| a.need >= 0.5);

    let mut below_half = vec![false; engine.agent_count()];
    let mut violations = Vec::new();
    let mut occupancy_mismatch = 0;
    let mut idle_seen = 0usize;
    let mut max_hazards = 0usize;

    for tick in 0..1000 {
        engine.tick(0.1);
        if engine.occupancy().total() as usize != engine.agent_count() {
            occupancy_mismatch += 1;
        }
        max_hazards = max_hazards.max(engine.hazards().len());
        for agent in engine.agents() {
            if agent.need < 0.5 {
                below_half[agent.index as usize] = true;
            }
            if agent.state == AgentState::Idle {
                idle_seen += 1;
            }
        }
        if violations.is_empty() {
            violations = invariant_violations(&engine);
            if !violations.is_empty() {
                warn!("Invariant broken at tick {}", tick);
            }
        }
    }

    results.push(TestResult {
        name: "calm_invariants".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            format!("1000 ticks, {:.1}s simulated", engine.sim_time())
        } else {
            violations.join("; ")
        },
    });

    results.push(TestResult {
        name: "calm_occupancy_consistent".into(),
        passed: occupancy_mismatch == 0,
        detail: format!("{} ticks with mismatched occupancy", occupancy_mismatch),
    });

    results.push(TestResult {
        name: "calm_no_hazards".into(),
        passed: max_hazards == 0 && engine.ambient().hazards_spawned() == 0,
        detail: format!("peak hazards {}", max_hazards),
    });

    let relieved = below_half.iter().filter(|&&b| b).count();
    results.push(TestResult {
        name: "calm_need_relieved".into(),
        passed: started_high && relieved * 2 >= below_half.len(),
        detail: format!(
            "{}/{} agents relieved from above 0.5 in {:.0}s",
            relieved,
            below_half.len(),
            engine.sim_time()
        ),
    });

    results.push(TestResult {
        name: "calm_agents_dwell".into(),
        passed: idle_seen > 0,
        detail: format!("{} idle agent-ticks", idle_seen),
    });

    if verbose {
        println!(
            "  average need {:.3}, urgent (>0.7): {:?}",
            engine.average_need(),
            engine.find_urgent_agents(0.7)
        );
    }

    results
}

// ── 4. Disorder ramp ────────────────────────────────────────────────────

fn validate_disorder_ramp(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Disorder Ramp", verbose);
    let mut results = Vec::new();

    let mut engine = match venue_engine(config, "ramp_setup") {
        Ok(e) => e,
        Err(r) => return vec![r],
    };
    engine.repopulate(engine.population_target());

    let ambient = &config.ambient;
    let step = config.max_step;
    let mut spawned_below_threshold = false;
    let mut cap_exceeded = false;
    let mut bad_attention = false;

    // Ramp 0 → 25 over 25 simulated seconds
    let ticks = (25.0 / step).ceil() as usize;
    for i in 0..ticks {
        let disorder = 25.0 * i as f32 / ticks as f32;
        engine.set_disorder(disorder);
        let hazards_before = engine.ambient().hazards_spawned();
        let attention_before = engine.ambient().attention_spawned();
        engine.tick(step);

        if (!ambient.hazard.is_active(disorder) && engine.ambient().hazards_spawned() > hazards_before)
            || (!ambient.attention.is_active(disorder)
                && engine.ambient().attention_spawned() > attention_before)
        {
            spawned_below_threshold = true;
        }
        if engine.hazards().len() > ambient.hazard.cap(disorder)
            || engine.ambient().attention_count() > ambient.attention.cap(disorder)
        {
            cap_exceeded = true;
        }
        if engine
            .attention_markers()
            .iter()
            .any(|m| m.agent_index >= engine.agent_count())
        {
            bad_attention = true;
        }
    }

    results.push(TestResult {
        name: "ramp_threshold_gate".into(),
        passed: !spawned_below_threshold,
        detail: format!(
            "hazards from {}, attention from {}",
            ambient.hazard.threshold, ambient.attention.threshold
        ),
    });
    results.push(TestResult {
        name: "ramp_caps_respected".into(),
        passed: !cap_exceeded,
        detail: format!(
            "{} hazards / {} attention spawned in total",
            engine.ambient().hazards_spawned(),
            engine.ambient().attention_spawned()
        ),
    });
    results.push(TestResult {
        name: "ramp_attention_on_agents".into(),
        passed: !bad_attention,
        detail: format!("{} markers live", engine.attention_markers().len()),
    });
    results.push(TestResult {
        name: "ramp_events_happen".into(),
        passed: engine.ambient().hazards_spawned() > 0 && engine.ambient().attention_spawned() > 0,
        detail: "both marker kinds appeared".into(),
    });

    // Jump 5 → 20: the fast interval applies on the very next tick
    let mut engine = match venue_engine(config, "jump_setup") {
        Ok(e) => e,
        Err(r) => {
            results.push(r);
            return results;
        }
    };
    engine.repopulate(20);
    engine.set_disorder(5.0);
    engine.tick(step);
    let calm_cap = ambient.hazard.cap(engine.disorder());
    engine.set_disorder(20.0);
    engine.tick(step);
    let countdown = engine.ambient().hazard_countdown();
    results.push(TestResult {
        name: "jump_fast_tier".into(),
        passed: countdown <= ambient.hazard.fast_interval
            && ambient.hazard.cap(engine.disorder()) > calm_cap,
        detail: format!(
            "countdown {:.2}s, cap {} → {}",
            countdown,
            calm_cap,
            ambient.hazard.cap(engine.disorder())
        ),
    });

    results
}

// ── 5. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Determinism", verbose);

    let run = || -> Result<SimulationEngine, TestResult> {
        let mut engine = venue_engine(config, "determinism_setup")?;
        engine.repopulate(40);
        engine.set_disorder(18.0);
        for i in 0..400 {
            engine.tick(if i % 5 == 0 { 0.05 } else { 1.0 / 60.0 });
        }
        Ok(engine)
    };

    let (a, b) = match (run(), run()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(r), _) | (_, Err(r)) => return vec![r],
    };

    vec![TestResult {
        name: "determinism_same_seed".into(),
        passed: a.agents() == b.agents()
            && a.hazards() == b.hazards()
            && a.attention_markers() == b.attention_markers(),
        detail: format!("seed {} replayed over {} ticks", config.seed, a.tick_count()),
    }]
}

// ── 6. Throughput ───────────────────────────────────────────────────────

fn measure_throughput(config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    section("Throughput", verbose);

    let mut engine = match venue_engine(config, "throughput_setup") {
        Ok(e) => e,
        Err(r) => return vec![r],
    };
    engine.repopulate(config.population.max);
    engine.set_disorder(20.0);

    let ticks = 600;
    let start = Instant::now();
    for _ in 0..ticks {
        engine.tick(1.0 / 60.0);
    }
    let elapsed = start.elapsed().as_secs_f64();
    let rate = if elapsed > 0.0 { ticks as f64 / elapsed } else { f64::INFINITY };

    vec![TestResult {
        name: "throughput".into(),
        passed: engine.tick_count() == ticks,
        detail: format!(
            "{} agents: {} ticks in {:.1} ms ({:.0} ticks/s)",
            engine.agent_count(),
            ticks,
            elapsed * 1000.0,
            rate
        ),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = Options::try_parse_from(["venuesim-simtest"]).unwrap();
        assert!(!options.verbose);
        assert!(!options.json);
        assert_eq!(options.seed, None);
        assert_eq!(options.config, None);
    }

    #[test]
    fn test_options_all_flags() {
        let options = Options::try_parse_from([
            "venuesim-simtest",
            "--verbose",
            "--json",
            "--seed",
            "7",
            "--config",
            "tuning.json",
        ])
        .unwrap();
        assert!(options.verbose && options.json);
        assert_eq!(options.seed, Some(7));
        assert_eq!(options.config, Some(PathBuf::from("tuning.json")));
    }

    #[test]
    fn test_options_reject_bad_input() {
        assert!(Options::try_parse_from(["venuesim-simtest", "--seed", "many"]).is_err());
        assert!(Options::try_parse_from(["venuesim-simtest", "--seed"]).is_err());
        assert!(Options::try_parse_from(["venuesim-simtest", "--frobnicate"]).is_err());
    }

    #[test]
    fn test_calm_crowd_relief_is_measured_from_high_need() {
        let config = SimConfig::default();
        let results = validate_calm_crowd(&config, false);
        let relief = results
            .iter()
            .find(|r| r.name == "calm_need_relieved")
            .unwrap();
        assert!(relief.detail.contains("/30 agents relieved"), "{}", relief.detail);
        assert!(results.iter().any(|r| r.name == "calm_invariants" && r.passed));
    }
}
