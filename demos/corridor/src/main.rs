//! corridor: two crowds swap ends of a corridor.
//!
//! Agents start packed at both ends of a 20 m corridor, wait a random
//! moment, then walk to the exit on the far side.  The behavior lives in
//! `corridor.toml` and the run parameters in `run.toml`; both paths can be
//! overridden on the command line:
//!
//! ```text
//! cargo run -p corridor -- [behavior.toml] [run.toml]
//! RUST_LOG=bfsm_behavior=debug cargo run -p corridor
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use glam::Vec2;

use bfsm_agent::{AgentStore, AgentStoreBuilder};
use bfsm_behavior::{Fsm, Registry, Resources, load_behavior_file};
use bfsm_core::{RunConfig, SimClock};
use bfsm_sim::{IntegratorBuilder, StepObserver};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:     usize = 200;
const CORRIDOR_LENGTH: f32   = 20.0;
/// Spacing of the starting grid, in metres.
const SPACING:         f32   = 0.4;
const ROWS:            usize = 9;
const REPORT_EVERY:    u64   = 50;

// ── Placement ─────────────────────────────────────────────────────────────────

/// Even agents start at the west end (class 0), odd ones at the east end
/// (class 1), each group on a grid `ROWS` agents wide.
fn place_agent(i: usize) -> (Vec2, u32) {
    let slot = i / 2;
    let y = ((slot % ROWS) as f32 - (ROWS / 2) as f32) * SPACING;
    let depth = (slot / ROWS) as f32 * SPACING;
    if i % 2 == 0 {
        (Vec2::new(depth, y), 0)
    } else {
        (Vec2::new(CORRIDOR_LENGTH - depth, y), 1)
    }
}

// ── Progress observer ─────────────────────────────────────────────────────────

struct Progress {
    started: Instant,
}

impl Progress {
    fn arrived(fsm: &Fsm) -> usize {
        fsm.states().iter().filter(|s| s.is_final()).map(|s| fsm.state_population(s.id())).sum()
    }
}

impl StepObserver for Progress {
    fn on_step_end(&mut self, clock: &SimClock, fsm: &Fsm, _agents: &AgentStore) {
        if clock.steps % REPORT_EVERY == 0 {
            println!("  t = {:>6.1}s  arrived {:>4} / {}", clock.time, Self::arrived(fsm), fsm.agent_count());
        }
    }

    fn on_finished(&mut self, clock: &SimClock) {
        println!("Finished at {clock} after {:.2?}", self.started.elapsed());
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();

    let here = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut args = std::env::args().skip(1);
    let behavior_path = args.next().map(PathBuf::from).unwrap_or_else(|| here.join("corridor.toml"));
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(|| here.join("run.toml"));

    // 1. Run configuration.
    let text = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: RunConfig =
        toml::from_str(&text).with_context(|| format!("parsing {}", config_path.display()))?;
    if let Some(n) = config.num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("configuring the rayon pool")?;
    }

    println!("=== corridor: bfsm behavior kernel ===");
    println!(
        "Agents: {AGENT_COUNT}  |  dt: {}s  |  max: {:?}s  |  Seed: {}",
        config.time_step, config.max_duration, config.seed
    );
    println!();

    // 2. Behavior description.
    let behavior = load_behavior_file(&behavior_path, &Registry::default(), &Resources::new())
        .with_context(|| format!("loading {}", behavior_path.display()))?;
    println!("Loaded {} states from {}", behavior.states.len(), behavior_path.display());

    // 3. Agents + integrator.
    let (store, rngs) = AgentStoreBuilder::new(AGENT_COUNT, config.seed).place(place_agent).build();
    let mut integrator = IntegratorBuilder::new(config, store, rngs, behavior).build()?;

    // 4. Run.
    let mut progress = Progress { started: Instant::now() };
    integrator.run(&mut progress)?;

    // 5. Summary.
    println!();
    let fsm = integrator.fsm();
    for state in fsm.states() {
        println!("  {:<10} {:>4}", state.name(), fsm.state_population(state.id()));
    }
    if !fsm.all_final() {
        tracing::warn!(arrived = Progress::arrived(fsm), total = fsm.agent_count(), "time ran out");
    }
    Ok(())
}
