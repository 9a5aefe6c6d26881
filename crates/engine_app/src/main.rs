//! # engine_app
//!
//! Runs the drifting-particles demo on the family-indexed ECS.
//!
//! ## Startup Sequence
//!
//! 1. Load the JSON config file, if one was given, then apply CLI overrides.
//! 2. Register the demo systems and spawn the initial entities.
//! 3. Enter the fixed-rate tick loop.
//!
//! Logging follows `RUST_LOG`; `engine_app=info` is always enabled. Use
//! `RUST_LOG=engine_ecs=debug` to watch entity, family, and system
//! lifecycle.

mod config;
mod demo;
mod tick;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_ecs::Engine;

use config::AppConfig;
use tick::TickLoop;

#[derive(Parser)]
#[command(name = "engine_app", about = "Drifting-particles demo on the family-indexed ECS")]
struct Args {
    /// JSON config file; CLI flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target ticks per second
    #[arg(short, long)]
    tick_rate: Option<f64>,

    /// Stop after this many ticks (0 = run until interrupted)
    #[arg(short, long)]
    max_ticks: Option<u64>,

    /// Number of entities to spawn
    #[arg(short, long)]
    entities: Option<usize>,

    /// Base entity lifetime in milliseconds (0 = immortal)
    #[arg(short, long)]
    lifetime_ms: Option<f64>,
}

impl Args {
    /// Resolve the final config: defaults, then file, then flags.
    fn resolve(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(tick_rate) = self.tick_rate {
            config.tick.tick_rate = tick_rate;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.tick.max_ticks = max_ticks;
        }
        if let Some(entities) = self.entities {
            config.demo.entity_count = entities;
        }
        if let Some(lifetime_ms) = self.lifetime_ms {
            config.demo.lifetime_ms = lifetime_ms;
        }

        config.tick.tick_duration().with_context(|| {
            format!(
                "tick rate {} has no valid frame length; it must be positive and not vanishingly small",
                config.tick.tick_rate
            )
        })?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let config = Args::parse().resolve()?;
    info!(?config, "engine starting");

    let mut engine = Engine::new();
    let census = demo::install(&mut engine, &config.demo);
    demo::spawn(&mut engine, &config.demo);
    info!(
        entities = engine.entity_count(),
        systems = engine.system_count(),
        families = engine.family_count(),
        "world populated"
    );

    let mut tick_loop = TickLoop::new(config.tick, engine);
    tick_loop.run().context("invalid tick rate")?;

    let counts = census.borrow().counts();
    info!(
        ticks = tick_loop.tick_id(),
        population = census.borrow().population(),
        joined = counts.joined(),
        left = counts.left(),
        "engine shut down"
    );
    Ok(())
}
