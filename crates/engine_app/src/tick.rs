//! Fixed-rate frame driver.
//!
//! Each tick hands the engine the frame time in milliseconds and lets every
//! system run once. The loop sleeps off whatever is left of the frame budget
//! and warns when a frame overruns it.

use std::time::{Duration, Instant, TryFromFloatSecsError};

use serde::Deserialize;
use tracing::{debug, info, warn};

use engine_ecs::Engine;

/// Configuration for the tick loop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    /// Length of one frame.
    ///
    /// # Errors
    ///
    /// Fails if the rate is not positive, or so small that one frame does not
    /// fit in a [`Duration`].
    pub fn tick_duration(&self) -> Result<Duration, TryFromFloatSecsError> {
        Duration::try_from_secs_f64(1.0 / self.tick_rate)
    }
}

/// The tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    /// Current tick counter.
    tick_id: u64,
    /// Tick configuration.
    config: TickConfig,
    /// The engine being driven.
    engine: Engine,
}

impl TickLoop {
    /// Create a tick loop that drives `engine`.
    #[must_use]
    pub fn new(config: TickConfig, engine: Engine) -> Self {
        Self {
            tick_id: 0,
            config,
            engine,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns a reference to the engine.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns a mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Hand the engine back, consuming the loop.
    #[must_use]
    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Run one frame of `dt_ms` milliseconds.
    pub fn tick(&mut self, dt_ms: f64) {
        self.tick_id += 1;
        debug!(
            tick_id = self.tick_id,
            dt_ms,
            systems = self.engine.system_count(),
            entities = self.engine.entity_count(),
            "tick start"
        );
        self.engine.update(dt_ms);
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    ///
    /// Every frame is given the nominal frame time, so the simulation stays
    /// deterministic even when a frame overruns.
    ///
    /// # Errors
    ///
    /// Fails before the first tick if the configured rate has no valid frame
    /// length.
    pub fn run(&mut self) -> Result<(), TryFromFloatSecsError> {
        let tick_duration = self.config.tick_duration()?;
        let dt_ms = tick_duration.as_secs_f64() * 1000.0;
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(dt_ms);

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
