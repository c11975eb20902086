// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! The simulation engine.
//!
//! The [`Engine`] owns the clock and the list of registered components. Each
//! call to [`step()`](Engine::step) ticks every component once and then
//! resolves all port state before advancing the clock.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use axis_track::entity::{Entity, toplevel};
use axis_track::tracker::stdout_tracker;
use axis_track::{Tracker, debug};

use crate::sim_error;
use crate::time::clock::Clock;
use crate::types::{Component, SimResult};

/// Number of ticks after which [`Engine::run()`] assumes the fabric has
/// stalled.
pub const DEFAULT_MAX_TICKS: u64 = 1_000_000;

pub struct Engine {
    clock: Clock,
    components: RefCell<Vec<Component>>,
    max_ticks: Cell<u64>,
    toplevel: Arc<Entity>,
    tracker: Tracker,
}

impl Engine {
    /// Create a standalone engine.
    #[must_use]
    pub fn new(tracker: &Tracker) -> Self {
        let toplevel = toplevel(tracker, "top");
        Self {
            clock: Clock::default(),
            components: RefCell::new(Vec::new()),
            max_ticks: Cell::new(DEFAULT_MAX_TICKS),
            toplevel,
            tracker: tracker.clone(),
        }
    }

    /// Add a component so that it is ticked every cycle.
    pub fn register(&self, component: Component) {
        self.components.borrow_mut().push(component);
    }

    /// Change the number of ticks [`run()`](Self::run) allows before
    /// reporting an error.
    pub fn set_max_ticks(&self, max_ticks: u64) {
        self.max_ticks.set(max_ticks);
    }

    /// Perform a single clock tick.
    pub fn step(&self) -> SimResult {
        let now = self.clock.tick_now();
        for component in self.components.borrow().iter() {
            component.tick(&now)?;
        }
        self.clock.advance();
        Ok(())
    }

    /// Step until there is no data left anywhere in the simulation.
    pub fn run(&self) -> SimResult {
        let start = self.clock.tick_now().tick();
        let max_ticks = self.max_ticks.get();
        while !self.is_quiescent() {
            if self.clock.tick_now().tick() - start >= max_ticks {
                return sim_error!(format!(
                    "{}: simulation still active after {max_ticks} ticks",
                    self.toplevel
                ));
            }
            self.step()?;
        }
        debug!(self.toplevel ; "Simulation complete at tick {}", self.clock.tick_now());
        Ok(())
    }

    /// Step a fixed number of ticks.
    pub fn run_for(&self, ticks: u64) -> SimResult {
        for _ in 0..ticks {
            self.step()?;
        }
        Ok(())
    }

    /// Returns true when all ports are empty and no component is busy.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.clock.is_idle() && !self.components.borrow().iter().any(|c| c.is_busy())
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.clock.time_now_ns()
    }

    #[must_use]
    pub fn top(&self) -> &Arc<Entity> {
        &self.toplevel
    }

    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.tracker.clone()
    }
}

/// Create a default engine that sends [`Track`](axis_track::Track) events to
/// stdout.
///
/// This is provided to keep documentation examples simple with fewer
/// concepts to have to consider at once.
impl Default for Engine {
    fn default() -> Self {
        let tracker = stdout_tracker(log::Level::Warn);
        Self::new(&tracker)
    }
}
