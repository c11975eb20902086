// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! This module represents the time during a simulation.
//!
//! Time is a count of clock ticks. At the end of every tick the clock resolves
//! all registered port states before moving on.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::traits::{Resolve, Resolver};

/// ClockTick structure for representing a number of Clock ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTick {
    /// Clock ticks.
    tick: u64,
}

impl ClockTick {
    #[must_use]
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    /// Get the current clock tick.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Change the default constructor value of `tick`.
    pub fn set_tick(&mut self, tick: u64) -> ClockTick {
        self.tick = tick;
        *self
    }
}

impl std::fmt::Display for ClockTick {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.tick)
    }
}

/// Shared state between the users of a Clock and the Clock itself.
pub struct ClockState {
    now: Cell<ClockTick>,

    /// Registered [`Resolve`] functions. These persist for the whole
    /// simulation and are called at the end of every tick.
    to_resolve: RefCell<Vec<Rc<dyn Resolve + 'static>>>,
}

#[derive(Clone)]
/// State representing a clock.
pub struct Clock {
    /// Frequency of the clock in MHz.
    freq_mhz: f64,

    shared_state: Rc<ClockState>,
}

impl Clock {
    /// Create a new [Clock] at the specified frequency.
    #[must_use]
    pub fn new(freq_mhz: f64) -> Self {
        let shared_state = Rc::new(ClockState {
            now: Cell::new(ClockTick::new()),
            to_resolve: RefCell::new(Vec::new()),
        });

        Self {
            freq_mhz,
            shared_state,
        }
    }

    /// Returns the clocks frequency in MHz.
    #[must_use]
    pub fn freq_mhz(&self) -> f64 {
        self.freq_mhz
    }

    /// Returns the current [ClockTick].
    #[must_use]
    pub fn tick_now(&self) -> ClockTick {
        self.shared_state.now.get()
    }

    /// Returns the current time in `ns`.
    #[must_use]
    pub fn time_now_ns(&self) -> f64 {
        self.to_ns(&self.tick_now())
    }

    /// Convert the given [ClockTick] to a time in `ns` for this clock.
    #[must_use]
    pub fn to_ns(&self, clock_time: &ClockTick) -> f64 {
        clock_time.tick as f64 / self.freq_mhz * 1000.0
    }

    /// Resolve all registered state and move to the next tick.
    pub fn advance(&self) {
        for r in self.shared_state.to_resolve.borrow().iter() {
            r.resolve();
        }
        let mut now = self.tick_now();
        now.tick += 1;
        self.shared_state.now.set(now);
    }

    /// Returns true when none of the registered state holds data.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.shared_state
            .to_resolve
            .borrow()
            .iter()
            .all(|r| r.is_idle())
    }
}

/// The default clocks is simply to use a 1GHz clock so ticks are 1ns.
impl Default for Clock {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

impl Resolver for Clock {
    fn add_resolve(&self, resolve: Rc<dyn Resolve + 'static>) {
        self.shared_state.to_resolve.borrow_mut().push(resolve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        resolved: Cell<usize>,
    }

    impl Resolve for Counter {
        fn resolve(&self) {
            self.resolved.set(self.resolved.get() + 1);
        }

        fn is_idle(&self) -> bool {
            self.resolved.get() >= 2
        }
    }

    #[test]
    fn convert_to_ns() {
        let clk_ghz = Clock::new(1000.0);
        assert_eq!(1.0, clk_ghz.to_ns(&ClockTick::new().set_tick(1)));

        let slow_clk = Clock::new(0.5);
        assert_eq!(2000.0, slow_clk.to_ns(&ClockTick::new().set_tick(1)));
    }

    #[test]
    fn advance_resolves_every_tick() {
        let clock = Clock::default();
        let counter = Rc::new(Counter {
            resolved: Cell::new(0),
        });
        clock.add_resolve(counter.clone());

        assert!(!clock.is_idle());
        clock.advance();
        clock.advance();
        assert_eq!(counter.resolved.get(), 2);
        assert_eq!(clock.tick_now().tick(), 2);
        assert!(clock.is_idle());
    }
}
