// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! N:M frame switch.
//!
//! Each input decodes the `dest` of the first transaction of a frame against
//! the address range of every output. The frame is then forwarded to that
//! output, whose own [Arbiter] keeps frames from different inputs apart.
//! Outputs arbitrate independently of each other.
//!
//! A frame whose `dest` matches no output, or matches an output that the
//! input is not allowed to reach, is consumed and dropped.
//!
//! # Ports
//!
//! This component has `N`-input ports and `M`-output ports:
//!  - N [input ports](axis_engine::port::InPort): `rx[i]` for `i in [0, N-1]`
//!  - M [output ports](axis_engine::port::OutPort): `tx[i]` for `i in [0, M-1]`

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use axis_engine::engine::Engine;
use axis_engine::port::{InPort, OutPort, PortState};
use axis_engine::sim_error;
use axis_engine::time::clock::ClockTick;
use axis_engine::traits::{Clocked, SimObject};
use axis_engine::types::{SimError, SimResult};
use axis_track::entity::Entity;
use axis_track::{enter, exit, trace, warn};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::arbiter::policy::ArbiterPolicy;
use crate::arbiter::{Arbiter, Block};
use crate::port_index;
use crate::types::Route;

/// The destinations served by one output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchOutputConfig {
    /// Lowest `dest` routed to this output.
    pub base: u64,

    /// Highest `dest` routed to this output (inclusive).
    pub top: u64,

    /// Inputs allowed to reach this output. All inputs when not given.
    #[serde(default)]
    pub connect: Option<Vec<usize>>,
}

impl SwitchOutputConfig {
    #[must_use]
    pub fn new(base: u64, top: u64) -> Self {
        Self {
            base,
            top,
            connect: None,
        }
    }

    #[must_use]
    pub fn with_connect(mut self, connect: Vec<usize>) -> Self {
        self.connect = Some(connect);
        self
    }

    fn accepts(&self, input: usize, dest: u64) -> bool {
        let connected = match &self.connect {
            Some(connect) => connect.contains(&input),
            None => true,
        };
        connected && (self.base..=self.top).contains(&dest)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    pub num_inputs: usize,
    pub outputs: Vec<SwitchOutputConfig>,
    pub arbiter: ArbiterPolicy,
}

/// A 2x2 switch routing `dest` 0 to output 0 and `dest` 1 to output 1.
impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            num_inputs: 2,
            outputs: vec![SwitchOutputConfig::new(0, 0), SwitchOutputConfig::new(1, 1)],
            arbiter: ArbiterPolicy::default(),
        }
    }
}

impl SwitchConfig {
    /// Check that the configuration describes a buildable switch.
    pub fn validate(&self) -> SimResult {
        if self.num_inputs == 0 {
            return sim_error!("switch must have at least one input");
        }
        if self.outputs.is_empty() {
            return sim_error!("switch must have at least one output");
        }

        for (i, output) in self.outputs.iter().enumerate() {
            if output.base > output.top {
                return sim_error!(format!(
                    "output {i}: base {:#x} above top {:#x}",
                    output.base, output.top
                ));
            }
            if let Some(bad) = output
                .connect
                .iter()
                .flatten()
                .find(|input| **input >= self.num_inputs)
            {
                return sim_error!(format!(
                    "output {i}: connected input {bad} out of range (0..{})",
                    self.num_inputs
                ));
            }
        }

        for ((i, a), (j, b)) in self.outputs.iter().enumerate().tuple_combinations() {
            if a.base <= b.top && b.base <= a.top {
                return sim_error!(format!("output {i} and output {j} ranges overlap"));
            }
        }
        Ok(())
    }

    /// The output that a frame from `input` addressed to `dest` goes to.
    #[must_use]
    pub fn route(&self, input: usize, dest: u64) -> Option<usize> {
        self.outputs
            .iter()
            .position(|output| output.accepts(input, dest))
    }
}

pub struct Switch<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    config: SwitchConfig,
    routes: RefCell<Vec<Route>>,
    arbiters: Vec<Arbiter>,
    num_unroutable_frames: Cell<usize>,
    rx: Vec<InPort<T>>,
    tx: Vec<OutPort<T>>,
}

impl<T> Switch<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        config: &SwitchConfig,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if let Err(e) = config.validate() {
            return sim_error!(format!("{entity}: {}", e.0));
        }

        let num_inputs = config.num_inputs;
        let num_outputs = config.outputs.len();
        let arbiters = (0..num_outputs)
            .map(|i| {
                Arbiter::new(
                    &entity,
                    &format!("arb{i}"),
                    num_inputs,
                    Box::new(config.arbiter),
                    Block::Acknowledge,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let rx = (0..num_inputs)
            .map(|i| InPort::new(engine, &entity, &format!("rx{i}")))
            .collect();
        let tx = (0..num_outputs)
            .map(|i| OutPort::new(&entity, &format!("tx{i}")))
            .collect();

        let rc_self = Rc::new(Self {
            entity,
            config: config.clone(),
            routes: RefCell::new(vec![Route::Idle; num_inputs]),
            arbiters,
            num_unroutable_frames: Cell::new(0),
            rx,
            tx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx_i(&self, i: usize, port_state: Rc<PortState<T>>) -> SimResult {
        port_index!(self.tx[i])?.connect(port_state);
        Ok(())
    }

    pub fn port_rx_i(&self, i: usize) -> Result<Rc<PortState<T>>, SimError> {
        Ok(port_index!(self.rx[i])?.state())
    }

    #[must_use]
    pub fn num_unroutable_frames(&self) -> usize {
        self.num_unroutable_frames.get()
    }

    /// The current route of every input.
    #[must_use]
    pub fn routes(&self) -> Vec<Route> {
        self.routes.borrow().clone()
    }

    fn decode_routes(&self, routes: &mut [Route]) {
        for (i, route) in routes.iter_mut().enumerate() {
            if *route != Route::Idle {
                continue;
            }
            let Some(dest) = self.rx[i].inspect(|value| value.dest()) else {
                continue;
            };
            *route = match self.config.route(i, dest) {
                Some(output) => {
                    trace!(self.entity ; "rx{i}: dest {dest:#x} to tx{output}");
                    Route::Output(output)
                }
                None => {
                    warn!(self.entity ; "rx{i}: no route for dest {dest:#x}, dropping frame");
                    self.num_unroutable_frames
                        .set(self.num_unroutable_frames.get() + 1);
                    Route::Drop
                }
            };
        }
    }

    fn drain_dropped(&self, routes: &mut [Route]) {
        for (i, route) in routes.iter_mut().enumerate() {
            if *route != Route::Drop {
                continue;
            }
            if let Some(value) = self.rx[i].take() {
                enter!(self.entity ; value.tag());
                if value.last() {
                    *route = Route::Idle;
                }
            }
        }
    }

    fn forward(&self, output: usize, routes: &mut [Route]) -> SimResult {
        let num_inputs = self.rx.len();
        let arbiter = &self.arbiters[output];
        let tx = &self.tx[output];
        let mut acknowledges = vec![false; num_inputs];

        if let Some(i) = arbiter.grant() {
            if tx.ready() {
                if let Some(value) = self.rx[i].take() {
                    enter!(self.entity ; value.tag());
                    if value.last() {
                        acknowledges[i] = true;
                        routes[i] = Route::Idle;
                    }
                    exit!(self.entity ; value.tag());
                    tx.put(value)?;
                }
            }
        }

        let requests: Vec<bool> = (0..num_inputs)
            .map(|i| routes[i] == Route::Output(output) && self.rx[i].valid())
            .collect();
        arbiter.update(&requests, &acknowledges)?;
        Ok(())
    }
}

impl<T> Clocked for Switch<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        let mut routes = self.routes.borrow_mut();
        self.decode_routes(&mut routes);
        self.drain_dropped(&mut routes);
        for output in 0..self.tx.len() {
            self.forward(output, &mut routes)?;
        }
        Ok(())
    }
}
