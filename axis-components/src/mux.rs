// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Frame-atomic N:1 multiplexer.
//!
//! Inputs compete for the output through an [Arbiter]. Once an input has been
//! granted, its frame is forwarded until the transaction carrying `last` has
//! been accepted downstream. No other input reaches the output in between.
//!
//! # Ports
//!
//! This component has `N`-input ports and one output:
//!  - N [input ports](axis_engine::port::InPort): `rx[i]` for `i in [0, N-1]`
//!  - One [output port](axis_engine::port::OutPort): `tx`

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use axis_engine::engine::Engine;
use axis_engine::port::{InPort, OutPort, PortState};
use axis_engine::sim_error;
use axis_engine::time::clock::ClockTick;
use axis_engine::traits::{Clocked, SimObject};
use axis_engine::types::{SimError, SimResult};
use axis_track::entity::Entity;
use axis_track::{debug, enter, exit};

use crate::arbiter::policy::ArbiterPolicy;
use crate::arbiter::{Arbiter, Block};
use crate::port_index;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MuxState {
    #[default]
    Idle,

    /// Part of a frame from the given input has been forwarded.
    FrameActive(usize),
}

pub struct Mux<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    arbiter: Arbiter,
    state: Cell<MuxState>,
    update_id: Cell<bool>,
    rx: Vec<InPort<T>>,
    tx: OutPort<T>,
}

impl<T> Mux<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_rx: usize,
        policy: ArbiterPolicy,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_rx == 0 {
            return sim_error!(format!("{entity}: must have at least one input"));
        }
        let arbiter = Arbiter::new(&entity, "arb", num_rx, Box::new(policy), Block::Acknowledge)?;
        let rx = (0..num_rx)
            .map(|i| InPort::new(engine, &entity, &format!("rx{i}")))
            .collect();
        let tx = OutPort::new(&entity, "tx");
        let rc_self = Rc::new(Self {
            entity,
            arbiter,
            state: Cell::new(MuxState::Idle),
            update_id: Cell::new(false),
            rx,
            tx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// Replace the id of every forwarded transaction with its input index.
    pub fn set_update_id(&self, update_id: bool) {
        self.update_id.set(update_id);
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) -> SimResult {
        self.tx.connect(port_state);
        Ok(())
    }

    pub fn port_rx_i(&self, i: usize) -> Result<Rc<PortState<T>>, SimError> {
        Ok(port_index!(self.rx[i])?.state())
    }

    #[must_use]
    pub fn state(&self) -> MuxState {
        self.state.get()
    }
}

impl<T> Clocked for Mux<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        let mut acknowledges = vec![false; self.rx.len()];

        if let Some(i) = self.arbiter.grant() {
            let rx = &self.rx[i];
            if rx.valid() && self.tx.ready() {
                if let Some(mut value) = rx.take() {
                    enter!(self.entity ; value.tag());
                    if self.update_id.get() {
                        value.set_id(i as u64);
                    }
                    let last = value.last();
                    exit!(self.entity ; value.tag());
                    self.tx.put(value)?;

                    if last {
                        debug!(self.entity ; "frame from rx{i} complete");
                        acknowledges[i] = true;
                        self.state.set(MuxState::Idle);
                    } else {
                        self.state.set(MuxState::FrameActive(i));
                    }
                }
            }
        }

        let requests: Vec<bool> = self.rx.iter().map(InPort::valid).collect();
        self.arbiter.update(&requests, &acknowledges)?;
        Ok(())
    }
}
