// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! N:1 multiplexer controlled by an external select.
//!
//! The `select` and `enable` controls are sampled when a frame starts and the
//! chosen input is then held until its last transaction has been forwarded.
//! A select that does not name an input starts nothing.
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
use axis_track::{enter, exit, trace};

use crate::port_index;

pub struct SelectMux<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    select: Cell<usize>,
    enable: Cell<bool>,
    active: Cell<Option<usize>>,
    rx: Vec<InPort<T>>,
    tx: OutPort<T>,
}

impl<T> SelectMux<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_rx: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_rx == 0 {
            return sim_error!(format!("{entity}: must have at least one input"));
        }
        let rx = (0..num_rx)
            .map(|i| InPort::new(engine, &entity, &format!("rx{i}")))
            .collect();
        let tx = OutPort::new(&entity, "tx");
        let rc_self = Rc::new(Self {
            entity,
            select: Cell::new(0),
            enable: Cell::new(false),
            active: Cell::new(None),
            rx,
            tx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn set_select(&self, select: usize) {
        self.select.set(select);
    }

    pub fn set_enable(&self, enable: bool) {
        self.enable.set(enable);
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) -> SimResult {
        self.tx.connect(port_state);
        Ok(())
    }

    pub fn port_rx_i(&self, i: usize) -> Result<Rc<PortState<T>>, SimError> {
        Ok(port_index!(self.rx[i])?.state())
    }

    /// The input whose frame is currently being forwarded.
    #[must_use]
    pub fn active(&self) -> Option<usize> {
        self.active.get()
    }
}

impl<T> Clocked for SelectMux<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        if self.active.get().is_none() && self.enable.get() {
            let select = self.select.get();
            if select < self.rx.len() && self.rx[select].valid() {
                trace!(self.entity ; "select rx{select}");
                self.active.set(Some(select));
            }
        }

        let Some(i) = self.active.get() else {
            return Ok(());
        };
        if !self.tx.ready() {
            return Ok(());
        }
        if let Some(value) = self.rx[i].take() {
            enter!(self.entity ; value.tag());
            if value.last() {
                self.active.set(None);
            }
            exit!(self.entity ; value.tag());
            self.tx.put(value)?;
        }
        Ok(())
    }
}
