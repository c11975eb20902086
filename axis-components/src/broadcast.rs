// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! 1:N broadcast.
//!
//! Every transaction is copied to all outputs. A transaction is only consumed
//! once every output is ready, so all outputs see an identical stream.
//!
//! # Ports
//!
//! This component has one input and `N`-output ports:
//!  - One [input port](axis_engine::port::InPort): `rx`
//!  - N [output ports](axis_engine::port::OutPort): `tx[i]` for `i in [0, N-1]`

use std::rc::Rc;
use std::sync::Arc;

use axis_engine::engine::Engine;
use axis_engine::port::{InPort, OutPort, PortState};
use axis_engine::sim_error;
use axis_engine::time::clock::ClockTick;
use axis_engine::traits::{Clocked, SimObject};
use axis_engine::types::{SimError, SimResult};
use axis_track::entity::Entity;
use axis_track::{enter, exit};

use crate::port_index;

pub struct Broadcast<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    rx: InPort<T>,
    tx: Vec<OutPort<T>>,
}

impl<T> Broadcast<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_tx: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_tx == 0 {
            return sim_error!(format!("{entity}: must have at least one output"));
        }
        let rx = InPort::new(engine, &entity, "rx");
        let tx = (0..num_tx)
            .map(|i| OutPort::new(&entity, &format!("tx{i}")))
            .collect();
        let rc_self = Rc::new(Self { entity, rx, tx });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx_i(&self, i: usize, port_state: Rc<PortState<T>>) -> SimResult {
        port_index!(self.tx[i])?.connect(port_state);
        Ok(())
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        self.rx.state()
    }
}

impl<T> Clocked for Broadcast<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        if !self.tx.iter().all(OutPort::ready) {
            return Ok(());
        }
        if let Some(value) = self.rx.take() {
            enter!(self.entity ; value.tag());
            exit!(self.entity ; value.tag());
            for tx in &self.tx {
                tx.put(value.clone())?;
            }
        }
        Ok(())
    }
}
