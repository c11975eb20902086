// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A data sink.
//!
//! A [Sink] is an object that will accept and record all the data that
//! is received on its input port. An optional backpressure
//! [PatternGenerator] stops it accepting data on some cycles.
//!
//! # Ports
//!
//! This component has:
//!  - One [input port](axis_engine::port::InPort): `rx`

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use axis_engine::engine::Engine;
use axis_engine::port::{InPort, PortState};
use axis_engine::time::clock::ClockTick;
use axis_engine::traits::{Clocked, SimObject};
use axis_engine::types::{SimError, SimResult};
use axis_track::enter;
use axis_track::entity::Entity;

use crate::types::PatternGenerator;

pub struct Sink<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    sunk: RefCell<Vec<T>>,
    backpressure_generator: RefCell<Option<PatternGenerator>>,
    rx: InPort<T>,
}

impl<T> Sink<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        let rx = InPort::new(engine, &entity, "rx");
        let rc_self = Rc::new(Self {
            entity,
            sunk: RefCell::new(Vec::new()),
            backpressure_generator: RefCell::new(None),
            rx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn set_backpressure_generator(&self, generator: Option<PatternGenerator>) {
        *self.backpressure_generator.borrow_mut() = generator;
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        self.rx.state()
    }

    #[must_use]
    pub fn num_sunk(&self) -> usize {
        self.sunk.borrow().len()
    }

    /// All values received so far, in arrival order.
    #[must_use]
    pub fn sunk(&self) -> Vec<T> {
        self.sunk.borrow().clone()
    }
}

impl<T> Clocked for Sink<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        let stall = self
            .backpressure_generator
            .borrow_mut()
            .as_mut()
            .and_then(|generator| generator.next())
            .unwrap_or(false);
        if stall {
            return Ok(());
        }

        if let Some(value) = self.rx.take() {
            enter!(self.entity ; value.tag());
            self.sunk.borrow_mut().push(value);
        }
        Ok(())
    }
}
