// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A data source.
//!
//! The data source produces data as defined by the [DataGenerator] that is
//! provided. An optional idle [PatternGenerator] makes the source skip
//! cycles, which is used to stress downstream components.
//!
//! # Ports
//!
//! This component has one port:
//!  - One [output port](axis_engine::port::OutPort): `tx`

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use axis_engine::engine::Engine;
use axis_engine::port::{OutPort, PortState};
use axis_engine::time::clock::ClockTick;
use axis_engine::traits::{Clocked, SimObject};
use axis_engine::types::{SimError, SimResult};
use axis_track::entity::Entity;
use axis_track::{exit, trace};

use crate::types::{DataGenerator, PatternGenerator};

#[macro_export]
macro_rules! option_box_repeat {
    ($value:expr ; $repeat:expr) => {
        Some(Box::new(std::iter::repeat($value).take($repeat)))
    };
}

pub struct Source<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    data_generator: RefCell<Option<DataGenerator<T>>>,
    idle_generator: RefCell<Option<PatternGenerator>>,

    /// Next value to be sent.
    pending: RefCell<Option<T>>,
    num_sourced: Cell<usize>,
    tx: OutPort<T>,
}

impl<T> Source<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        data_generator: Option<DataGenerator<T>>,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        let tx = OutPort::new(&entity, "tx");
        let rc_self = Rc::new(Self {
            entity,
            data_generator: RefCell::new(None),
            idle_generator: RefCell::new(None),
            pending: RefCell::new(None),
            num_sourced: Cell::new(0),
            tx,
        });
        rc_self.set_generator(data_generator);
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn set_generator(&self, data_generator: Option<DataGenerator<T>>) {
        *self.data_generator.borrow_mut() = data_generator;
        self.fetch_next();
    }

    pub fn set_idle_generator(&self, idle_generator: Option<PatternGenerator>) {
        *self.idle_generator.borrow_mut() = idle_generator;
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) -> SimResult {
        self.tx.connect(port_state);
        Ok(())
    }

    #[must_use]
    pub fn num_sourced(&self) -> usize {
        self.num_sourced.get()
    }

    fn fetch_next(&self) {
        let next = self
            .data_generator
            .borrow_mut()
            .as_mut()
            .and_then(|generator| generator.next());
        *self.pending.borrow_mut() = next;
    }

    fn is_idle_cycle(&self) -> bool {
        self.idle_generator
            .borrow_mut()
            .as_mut()
            .and_then(|generator| generator.next())
            .unwrap_or(false)
    }
}

impl<T> Clocked for Source<T>
where
    T: SimObject,
{
    fn tick(&self, now: &ClockTick) -> SimResult {
        if self.pending.borrow().is_none() || self.is_idle_cycle() || !self.tx.ready() {
            return Ok(());
        }

        if let Some(value) = self.pending.borrow_mut().take() {
            trace!(self.entity ; "{now}: send {value}");
            exit!(self.entity ; value.tag());
            self.tx.put(value)?;
            self.num_sourced.set(self.num_sourced.get() + 1);
        }
        self.fetch_next();
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.pending.borrow().is_some()
    }
}
