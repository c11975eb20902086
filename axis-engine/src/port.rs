// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

//! Port
//!
//! An [`OutPort`] and an [`InPort`] share a [`PortState`] that models a
//! registered valid/ready handshake. The state behaves like a two-entry
//! register slice: the output register plus a skid register that lets a
//! producer keep streaming for one cycle after the consumer stalls.
//!
//! All decisions made during a tick are based on the state at the start of
//! that tick. A value that is put only becomes visible to the consumer once
//! the clock has resolved the state at the end of the tick.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use axis_track::entity::Entity;

use crate::engine::Engine;
use crate::sim_error;
use crate::traits::{Resolve, Resolver, SimObject};
use crate::types::SimResult;

/// Number of transfers a port can hold.
const PORT_CAPACITY: usize = 2;

pub struct PortState<T>
where
    T: SimObject,
{
    pub in_port_entity: Arc<Entity>,

    /// Values visible to the consumer.
    buffer: RefCell<VecDeque<T>>,

    /// Value put during the current tick.
    incoming: RefCell<Option<T>>,

    /// Number of buffered values at the start of the tick.
    level: Cell<usize>,

    /// Whether the consumer has taken a value this tick.
    taken: Cell<bool>,

    /// Whether an [`OutPort`] has been connected.
    connected: Cell<bool>,
}

impl<T> PortState<T>
where
    T: SimObject,
{
    fn new(in_port_entity: Arc<Entity>) -> Self {
        Self {
            in_port_entity,
            buffer: RefCell::new(VecDeque::with_capacity(PORT_CAPACITY)),
            incoming: RefCell::new(None),
            level: Cell::new(0),
            taken: Cell::new(false),
            connected: Cell::new(false),
        }
    }

    fn ready(&self) -> bool {
        self.level.get() < PORT_CAPACITY && self.incoming.borrow().is_none()
    }

    fn valid(&self) -> bool {
        !self.taken.get() && !self.buffer.borrow().is_empty()
    }

    /// Number of values currently held, including one put this tick.
    #[must_use]
    pub fn fill_level(&self) -> usize {
        self.buffer.borrow().len() + usize::from(self.incoming.borrow().is_some())
    }
}

impl<T> Resolve for PortState<T>
where
    T: SimObject,
{
    fn resolve(&self) {
        if let Some(value) = self.incoming.borrow_mut().take() {
            self.buffer.borrow_mut().push_back(value);
        }
        self.taken.set(false);
        self.level.set(self.buffer.borrow().len());
    }

    fn is_idle(&self) -> bool {
        self.fill_level() == 0
    }
}

pub struct InPort<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    state: Rc<PortState<T>>,
}

impl<T> fmt::Display for InPort<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity.fmt(f)
    }
}

impl<T> InPort<T>
where
    T: SimObject,
{
    /// Create a new port as a child of `parent` and register its state with
    /// the engine clock so that it is resolved every tick.
    #[must_use]
    pub fn new(engine: &Engine, parent: &Arc<Entity>, name: &str) -> Self {
        let entity = Arc::new(Entity::new(parent, name));
        let state = Rc::new(PortState::new(entity.clone()));
        engine.clock().add_resolve(state.clone());
        Self { entity, state }
    }

    /// Get the shared state in order to connect an [`OutPort`] to this port.
    #[must_use]
    pub fn state(&self) -> Rc<PortState<T>> {
        self.state.clone()
    }

    /// Returns true if a value is available to be taken this tick.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.state.valid()
    }

    /// Look at the value that would be taken without consuming it.
    pub fn inspect<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        if !self.state.valid() {
            return None;
        }
        self.state.buffer.borrow().front().map(f)
    }

    /// Consume the available value. At most one value can be taken per tick.
    pub fn take(&self) -> Option<T> {
        if !self.state.valid() {
            return None;
        }
        let value = self.state.buffer.borrow_mut().pop_front();
        self.state.taken.set(true);
        value
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.connected.get()
    }
}

pub struct OutPort<T>
where
    T: SimObject,
{
    entity: Arc<Entity>,
    name: String,
    state: RefCell<Option<Rc<PortState<T>>>>,
}

impl<T> fmt::Display for OutPort<T>
where
    T: SimObject,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.entity, self.name)
    }
}

impl<T> OutPort<T>
where
    T: SimObject,
{
    #[must_use]
    pub fn new(entity: &Arc<Entity>, name: &str) -> Self {
        Self {
            entity: entity.clone(),
            name: name.to_owned(),
            state: RefCell::new(None),
        }
    }

    /// Connect this port to the state of an [`InPort`].
    ///
    /// # Panics
    ///
    /// Connecting either end twice is a wiring error and panics.
    pub fn connect(&self, port_state: Rc<PortState<T>>) {
        if self.state.borrow().is_some() {
            panic!("{self} already connected");
        }
        if port_state.connected.get() {
            panic!("{} already connected", port_state.in_port_entity);
        }
        port_state.connected.set(true);
        *self.state.borrow_mut() = Some(port_state);
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Returns true if a value can be put this tick.
    #[must_use]
    pub fn ready(&self) -> bool {
        match self.state.borrow().as_ref() {
            Some(state) => state.ready(),
            None => false,
        }
    }

    /// Transfer a value. Only valid when [`ready()`](Self::ready) is true.
    pub fn put(&self, value: T) -> SimResult {
        let state = self.state.borrow();
        let Some(state) = state.as_ref() else {
            return sim_error!(format!("{self} not connected"));
        };
        if !state.ready() {
            return sim_error!(format!("{self} put {value} when not ready"));
        }
        *state.incoming.borrow_mut() = Some(value);
        Ok(())
    }
}
