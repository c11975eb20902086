// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! 1:N demultiplexer.
//!
//! The output is chosen when a frame starts, either from the `select` control
//! or from the `dest` of the first transaction, and held until the frame has
//! been completely forwarded. Selecting an output that does not exist, or
//! asserting the `drop` control, discards the frame.
//!
//! # Ports
//!
//! This component has one input and `N`-output ports:
//!  - One [input port](axis_engine::port::InPort): `rx`
//!  - N [output ports](axis_engine::port::OutPort): `tx[i]` for `i in [0, N-1]`

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

use crate::port_index;
use crate::types::Route;

/// Where the output selection of a [Demux] comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectSource {
    /// The `select` control.
    #[default]
    Control,

    /// The `dest` of the first transaction of each frame.
    Dest,
}

pub struct Demux<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    select_source: SelectSource,
    select: Cell<usize>,
    enable: Cell<bool>,
    drop: Cell<bool>,
    route: Cell<Route>,
    num_dropped_frames: Cell<usize>,
    rx: InPort<T>,
    tx: Vec<OutPort<T>>,
}

impl<T> Demux<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_tx: usize,
        select_source: SelectSource,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_tx == 0 {
            return sim_error!(format!("{entity}: must have at least one output"));
        }
        let rx = InPort::new(engine, &entity, "rx");
        let tx = (0..num_tx)
            .map(|i| OutPort::new(&entity, &format!("tx{i}")))
            .collect();
        let rc_self = Rc::new(Self {
            entity,
            select_source,
            select: Cell::new(0),
            enable: Cell::new(true),
            drop: Cell::new(false),
            route: Cell::new(Route::Idle),
            num_dropped_frames: Cell::new(0),
            rx,
            tx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn set_select(&self, select: usize) {
        self.select.set(select);
    }

    /// While disabled no new frame is started.
    pub fn set_enable(&self, enable: bool) {
        self.enable.set(enable);
    }

    /// Discard frames that start while set.
    pub fn set_drop(&self, drop: bool) {
        self.drop.set(drop);
    }

    pub fn connect_port_tx_i(&self, i: usize, port_state: Rc<PortState<T>>) -> SimResult {
        port_index!(self.tx[i])?.connect(port_state);
        Ok(())
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        self.rx.state()
    }

    #[must_use]
    pub fn route(&self) -> Route {
        self.route.get()
    }

    #[must_use]
    pub fn num_dropped_frames(&self) -> usize {
        self.num_dropped_frames.get()
    }

    fn start_frame(&self) {
        let select = match self.select_source {
            SelectSource::Control => Some(self.select.get()),
            SelectSource::Dest => self
                .rx
                .inspect(|value| usize::try_from(value.dest()).unwrap_or(usize::MAX)),
        };
        let Some(select) = select else {
            return;
        };

        if self.drop.get() || select >= self.tx.len() {
            debug!(self.entity ; "drop frame for output {select}");
            self.num_dropped_frames.set(self.num_dropped_frames.get() + 1);
            self.route.set(Route::Drop);
        } else {
            self.route.set(Route::Output(select));
        }
    }
}

impl<T> Clocked for Demux<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        if self.route.get() == Route::Idle && self.enable.get() && self.rx.valid() {
            self.start_frame();
        }

        match self.route.get() {
            Route::Idle => {}
            Route::Output(i) => {
                let tx = &self.tx[i];
                if tx.ready() {
                    if let Some(value) = self.rx.take() {
                        enter!(self.entity ; value.tag());
                        if value.last() {
                            self.route.set(Route::Idle);
                        }
                        exit!(self.entity ; value.tag());
                        tx.put(value)?;
                    }
                }
            }
            Route::Drop => {
                if let Some(value) = self.rx.take() {
                    enter!(self.entity ; value.tag());
                    if value.last() {
                        self.route.set(Route::Idle);
                    }
                }
            }
        }
        Ok(())
    }
}
