// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! N:M crosspoint.
//!
//! A cycle-by-cycle router with no knowledge of frames. Each output selects an
//! input through a select register which is reloaded every cycle, so the
//! selection may change in the middle of a frame. Several outputs may select
//! the same input.
//!
//! Data passes through an input register stage and an output register stage.
//! Inputs are consumed every cycle; there is no backpressure. A value that
//! reaches the output register while the downstream port is not ready is
//! discarded and counted.
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
use axis_track::{debug, enter, exit};

use crate::port_index;

pub struct Crosspoint<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,

    /// Select control for each output.
    select: RefCell<Vec<usize>>,
    select_regs: RefCell<Vec<usize>>,
    input_regs: RefCell<Vec<Option<T>>>,
    output_regs: RefCell<Vec<Option<T>>>,
    num_dropped: Cell<usize>,
    rx: Vec<InPort<T>>,
    tx: Vec<OutPort<T>>,
}

impl<T> Crosspoint<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        num_rx: usize,
        num_tx: usize,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_rx == 0 || num_tx == 0 {
            return sim_error!(format!(
                "{entity}: must have at least one input and one output"
            ));
        }
        let rx = (0..num_rx)
            .map(|i| InPort::new(engine, &entity, &format!("rx{i}")))
            .collect();
        let tx = (0..num_tx)
            .map(|i| OutPort::new(&entity, &format!("tx{i}")))
            .collect();
        let rc_self = Rc::new(Self {
            entity,
            select: RefCell::new(vec![0; num_tx]),
            select_regs: RefCell::new(vec![0; num_tx]),
            input_regs: RefCell::new(vec![None; num_rx]),
            output_regs: RefCell::new(vec![None; num_tx]),
            num_dropped: Cell::new(0),
            rx,
            tx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// Route `input` to `output` from the next cycle onwards.
    pub fn set_select(&self, output: usize, input: usize) -> SimResult {
        if input >= self.rx.len() {
            return sim_error!(format!(
                "{}: select input {input} out of range (0..{})",
                self.entity,
                self.rx.len()
            ));
        }
        match self.select.borrow_mut().get_mut(output) {
            Some(select) => {
                *select = input;
                Ok(())
            }
            None => sim_error!(format!(
                "{}: select output {output} out of range (0..{})",
                self.entity,
                self.tx.len()
            )),
        }
    }

    pub fn connect_port_tx_i(&self, i: usize, port_state: Rc<PortState<T>>) -> SimResult {
        port_index!(self.tx[i])?.connect(port_state);
        Ok(())
    }

    pub fn port_rx_i(&self, i: usize) -> Result<Rc<PortState<T>>, SimError> {
        Ok(port_index!(self.rx[i])?.state())
    }

    /// Number of values discarded because an output was not ready.
    #[must_use]
    pub fn num_dropped(&self) -> usize {
        self.num_dropped.get()
    }
}

impl<T> Clocked for Crosspoint<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        let mut output_regs = self.output_regs.borrow_mut();
        let mut input_regs = self.input_regs.borrow_mut();
        let mut select_regs = self.select_regs.borrow_mut();

        for (tx, reg) in self.tx.iter().zip(output_regs.iter_mut()) {
            if let Some(value) = reg.take() {
                if tx.ready() {
                    exit!(self.entity ; value.tag());
                    tx.put(value)?;
                } else {
                    debug!(self.entity ; "{tx} not ready, dropping {value}");
                    self.num_dropped.set(self.num_dropped.get() + 1);
                }
            }
        }

        for (reg, select) in output_regs.iter_mut().zip(select_regs.iter()) {
            *reg = input_regs[*select].clone();
        }
        select_regs.clone_from(&self.select.borrow());

        for (rx, reg) in self.rx.iter().zip(input_regs.iter_mut()) {
            *reg = rx.take();
            if let Some(value) = reg {
                enter!(self.entity ; value.tag());
            }
        }
        Ok(())
    }

    fn is_busy(&self) -> bool {
        self.input_regs.borrow().iter().any(Option::is_some)
            || self.output_regs.borrow().iter().any(Option::is_some)
    }
}
