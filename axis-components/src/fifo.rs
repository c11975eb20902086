// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Elastic FIFO with optional frame handling.
//!
//! In plain mode this is a bounded queue of `depth` transactions. When it is
//! full the input is backpressured unless one of these is set:
//!  - `drop_when_full`: each transaction that does not fit is discarded.
//!  - `mark_when_full`: the frame that does not fit is truncated. If part of it
//!    was already queued, it is ended by a transaction with `last` set and
//!    `user` marked bad, so downstream frame-aware components still see the
//!    end of the frame.
//!
//! In frame mode the transactions of the frame being written are held in an
//! uncommitted area and only become visible at the output once the last
//! transaction has been written. This allows complete frames to be dropped:
//!  - bad frames, where `user & user_bad_frame_mask == user_bad_frame_value`
//!    on the last transaction, when `drop_bad_frame` is set.
//!  - oversize frames that cannot fit in the FIFO, when `drop_oversize_frame`
//!    is set. Without it, a frame that fills the whole FIFO is committed early
//!    and the rest of it passes straight through.
//!  - frames arriving while the FIFO is full, when `drop_when_full` is set.
//!    This also needs `drop_oversize_frame`, as a frame that was committed
//!    early cannot be dropped.
//!
//! # Ports
//!
//! This component has:
//!  - One [input port](axis_engine::port::InPort): `rx`
//!  - One [output port](axis_engine::port::OutPort): `tx`

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use axis_engine::engine::Engine;
use axis_engine::port::{InPort, OutPort, PortState};
use axis_engine::sim_error;
use axis_engine::time::clock::ClockTick;
use axis_engine::traits::{Clocked, SimObject};
use axis_engine::types::{SimError, SimResult};
use axis_track::entity::Entity;
use axis_track::{debug, enter, exit, trace};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FifoConfig {
    /// Capacity in transactions.
    pub depth: usize,
    pub frame_fifo: bool,
    pub drop_when_full: bool,
    /// Plain mode only: truncate frames that overflow and mark them bad.
    pub mark_when_full: bool,
    pub drop_bad_frame: bool,
    pub drop_oversize_frame: bool,
    pub user_bad_frame_mask: u64,
    pub user_bad_frame_value: u64,
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            depth: 1024,
            frame_fifo: false,
            drop_when_full: false,
            mark_when_full: false,
            drop_bad_frame: false,
            drop_oversize_frame: false,
            user_bad_frame_mask: 1,
            user_bad_frame_value: 1,
        }
    }
}

impl FifoConfig {
    pub fn validate(&self) -> SimResult {
        if self.depth == 0 {
            return sim_error!("depth must be greater than 0");
        }
        if !self.frame_fifo && (self.drop_bad_frame || self.drop_oversize_frame) {
            return sim_error!("dropping bad or oversize frames requires frame_fifo");
        }
        // An oversize frame is committed early and then has nowhere to put
        // its `last` once the FIFO fills.
        if self.frame_fifo && self.drop_when_full && !self.drop_oversize_frame {
            return sim_error!("drop_when_full in frame mode requires drop_oversize_frame");
        }
        if self.mark_when_full && (self.frame_fifo || self.drop_when_full) {
            return sim_error!("mark_when_full excludes frame_fifo and drop_when_full");
        }
        Ok(())
    }

    fn is_bad(&self, user: u64) -> bool {
        user & self.user_bad_frame_mask == self.user_bad_frame_value
    }

    fn mark_bad(&self, user: u64) -> u64 {
        (user & !self.user_bad_frame_mask) | self.user_bad_frame_value
    }
}

/// What happens to the rest of the frame currently being written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum WriteMode {
    /// Held in the uncommitted area (frame mode) or queued (plain mode).
    #[default]
    Store,

    /// Frame committed early, remaining transactions are queued directly.
    CutThrough,

    /// Discard until the end of the frame.
    Drop,
}

pub struct Fifo<T>
where
    T: SimObject,
{
    pub entity: Arc<Entity>,
    config: FifoConfig,
    committed: RefCell<VecDeque<T>>,
    pending: RefCell<Vec<T>>,
    write_mode: Cell<WriteMode>,

    /// Plain mode: part of the current input frame has been queued.
    frame_open: Cell<bool>,

    /// End of a truncated frame, queued as soon as there is space.
    marker: RefCell<Option<T>>,

    overflow_count: Cell<usize>,
    bad_frame_count: Cell<usize>,
    good_frame_count: Cell<usize>,
    rx: InPort<T>,
    tx: OutPort<T>,
}

impl<T> Fifo<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        parent: &Arc<Entity>,
        name: &str,
        config: &FifoConfig,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if let Err(e) = config.validate() {
            return sim_error!(format!("{entity}: {}", e.0));
        }
        let rx = InPort::new(engine, &entity, "rx");
        let tx = OutPort::new(&entity, "tx");
        let rc_self = Rc::new(Self {
            entity,
            config: config.clone(),
            committed: RefCell::new(VecDeque::with_capacity(config.depth)),
            pending: RefCell::new(Vec::new()),
            write_mode: Cell::new(WriteMode::Store),
            frame_open: Cell::new(false),
            marker: RefCell::new(None),
            overflow_count: Cell::new(0),
            bad_frame_count: Cell::new(0),
            good_frame_count: Cell::new(0),
            rx,
            tx,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    pub fn connect_port_tx(&self, port_state: Rc<PortState<T>>) -> SimResult {
        self.tx.connect(port_state);
        Ok(())
    }

    #[must_use]
    pub fn port_rx(&self) -> Rc<PortState<T>> {
        self.rx.state()
    }

    /// Number of transactions held, committed or not.
    #[must_use]
    pub fn fill_level(&self) -> usize {
        self.committed.borrow().len() + self.pending.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fill_level() == 0
    }

    #[must_use]
    pub fn overflow_count(&self) -> usize {
        self.overflow_count.get()
    }

    #[must_use]
    pub fn bad_frame_count(&self) -> usize {
        self.bad_frame_count.get()
    }

    #[must_use]
    pub fn good_frame_count(&self) -> usize {
        self.good_frame_count.get()
    }

    fn read(&self) -> SimResult {
        if !self.tx.ready() {
            return Ok(());
        }
        let value = self.committed.borrow_mut().pop_front();
        if let Some(value) = value {
            exit!(self.entity ; value.tag());
            self.tx.put(value)?;
        }
        Ok(())
    }

    /// Handle a transaction that arrived while the FIFO is full.
    fn overflow(&self, mut value: T) {
        self.overflow_count.set(self.overflow_count.get() + 1);

        if self.config.drop_when_full && !self.config.frame_fifo {
            debug!(self.entity ; "overflow, dropping {value}");
            return;
        }

        if !value.last() {
            self.write_mode.set(WriteMode::Drop);
        }
        if self.config.frame_fifo {
            debug!(self.entity ; "overflow, dropping frame at {value}");
            self.pending.borrow_mut().clear();
        } else if self.frame_open.replace(false) {
            debug!(self.entity ; "overflow, truncating frame at {value}");
            value.set_last(true);
            value.set_user(self.config.mark_bad(value.user()));
            *self.marker.borrow_mut() = Some(value);
        } else {
            debug!(self.entity ; "overflow, dropping frame at {value}");
        }
    }

    /// Queue the end of a truncated frame once there is room for it.
    fn write_marker(&self) {
        if self.fill_level() >= self.config.depth {
            return;
        }
        if let Some(marker) = self.marker.take() {
            trace!(self.entity ; "ending truncated frame with {marker}");
            self.committed.borrow_mut().push_back(marker);
        }
    }

    fn write(&self) {
        self.write_marker();
        if !self.rx.valid() {
            return;
        }

        if self.write_mode.get() == WriteMode::Drop {
            if let Some(value) = self.rx.take() {
                enter!(self.entity ; value.tag());
                if value.last() {
                    self.write_mode.set(WriteMode::Store);
                }
            }
            return;
        }

        if self.fill_level() >= self.config.depth {
            if self.config.drop_when_full || self.config.mark_when_full {
                if let Some(value) = self.rx.take() {
                    enter!(self.entity ; value.tag());
                    self.overflow(value);
                }
            }
            return;
        }

        let Some(value) = self.rx.take() else {
            return;
        };
        enter!(self.entity ; value.tag());
        if !self.config.frame_fifo || self.write_mode.get() == WriteMode::CutThrough {
            self.write_direct(value);
        } else {
            self.write_frame(value);
        }
    }

    fn write_direct(&self, value: T) {
        if value.last() {
            self.write_mode.set(WriteMode::Store);
            if self.config.frame_fifo {
                self.count_frame(&value);
            }
        }
        self.frame_open.set(!self.config.frame_fifo && !value.last());
        self.committed.borrow_mut().push_back(value);
    }

    fn write_frame(&self, value: T) {
        if value.last() {
            let bad = self.count_frame(&value);
            let mut pending = self.pending.borrow_mut();
            pending.push(value);
            if bad && self.config.drop_bad_frame {
                debug!(self.entity ; "dropping bad frame of {} transactions", pending.len());
                pending.clear();
            } else {
                self.committed.borrow_mut().extend(pending.drain(..));
            }
            return;
        }

        let pending_len = {
            let mut pending = self.pending.borrow_mut();
            pending.push(value);
            pending.len()
        };
        if pending_len < self.config.depth {
            return;
        }

        // The frame cannot complete within the FIFO
        if self.config.drop_oversize_frame {
            debug!(self.entity ; "dropping oversize frame");
            self.overflow_count.set(self.overflow_count.get() + 1);
            self.pending.borrow_mut().clear();
            self.write_mode.set(WriteMode::Drop);
        } else {
            trace!(self.entity ; "committing oversize frame early");
            let mut pending = self.pending.borrow_mut();
            self.committed.borrow_mut().extend(pending.drain(..));
            self.write_mode.set(WriteMode::CutThrough);
        }
    }

    /// Count a completed frame and return whether it was bad.
    fn count_frame(&self, last: &T) -> bool {
        let bad = self.config.is_bad(last.user());
        if bad {
            self.bad_frame_count.set(self.bad_frame_count.get() + 1);
        } else {
            self.good_frame_count.set(self.good_frame_count.get() + 1);
        }
        bad
    }
}

impl<T> Clocked for Fifo<T>
where
    T: SimObject,
{
    fn tick(&self, _now: &ClockTick) -> SimResult {
        self.read()?;
        self.write();
        Ok(())
    }

    fn is_busy(&self) -> bool {
        !self.committed.borrow().is_empty() || self.marker.borrow().is_some()
    }
}
