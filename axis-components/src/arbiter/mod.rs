// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Choose between a number of requesting ports.
//!
//! The [Arbiter] holds a grant for one port at a time. How long a grant is
//! held is controlled by its [Block] mode and a new winner is picked by an
//! [Arbitrate] policy (see [policy]).
//!
//! The arbiter is not a component in its own right. It is owned by the
//! components that need to share an output, such as the
//! [Mux](crate::mux::Mux) and [Switch](crate::switch::Switch).

use std::cell::Cell;
use std::sync::Arc;

use axis_engine::sim_error;
use axis_engine::types::SimError;
use axis_track::entity::Entity;
use axis_track::trace;
use serde::{Deserialize, Serialize};

pub mod policy;

/// An arbitration policy.
pub trait Arbitrate {
    /// Pick the winner among the ports with `requests` set.
    ///
    /// `last_granted` is the port most recently given a grant.
    fn choose(&self, requests: &[bool], last_granted: Option<usize>) -> Option<usize>;
}

/// Which end of the port list has the highest priority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LsbPriority {
    /// Port 0 has the highest priority.
    #[default]
    High,

    /// The highest numbered port has the highest priority.
    Low,
}

/// How long a grant is held once given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// Arbitrate again every cycle.
    None,

    /// Hold the grant while the granted port keeps requesting.
    Request,

    /// Hold the grant until the granted port is acknowledged.
    #[default]
    Acknowledge,
}

pub struct Arbiter {
    pub entity: Arc<Entity>,
    policy: Box<dyn Arbitrate>,
    block: Block,
    num_ports: usize,
    grant: Cell<Option<usize>>,
    last_granted: Cell<Option<usize>>,
}

impl Arbiter {
    pub fn new(
        parent: &Arc<Entity>,
        name: &str,
        num_ports: usize,
        policy: Box<dyn Arbitrate>,
        block: Block,
    ) -> Result<Self, SimError> {
        let entity = Arc::new(Entity::new(parent, name));
        if num_ports == 0 {
            return sim_error!(format!("{entity}: must have at least one port"));
        }
        Ok(Self {
            entity,
            policy,
            block,
            num_ports,
            grant: Cell::new(None),
            last_granted: Cell::new(None),
        })
    }

    #[must_use]
    pub fn num_ports(&self) -> usize {
        self.num_ports
    }

    /// The grant currently held.
    #[must_use]
    pub fn grant(&self) -> Option<usize> {
        self.grant.get()
    }

    /// Clear the grant and the round-robin state.
    pub fn reset(&self) {
        self.grant.set(None);
        self.last_granted.set(None);
    }

    /// Perform one arbitration cycle and return the resulting grant.
    pub fn update(
        &self,
        requests: &[bool],
        acknowledges: &[bool],
    ) -> Result<Option<usize>, SimError> {
        if requests.len() != self.num_ports || acknowledges.len() != self.num_ports {
            return sim_error!(format!(
                "{}: expected {} requests/acknowledges, got {}/{}",
                self.entity,
                self.num_ports,
                requests.len(),
                acknowledges.len()
            ));
        }

        if let Some(granted) = self.grant.get() {
            let hold = match self.block {
                Block::None => false,
                Block::Request => requests[granted],
                Block::Acknowledge => !acknowledges[granted],
            };
            if hold {
                return Ok(Some(granted));
            }
        }

        let grant = self.policy.choose(requests, self.last_granted.get());
        if let Some(granted) = grant {
            trace!(self.entity ; "grant {granted}");
            self.last_granted.set(Some(granted));
        }
        self.grant.set(grant);
        Ok(grant)
    }
}
