// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Arbitration policies.
//!
//! [ArbiterPolicy] is the form used in configuration files. It dispatches to
//! the [Priority] or [RoundRobin] policy.

use serde::{Deserialize, Serialize};

use crate::arbiter::Arbitrate;

pub mod priority;
pub mod round_robin;

pub use priority::Priority;
pub use round_robin::RoundRobin;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArbiterPolicy {
    Priority(Priority),
    RoundRobin(RoundRobin),
}

impl Default for ArbiterPolicy {
    fn default() -> Self {
        ArbiterPolicy::RoundRobin(RoundRobin::default())
    }
}

impl Arbitrate for ArbiterPolicy {
    fn choose(&self, requests: &[bool], last_granted: Option<usize>) -> Option<usize> {
        match self {
            ArbiterPolicy::Priority(policy) => policy.choose(requests, last_granted),
            ArbiterPolicy::RoundRobin(policy) => policy.choose(requests, last_granted),
        }
    }
}
