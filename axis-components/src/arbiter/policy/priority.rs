// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Fixed priority arbitration policy

use serde::{Deserialize, Serialize};

use crate::arbiter::{Arbitrate, LsbPriority};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Priority {
    pub lsb_priority: LsbPriority,
}

impl Priority {
    #[must_use]
    pub fn new(lsb_priority: LsbPriority) -> Self {
        Self { lsb_priority }
    }
}

impl Arbitrate for Priority {
    fn choose(&self, requests: &[bool], _last_granted: Option<usize>) -> Option<usize> {
        match self.lsb_priority {
            LsbPriority::High => requests.iter().position(|r| *r),
            LsbPriority::Low => requests.iter().rposition(|r| *r),
        }
    }
}
