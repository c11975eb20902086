// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Round Robin arbitration policy
//!
//! The port after the last granted one (in priority order) is preferred. When
//! no such port is requesting the choice wraps to the highest priority
//! requesting port.

use serde::{Deserialize, Serialize};

use crate::arbiter::policy::Priority;
use crate::arbiter::{Arbitrate, LsbPriority};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRobin {
    pub lsb_priority: LsbPriority,
}

impl RoundRobin {
    #[must_use]
    pub fn new(lsb_priority: LsbPriority) -> Self {
        Self { lsb_priority }
    }
}

impl Arbitrate for RoundRobin {
    fn choose(&self, requests: &[bool], last_granted: Option<usize>) -> Option<usize> {
        let after_last = last_granted.and_then(|last| match self.lsb_priority {
            LsbPriority::High => requests
                .iter()
                .enumerate()
                .skip(last + 1)
                .find(|(_, r)| **r)
                .map(|(i, _)| i),
            LsbPriority::Low => requests[..last.min(requests.len())]
                .iter()
                .rposition(|r| *r),
        });
        after_last.or_else(|| Priority::new(self.lsb_priority).choose(requests, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant_sequence(policy: &RoundRobin, requests: &[bool], count: usize) -> Vec<usize> {
        let mut last = None;
        let mut grants = Vec::new();
        for _ in 0..count {
            last = policy.choose(requests, last);
            grants.extend(last);
        }
        grants
    }

    #[test]
    fn rotates_upwards() {
        let policy = RoundRobin::new(LsbPriority::High);
        assert_eq!(grant_sequence(&policy, &[true; 4], 6), vec![0, 1, 2, 3, 0, 1]);
        assert_eq!(
            grant_sequence(&policy, &[true, false, true, true], 4),
            vec![0, 2, 3, 0]
        );
    }

    #[test]
    fn rotates_downwards() {
        let policy = RoundRobin::new(LsbPriority::Low);
        assert_eq!(grant_sequence(&policy, &[true; 4], 6), vec![3, 2, 1, 0, 3, 2]);
        assert_eq!(
            grant_sequence(&policy, &[true, true, false, true], 4),
            vec![3, 1, 0, 3]
        );
    }

    #[test]
    fn wraps_to_highest_priority() {
        let policy = RoundRobin::new(LsbPriority::High);
        assert_eq!(policy.choose(&[false, true, false, false], Some(2)), Some(1));
        assert_eq!(policy.choose(&[false; 4], Some(2)), None);
    }
}
