// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Helpers shared by the component tests, benchmarks and demos.

use std::sync::Arc;

use axis_engine::traits::Framed;
use axis_engine::types::SimError;
use axis_protocols::frame::Frame;
use axis_protocols::transaction::Transaction;
use axis_track::entity::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{DataGenerator, PatternGenerator};

/// Bytes counting up from 0 and wrapping at 256.
#[must_use]
pub fn incrementing_payload(length: usize) -> Vec<u8> {
    (0..length).map(|i| (i % 256) as u8).collect()
}

/// Three cycles on, one cycle off.
#[must_use]
pub fn cycle_pause() -> PatternGenerator {
    Box::new([true, true, true, false].into_iter().cycle())
}

/// Each cycle is `true` with the given probability.
#[must_use]
pub fn random_pattern(seed: u64, probability: f64) -> PatternGenerator {
    let mut rng = StdRng::seed_from_u64(seed);
    Box::new(std::iter::repeat_with(move || rng.gen_bool(probability)))
}

/// Generate the transactions for a sequence of frames.
///
/// Fails if `bytes_per_beat` is not a valid number of lanes.
pub fn frame_generator(
    created_by: &Arc<Entity>,
    frames: &[Frame],
    bytes_per_beat: usize,
) -> Result<Option<DataGenerator<Transaction>>, SimError> {
    let mut transactions = Vec::new();
    for frame in frames {
        transactions.extend(frame.to_transactions(created_by, bytes_per_beat)?);
    }
    Ok(Some(Box::new(transactions.into_iter())))
}

/// Check that a stream of transactions never interleaves frames from
/// different sources, using the id of each transaction as its source.
///
/// # Panics
///
/// If a transaction with a different id appears within a frame.
pub fn check_frames_atomic(transactions: &[Transaction]) {
    let mut current: Option<u64> = None;
    for t in transactions {
        match current {
            Some(id) => assert_eq!(id, t.id(), "frame interleaved at {t}"),
            None => current = Some(t.id()),
        }
        if t.last() {
            current = None;
        }
    }
}

/// Select the frames of a list that are addressed to `dest`.
#[must_use]
pub fn frames_for_dest(frames: &[Frame], dest: u64) -> Vec<Frame> {
    frames.iter().filter(|f| f.dest == dest).cloned().collect()
}
