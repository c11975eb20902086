// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A frame (packet) and its conversion to and from stream transactions.

use std::sync::Arc;

use axis_engine::sim_error;
use axis_engine::traits::{Framed, Routable};
use axis_engine::types::SimError;
use axis_track::entity::Entity;

use crate::transaction::{MAX_LANES, Transaction, keep_mask};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub id: u64,
    pub dest: u64,
    pub user: u64,
}

impl Frame {
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_dest(mut self, dest: u64) -> Self {
        self.dest = dest;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: u64) -> Self {
        self.user = user;
        self
    }

    /// Split the frame into transactions of `bytes_per_beat` lanes.
    ///
    /// The final transaction has `last` set and only the lanes holding frame
    /// data are marked valid. An empty frame is a single transaction with no
    /// valid lanes. The sideband signals are replicated on every transaction.
    pub fn to_transactions(
        &self,
        created_by: &Arc<Entity>,
        bytes_per_beat: usize,
    ) -> Result<Vec<Transaction>, SimError> {
        if bytes_per_beat == 0 || bytes_per_beat > MAX_LANES {
            return sim_error!(format!(
                "{created_by}: invalid bytes per beat {bytes_per_beat}"
            ));
        }

        let num_beats = self.data.len().div_ceil(bytes_per_beat).max(1);
        let mut transactions = Vec::with_capacity(num_beats);
        for beat in 0..num_beats {
            let start = (beat * bytes_per_beat).min(self.data.len());
            let end = ((beat + 1) * bytes_per_beat).min(self.data.len());
            let mut lanes = self.data[start..end].to_vec();
            let num_valid = lanes.len();
            lanes.resize(bytes_per_beat, 0);

            transactions.push(
                Transaction::new(created_by, lanes)?
                    .with_keep(keep_mask(num_valid))
                    .with_last(beat + 1 == num_beats)
                    .with_id(self.id)
                    .with_dest(self.dest)
                    .with_user(self.user),
            );
        }
        Ok(transactions)
    }

    /// Rebuild a frame from its transactions.
    ///
    /// Only lanes marked valid contribute data. The `id` and `dest` are taken
    /// from the first transaction and `user` from the last one, which is
    /// where a bad-frame marker is signalled.
    pub fn from_transactions(transactions: &[Transaction]) -> Result<Self, SimError> {
        let (Some(first), Some(final_beat)) = (transactions.first(), transactions.last()) else {
            return sim_error!("no transactions to build a frame from");
        };
        if !final_beat.last() {
            return sim_error!(format!("frame incomplete, {final_beat} is not last"));
        }
        if let Some(early) = transactions[..transactions.len() - 1]
            .iter()
            .find(|t| t.last())
        {
            return sim_error!(format!("frame ended early at {early}"));
        }

        Ok(Self {
            data: transactions.iter().flat_map(|t| t.valid_bytes()).collect(),
            id: first.id(),
            dest: first.dest(),
            user: final_beat.user(),
        })
    }
}

/// Split a stream of transactions into frames at every `last`.
///
/// Transactions after the final `last` are an incomplete frame and are
/// reported as an error.
pub fn frames_from_stream(transactions: &[Transaction]) -> Result<Vec<Frame>, SimError> {
    let mut frames = Vec::new();
    let mut start = 0;
    for (i, t) in transactions.iter().enumerate() {
        if t.last() {
            frames.push(Frame::from_transactions(&transactions[start..=i])?);
            start = i + 1;
        }
    }
    if start != transactions.len() {
        return sim_error!(format!(
            "{} transactions left after the last complete frame",
            transactions.len() - start
        ));
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use axis_engine::traits::TotalBytes;
    use axis_track::entity::toplevel;
    use axis_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn split_partial_final_beat() {
        let top = toplevel(&dev_null_tracker(), "top");
        let frame = Frame::new((0..10).collect()).with_dest(3);
        let beats = frame.to_transactions(&top, 4).unwrap();

        assert_eq!(beats.len(), 3);
        assert_eq!(
            beats.iter().map(|b| b.total_bytes()).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
        assert_eq!(
            beats.iter().map(|b| b.last()).collect::<Vec<_>>(),
            vec![false, false, true]
        );
        assert!(beats.iter().all(|b| b.dest() == 3));
        assert_eq!(beats[2].keep(), 0b11);
    }

    #[test]
    fn empty_frame_is_one_beat() {
        let top = toplevel(&dev_null_tracker(), "top");
        let beats = Frame::new(Vec::new()).to_transactions(&top, 8).unwrap();
        assert_eq!(beats.len(), 1);
        assert!(beats[0].last());
        assert_eq!(beats[0].total_bytes(), 0);
    }

    #[test]
    fn reassemble_honours_keep() {
        let top = toplevel(&dev_null_tracker(), "top");
        let beats = vec![
            Transaction::new(&top, vec![1, 2, 3]).unwrap().with_keep(0b101),
            Transaction::new(&top, vec![4, 5])
                .unwrap()
                .with_last(true)
                .with_user(1),
        ];
        let frame = Frame::from_transactions(&beats).unwrap();
        assert_eq!(frame.data, vec![1, 3, 4, 5]);
        assert_eq!(frame.user, 1);
    }

    #[test]
    fn reassemble_rejects_bad_framing() {
        let top = toplevel(&dev_null_tracker(), "top");
        let open = vec![Transaction::new(&top, vec![1]).unwrap()];
        assert!(Frame::from_transactions(&open).is_err());
        assert!(Frame::from_transactions(&[]).is_err());

        let early = vec![
            Transaction::new(&top, vec![1]).unwrap().with_last(true),
            Transaction::new(&top, vec![2]).unwrap().with_last(true),
        ];
        assert!(Frame::from_transactions(&early).is_err());
        assert_eq!(frames_from_stream(&early).unwrap().len(), 2);
    }

    #[test]
    fn invalid_width() {
        let top = toplevel(&dev_null_tracker(), "top");
        let frame = Frame::new(vec![1]);
        assert!(frame.to_transactions(&top, 0).is_err());
        assert!(frame.to_transactions(&top, MAX_LANES + 1).is_err());
    }
}
