// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! One beat of a stream.

use std::fmt::Display;
use std::sync::Arc;

use axis_engine::sim_error;
use axis_engine::traits::{Framed, Routable, SimObject, TotalBytes};
use axis_engine::types::SimError;
use axis_track::create_tag;
use axis_track::entity::Entity;
use axis_track::tag::{Tag, Tagged};

/// Maximum number of byte lanes; limited by the width of the keep mask.
pub const MAX_LANES: usize = 64;

/// Build a keep mask with the lowest `num_lanes` lanes valid.
#[must_use]
pub fn keep_mask(num_lanes: usize) -> u64 {
    if num_lanes >= MAX_LANES {
        u64::MAX
    } else {
        (1 << num_lanes) - 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    tag: Tag,
    data: Vec<u8>,
    keep: u64,
    last: bool,
    id: u64,
    dest: u64,
    user: u64,
}

impl Transaction {
    /// Create a transaction with every lane of `data` valid.
    ///
    /// The transaction is not the last of its frame until
    /// [`with_last()`](Self::with_last) says so.
    pub fn new(created_by: &Arc<Entity>, data: Vec<u8>) -> Result<Self, SimError> {
        if data.len() > MAX_LANES {
            return sim_error!(format!(
                "{created_by}: {} byte lanes exceeds the maximum of {MAX_LANES}",
                data.len()
            ));
        }
        Ok(Self {
            tag: create_tag!(created_by),
            keep: keep_mask(data.len()),
            data,
            last: false,
            id: 0,
            dest: 0,
            user: 0,
        })
    }

    #[must_use]
    pub fn with_keep(mut self, keep: u64) -> Self {
        self.keep = keep & keep_mask(self.data.len());
        self
    }

    #[must_use]
    pub fn with_last(mut self, last: bool) -> Self {
        self.last = last;
        self
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

    /// All byte lanes, including those not marked valid by `keep`.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn keep(&self) -> u64 {
        self.keep
    }

    /// Iterate over the bytes whose keep bit is set.
    pub fn valid_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.data
            .iter()
            .enumerate()
            .filter(|(lane, _)| self.keep & (1 << lane) != 0)
            .map(|(_, byte)| *byte)
    }
}

impl Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}: {} bytes, id {}, dest {}",
            self.tag,
            self.total_bytes(),
            self.id,
            self.dest
        )?;
        if self.last {
            write!(f, ", last")?;
        }
        Ok(())
    }
}

impl Tagged for Transaction {
    fn tag(&self) -> Tag {
        self.tag
    }
}

impl TotalBytes for Transaction {
    fn total_bytes(&self) -> usize {
        (self.keep & keep_mask(self.data.len())).count_ones() as usize
    }
}

impl Routable for Transaction {
    fn dest(&self) -> u64 {
        self.dest
    }
}

impl Framed for Transaction {
    fn last(&self) -> bool {
        self.last
    }

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn user(&self) -> u64 {
        self.user
    }

    fn set_last(&mut self, last: bool) {
        self.last = last;
    }

    fn set_user(&mut self, user: u64) {
        self.user = user;
    }
}

impl SimObject for Transaction {}

#[cfg(test)]
mod tests {
    use axis_track::entity::toplevel;
    use axis_track::tracker::dev_null_tracker;

    use super::*;

    #[test]
    fn keep_selects_valid_bytes() {
        let top = toplevel(&dev_null_tracker(), "top");
        let t = Transaction::new(&top, vec![1, 2, 3, 4])
            .unwrap()
            .with_keep(0b1010);
        assert_eq!(t.valid_bytes().collect::<Vec<_>>(), vec![2, 4]);
        assert_eq!(t.total_bytes(), 2);
    }

    #[test]
    fn keep_limited_to_data_lanes() {
        let top = toplevel(&dev_null_tracker(), "top");
        let t = Transaction::new(&top, vec![1, 2]).unwrap().with_keep(u64::MAX);
        assert_eq!(t.keep(), 0b11);
    }

    #[test]
    fn too_many_lanes() {
        let top = toplevel(&dev_null_tracker(), "top");
        let err = Transaction::new(&top, vec![0; MAX_LANES + 1]).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "Error: top: 65 byte lanes exceeds the maximum of 64"
        );
    }

    #[test]
    fn full_width_keep() {
        assert_eq!(keep_mask(0), 0);
        assert_eq!(keep_mask(8), 0xff);
        assert_eq!(keep_mask(MAX_LANES), u64::MAX);
    }
}
