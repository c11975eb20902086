// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! A set of common traits used across the AXIS engine.

use core::mem::size_of;
use std::fmt::{Debug, Display};
use std::rc::Rc;

use axis_track::tag::Tagged;

use crate::time::clock::ClockTick;
use crate::types::SimResult;

/// The `TotalBytes` trait is used to determine how many bytes an object
/// represents
pub trait TotalBytes {
    fn total_bytes(&self) -> usize;
}

/// The `Routable` trait provides an interface to an object to enable it to be
/// routed
pub trait Routable {
    fn dest(&self) -> u64;
}

/// The `Framed` trait exposes the stream sideband signals of one transfer.
///
/// A frame is a sequence of transfers terminated by one with `last()` set.
pub trait Framed {
    /// Whether this transfer terminates its frame.
    fn last(&self) -> bool;

    /// Source identifier.
    fn id(&self) -> u64;

    /// Overwrite the source identifier.
    fn set_id(&mut self, id: u64);

    /// Sideband user word.
    fn user(&self) -> u64;

    /// Force the end of the frame at this transfer.
    fn set_last(&mut self, last: bool);

    /// Overwrite the sideband user word.
    fn set_user(&mut self, user: u64);
}

/// A super-trait that objects that are passed around the simulation have to
/// implement
///
///  - Clone:       Components keep copies of objects in their registers.
///  - Debug:       In order to print "{:?}".
///  - Display:     Used by the log messages.
///  - Framed:      Allows frame-aware components to find frame boundaries.
///  - Routable:    Allows routing.
///  - TotalBytes:  Allows statistics in bytes.
///  - Tagged:      Allows for simple logging
pub trait SimObject:
    Clone + Debug + Display + Framed + Routable + Tagged + TotalBytes + 'static
{
}

// Implementations for basic types that can be sent around the simulation for
// testing. Each value is a complete single-transfer frame.

// i32
impl TotalBytes for i32 {
    fn total_bytes(&self) -> usize {
        size_of::<i32>()
    }
}

impl Routable for i32 {
    fn dest(&self) -> u64 {
        *self as u64
    }
}

impl Framed for i32 {
    fn last(&self) -> bool {
        true
    }
    fn id(&self) -> u64 {
        0
    }
    fn set_id(&mut self, _id: u64) {}
    fn user(&self) -> u64 {
        0
    }
    fn set_last(&mut self, _last: bool) {}
    fn set_user(&mut self, _user: u64) {}
}

impl SimObject for i32 {}

// usize
impl TotalBytes for usize {
    fn total_bytes(&self) -> usize {
        size_of::<usize>()
    }
}

impl Routable for usize {
    fn dest(&self) -> u64 {
        *self as u64
    }
}

impl Framed for usize {
    fn last(&self) -> bool {
        true
    }
    fn id(&self) -> u64 {
        0
    }
    fn set_id(&mut self, _id: u64) {}
    fn user(&self) -> u64 {
        0
    }
    fn set_last(&mut self, _last: bool) {}
    fn set_user(&mut self, _user: u64) {}
}

impl SimObject for usize {}

/// A component that is advanced once per clock tick.
pub trait Clocked {
    /// Perform the work of one cycle.
    ///
    /// All components observe the port state as it was at the start of the
    /// cycle, so the order in which components are ticked does not matter.
    fn tick(&self, now: &ClockTick) -> SimResult;

    /// Whether the component still holds or expects to produce data.
    ///
    /// The engine considers the simulation complete once no component is busy
    /// and all ports are empty.
    fn is_busy(&self) -> bool {
        false
    }
}

/// Complete any pending transactions.
pub trait Resolve {
    /// Complete any pending update.
    fn resolve(&self);

    /// Whether there is nothing left to resolve or consume.
    fn is_idle(&self) -> bool;
}

/// A [`Resolver`] is used to register any [`Resolve`] functions that need to be
/// called.
pub trait Resolver {
    fn add_resolve(&self, resolve: Rc<dyn Resolve + 'static>);
}
