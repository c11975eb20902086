// Copyright (c) 2020 Graphcore Ltd. All rights reserved.

//! Logging and transaction tracing for the AXIS fabric models.
//!
//! Every component owns an [`Entity`](crate::entity::Entity) whose name gives
//! its place in the fabric, such as `top::switch::arb0`. Two kinds of event
//! are reported against it:
//!
//!   - messages, from `Trace` up to `Error`, written with [`trace!`],
//!     [`debug!`], [`info!`], [`warn!`] and [`error!`];
//!   - transaction movements, written with [`enter!`] and [`exit!`] when a
//!     tagged transaction is accepted by or leaves the component.
//!
//! A [`Tracker`] receives the events and decides per entity which levels are
//! kept, so a single arbiter can be traced while the rest of the fabric stays
//! quiet.
//!
//! ```rust
//! use axis_track::entity::toplevel;
//! use axis_track::info;
//! use axis_track::tracker::in_memory_tracker;
//!
//! let (tracker, lines) = in_memory_tracker(log::Level::Info);
//! let top = toplevel(&tracker, "top");
//! info!(top ; "{} frames delivered", 42);
//! assert_eq!(lines.lock().unwrap()[0], "top:INFO: 42 frames delivered");
//! ```

#![warn(missing_docs)]

use std::sync::{Arc, Mutex};

pub use log;

pub mod entity;
pub mod tag;

/// Trackers and the per-entity level filtering they share.
pub mod tracker;
pub use tracker::{Track, Tracker};

/// Destination of the text a tracker produces.
pub type Writer = Box<dyn std::io::Write + Send>;
type SharedWriter = Arc<Mutex<Writer>>;

pub use tag::{Tag, Tagged};

/// Marks a transaction that has not been given a tag.
pub const NO_ID: Tag = tag::Tag(0);

/// Tag of the top-level entity. Allocated tags start after it.
pub const ROOT: Tag = tag::Tag(1);

/// Record that the transaction tagged `$enter_tag` was accepted by
/// `$entity`.
///
/// Only emitted when the entity is traced at `Trace` level.
#[macro_export]
macro_rules! enter {
    ($entity:expr ; $enter_tag:expr) => {
        if $entity
            .tracker
            .is_entity_enabled($entity.tag, $crate::log::Level::Trace)
        {
            $entity.tracker.enter($entity.tag, $enter_tag);
        }
    };
}

/// Record that the transaction tagged `$exit_tag` left `$entity`.
#[macro_export]
macro_rules! exit {
    ($entity:expr ; $exit_tag:expr) => {
        if $entity
            .tracker
            .is_entity_enabled($entity.tag, $crate::log::Level::Trace)
        {
            $entity.tracker.exit($entity.tag, $exit_tag);
        }
    };
}

/// Allocate a fresh [`Tag`] from the tracker of `$entity`.
///
/// Transactions take one when they are built so that their path through the
/// fabric can be followed in the trace.
#[macro_export]
macro_rules! create_tag {
    ($entity:expr) => {{ $entity.tracker.unique_tag() }};
}

/// Send a message at level `$lvl` for `$entity`.
///
/// The arguments are not formatted unless the entity has that level
/// enabled. The level macros below are the usual way in.
#[doc(hidden)]
#[macro_export]
macro_rules! track_log {
    ($entity:expr ; $lvl:expr, $($arg:tt)+) => (
        if $entity.tracker.is_entity_enabled($entity.tag, $lvl) {
            $entity.tracker.log($entity.tag, $lvl, format_args!($($arg)+));
        }
    );
}

/// Per-transaction detail, e.g. arbitration decisions.
#[macro_export]
macro_rules! trace {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::track_log!($entity ; $crate::log::Level::Trace, $($arg)+);
    );
}

/// Per-frame events such as drops and grants.
#[macro_export]
macro_rules! debug {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::track_log!($entity ; $crate::log::Level::Debug, $($arg)+);
    );
}

/// Simulation summaries.
#[macro_export]
macro_rules! info {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::track_log!($entity ; $crate::log::Level::Info, $($arg)+);
    );
}

/// Traffic the fabric discards, such as unroutable frames.
#[macro_export]
macro_rules! warn {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::track_log!($entity ; $crate::log::Level::Warn, $($arg)+);
    );
}

/// Conditions that stop the simulation.
#[macro_export]
macro_rules! error {
    ($entity:expr ; $($arg:tt)+) => (
        $crate::track_log!($entity ; $crate::log::Level::Error, $($arg)+);
    );
}
