// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Shared types.
//!
//! This file defines a number of common types used by the components.

/// The `DataGenerator` is what a [source](crate::source) uses
/// to generate data values to send.
pub type DataGenerator<T> = Box<dyn Iterator<Item = T> + 'static>;

/// A per-cycle pattern. A [source](crate::source) is idle on cycles where its
/// pattern yields `true` and a [sink](crate::sink) applies backpressure.
pub type PatternGenerator = Box<dyn Iterator<Item = bool> + 'static>;

/// Where the frame currently arriving on an input is going.
///
/// A route is decided when the first transaction of a frame arrives and is
/// held until the last transaction has been consumed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Route {
    /// No frame in progress.
    #[default]
    Idle,

    /// Frame is being sent to the given output.
    Output(usize),

    /// Frame is being consumed and discarded.
    Drop,
}
