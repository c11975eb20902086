// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Data types carried across the stream fabric.
//!
//! A [`Transaction`](transaction::Transaction) is one beat of a stream: a set
//! of byte lanes with a per-lane keep mask and the `last`, `id`, `dest` and
//! `user` sideband signals. A [`Frame`](frame::Frame) is the packet that a
//! sequence of transactions terminated by `last` represents.

pub mod frame;
pub mod transaction;
