// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

#![doc(test(attr(warn(unused))))]

//! `AXIS` engine - a cycle-stepped simulation core for stream fabrics
//!
//! This library provides the [engine](crate::engine) which advances a set of
//! registered [components](crate::traits::Clocked) one clock tick at a time.
//! Components exchange data through [ports](crate::port) which model a
//! registered valid/ready handshake: anything offered during a tick only
//! becomes visible to the consumer on the following tick.
//!
//! # Simple Application
//!
//! A component only needs to implement [`Clocked`](crate::traits::Clocked):
//!
//! ```rust
//! use std::rc::Rc;
//! use std::sync::Arc;
//!
//! use axis_engine::engine::Engine;
//! use axis_engine::port::{InPort, OutPort};
//! use axis_engine::run_simulation;
//! use axis_engine::time::clock::ClockTick;
//! use axis_engine::traits::Clocked;
//! use axis_engine::types::SimResult;
//! use axis_track::entity::Entity;
//! use axis_track::tracker::dev_null_tracker;
//!
//! struct Echo {
//!     rx: InPort<i32>,
//!     tx: OutPort<i32>,
//! }
//!
//! impl Clocked for Echo {
//!     fn tick(&self, _now: &ClockTick) -> SimResult {
//!         if self.rx.valid() && self.tx.ready() {
//!             if let Some(value) = self.rx.take() {
//!                 self.tx.put(value)?;
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let engine = Engine::new(&dev_null_tracker());
//! let entity = Arc::new(Entity::new(engine.top(), "echo"));
//! let echo = Rc::new(Echo {
//!     rx: InPort::new(&engine, &entity, "rx"),
//!     tx: OutPort::new(&entity, "tx"),
//! });
//! engine.register(echo.clone());
//!
//! let out = InPort::new(&engine, engine.top(), "out");
//! echo.tx.connect(out.state());
//! run_simulation!(engine);
//! assert!(!out.valid());
//! ```

pub mod engine;
pub mod port;
pub mod test_helpers;
pub mod time;
pub mod traits;
pub mod types;

#[macro_export]
/// Run the simulation to completion.
///
/// The second form expects the simulation to fail with the given error text.
macro_rules! run_simulation {
    ($engine:ident) => {
        $engine.run().unwrap();
    };
    ($engine:ident, $expect:expr) => {
        match $engine.run() {
            Ok(()) => panic!("Expected an error!"),
            Err(e) => assert_eq!(format!("{e}").as_str(), $expect),
        }
    };
}
