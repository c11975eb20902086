// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Stream fabric components.
//!
//! Every component is created with a `new_and_register` function which
//! registers it with the [`Engine`](axis_engine::engine::Engine) so that it is
//! ticked every cycle. Components are then wired together with
//! [`connect_port!`].
//!
//! ```rust
//! use axis_components::connect_port;
//! use axis_components::sink::Sink;
//! use axis_components::source::Source;
//! use axis_components::option_box_repeat;
//! use axis_engine::engine::Engine;
//! use axis_engine::run_simulation;
//! use axis_track::tracker::dev_null_tracker;
//!
//! let engine = Engine::new(&dev_null_tracker());
//! let source = Source::new_and_register(&engine, engine.top(), "source", option_box_repeat!(0x123 ; 10)).unwrap();
//! let sink = Sink::new_and_register(&engine, engine.top(), "sink").unwrap();
//! connect_port!(source, tx => sink, rx).unwrap();
//! run_simulation!(engine);
//! assert_eq!(sink.num_sunk(), 10);
//! ```

pub mod arbiter;
pub mod broadcast;
pub mod connect;
pub mod crosspoint;
pub mod demux;
pub mod fifo;
pub mod mux;
pub mod select_mux;
pub mod sink;
pub mod source;
pub mod switch;
pub mod test_helpers;
pub mod types;
