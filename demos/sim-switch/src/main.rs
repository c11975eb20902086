// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Simulate a number of sources sending frames through FIFOs into a switch.
//!
//! The switch and FIFOs are configured from an optional TOML file and from
//! `AXIS_` environment variables, for example:
//!
//! ```toml
//! [switch]
//! num_inputs = 4
//! arbiter = { kind = "priority" }
//!
//! [[switch.outputs]]
//! base = 0
//! top = 0
//!
//! [[switch.outputs]]
//! base = 1
//! top = 1
//!
//! [fifo]
//! depth = 32
//! frame_fifo = true
//! ```
//!
//! For example, run using:
//!   cargo run --bin sim-switch -- --conf-file switch.toml --stdout-level debug

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use axis_components::connect_port;
use axis_components::fifo::{Fifo, FifoConfig};
use axis_components::sink::Sink;
use axis_components::source::Source;
use axis_components::switch::{Switch, SwitchConfig};
use axis_components::test_helpers::{frame_generator, random_pattern};
use axis_config::load_config;
use axis_engine::engine::Engine;
use axis_engine::sim_error;
use axis_engine::traits::Framed;
use axis_engine::types::SimError;
use axis_protocols::frame::Frame;
use axis_protocols::transaction::Transaction;
use axis_track::entity::Entity;
use axis_track::tracker::filtered_stdout_tracker;
use axis_track::{error, info};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables that override the configuration.
const ENV_PREFIX: &str = "AXIS_";

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "Switch evaluation application")]
struct Cli {
    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,

    /// Set a regular expression for which entites should have logging level set
    /// to `--stdout-level`. Others will have level set to `Error`.
    #[arg(long, default_value = "")]
    stdout_filter_regex: String,

    /// TOML file holding the switch and FIFO configuration.
    #[arg(long)]
    conf_file: Option<PathBuf>,

    /// Configure a clock tick on which to terminate the simulation. Use 0 to
    /// run until completion.
    #[arg(long, default_value = "0")]
    finish_tick: u64,

    /// The number of frames sent by each source.
    #[arg(long, default_value = "100")]
    frames_per_source: usize,

    /// The largest frame payload in bytes. Frame sizes are chosen uniformly
    /// from 1 to this value.
    #[arg(long, default_value = "256")]
    max_frame_bytes: usize,

    /// Width of the stream in bytes.
    #[arg(long, default_value = "8")]
    bytes_per_beat: usize,

    /// Probability that a source is idle on any cycle.
    #[arg(long, default_value = "0.0")]
    idle_probability: f64,

    /// Probability that a sink applies backpressure on any cycle.
    #[arg(long, default_value = "0.0")]
    backpressure_probability: f64,

    /// Seed for random number generator.
    #[arg(long, default_value = "1")]
    seed: u64,
}

/// Configuration that can be loaded from file or the environment.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SimConfig {
    switch: SwitchConfig,
    fifo: FifoConfig,
}

/// Build the frames for one source. Each frame is addressed to one of the
/// outputs that the source is allowed to reach.
fn create_frames(
    args: &Cli,
    config: &SwitchConfig,
    input: usize,
    rng: &mut StdRng,
) -> Vec<Frame> {
    let dests: Vec<u64> = config
        .outputs
        .iter()
        .filter(|output| {
            output
                .connect
                .as_ref()
                .is_none_or(|connect| connect.contains(&input))
        })
        .map(|output| rng.gen_range(output.base..=output.top))
        .collect();
    if dests.is_empty() {
        return Vec::new();
    }

    (0..args.frames_per_source)
        .map(|_| {
            let num_bytes = rng.gen_range(1..=args.max_frame_bytes.max(1));
            let data = (0..num_bytes).map(|_| rng.r#gen()).collect();
            let dest = dests[rng.gen_range(0..dests.len())];
            Frame::new(data).with_id(input as u64).with_dest(dest)
        })
        .collect()
}

type Sinks = Vec<Rc<Sink<Transaction>>>;
type Fifos = Vec<Rc<Fifo<Transaction>>>;

fn build(
    engine: &Engine,
    args: &Cli,
    config: &SimConfig,
) -> Result<(Rc<Switch<Transaction>>, Fifos, Sinks, usize), SimError> {
    let top = engine.top();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let switch = Switch::new_and_register(engine, top, "switch", &config.switch)?;

    let mut fifos = Vec::new();
    let mut total_frames = 0;
    for i in 0..config.switch.num_inputs {
        let frames = create_frames(args, &config.switch, i, &mut rng);
        total_frames += frames.len();

        let mut transactions = Vec::new();
        for frame in &frames {
            transactions.extend(frame.to_transactions(top, args.bytes_per_beat)?);
        }
        let source = Source::new_and_register(
            engine,
            top,
            &format!("source{i}"),
            Some(Box::new(transactions.into_iter())),
        )?;
        if args.idle_probability > 0.0 {
            source.set_idle_generator(Some(random_pattern(
                rng.r#gen(),
                args.idle_probability,
            )));
        }

        let fifo = Fifo::new_and_register(engine, top, &format!("fifo{i}"), &config.fifo)?;
        connect_port!(source, tx => fifo, rx)?;
        connect_port!(fifo, tx => switch, rx, i)?;
        fifos.push(fifo);
    }

    let mut sinks = Vec::new();
    for i in 0..config.switch.outputs.len() {
        let sink = Sink::new_and_register(engine, top, &format!("sink{i}"))?;
        if args.backpressure_probability > 0.0 {
            sink.set_backpressure_generator(Some(random_pattern(
                rng.r#gen(),
                args.backpressure_probability,
            )));
        }
        connect_port!(switch, tx, i => sink, rx)?;
        sinks.push(sink);
    }

    Ok((switch, fifos, sinks, total_frames))
}

fn main() -> Result<(), SimError> {
    let args = Cli::parse();
    let tracker = filtered_stdout_tracker(args.stdout_level, &args.stdout_filter_regex);
    let engine = Engine::new(&tracker);
    let top = engine.top().clone();

    let config: SimConfig = match load_config(args.conf_file.as_deref(), ENV_PREFIX) {
        Ok(config) => config,
        Err(e) => {
            error!(top ; "Failed to load configuration: {e}");
            tracker.shutdown();
            return sim_error!(format!("configuration: {e}"));
        }
    };
    info!(top ; "Switch {}x{}, arbiter {:?}", config.switch.num_inputs, config.switch.outputs.len(), config.switch.arbiter);
    info!(top ; "Each source sending {} frames of up to {} bytes. Random seed {}", args.frames_per_source, args.max_frame_bytes, args.seed);

    let (switch, fifos, sinks, total_frames) = build(&engine, &args, &config)?;
    info!(top ; "Platform built and connected");

    let result = if args.finish_tick == 0 {
        engine.run()
    } else {
        engine.run_for(args.finish_tick)
    };
    if let Err(e) = result {
        error!(top ; "{e} at {:.2}ns", engine.time_now_ns());
        tracker.shutdown();
        return Err(e);
    }

    print_summary(&top, &engine, &switch, &fifos, &sinks, total_frames);
    tracker.shutdown();
    Ok(())
}

fn print_summary(
    top: &Arc<Entity>,
    engine: &Engine,
    switch: &Switch<Transaction>,
    fifos: &Fifos,
    sinks: &Sinks,
    total_frames: usize,
) {
    let received_frames: usize = sinks
        .iter()
        .map(|sink| sink.sunk().iter().filter(|t| t.last()).count())
        .sum();
    let received_bytes: usize = sinks
        .iter()
        .flat_map(|sink| sink.sunk())
        .map(|t| t.valid_bytes().count())
        .sum();
    let overflows: usize = fifos.iter().map(|fifo| fifo.overflow_count()).sum();
    let bad_frames: usize = fifos.iter().map(|fifo| fifo.bad_frame_count()).sum();

    let time_now_ns = engine.time_now_ns();
    info!(top ; "Received {received_frames}/{total_frames} frames ({received_bytes} bytes) in {time_now_ns:.2}ns");
    info!(top ; "Unroutable {}, FIFO overflows {overflows}, bad frames {bad_frames}", switch.num_unroutable_frames());
}
