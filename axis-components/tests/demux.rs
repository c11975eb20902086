// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use axis_components::connect_port;
use axis_components::demux::{Demux, SelectSource};
use axis_components::sink::Sink;
use axis_components::source::Source;
use axis_components::test_helpers::{frame_generator, frames_for_dest, incrementing_payload};
use axis_components::types::Route;
use axis_engine::engine::Engine;
use axis_engine::run_simulation;
use axis_engine::test_helpers::start_test;
use axis_protocols::frame::{Frame, frames_from_stream};
use axis_protocols::transaction::Transaction;

fn build_demux(
    engine: &Engine,
    frames: &[Frame],
    num_tx: usize,
    select_source: SelectSource,
) -> (Rc<Demux<Transaction>>, Vec<Rc<Sink<Transaction>>>) {
    let source = Source::new_and_register(
        engine,
        engine.top(),
        "source",
        frame_generator(engine.top(), frames, 4).unwrap(),
    )
    .unwrap();
    let demux = Demux::new_and_register(engine, engine.top(), "demux", num_tx, select_source).unwrap();
    connect_port!(source, tx => demux, rx).unwrap();

    let sinks = (0..num_tx)
        .map(|i| {
            let sink = Sink::new_and_register(engine, engine.top(), &format!("sink{i}")).unwrap();
            connect_port!(demux, tx, i => sink, rx).unwrap();
            sink
        })
        .collect();
    (demux, sinks)
}

#[test]
fn select_sampled_at_frame_start() {
    let engine = start_test(file!());

    let frames = vec![
        Frame::new(incrementing_payload(32)).with_id(1),
        Frame::new(incrementing_payload(20)).with_id(2),
    ];
    let (demux, sinks) = build_demux(&engine, &frames, 2, SelectSource::Control);
    demux.set_select(1);

    engine.run_for(3).unwrap();
    assert_eq!(demux.route(), Route::Output(1));

    // Only affects the next frame
    demux.set_select(0);
    run_simulation!(engine);

    assert_eq!(frames_from_stream(&sinks[1].sunk()).unwrap(), vec![frames[0].clone()]);
    assert_eq!(frames_from_stream(&sinks[0].sunk()).unwrap(), vec![frames[1].clone()]);
    assert_eq!(demux.route(), Route::Idle);
}

#[test]
fn route_by_dest() {
    let engine = start_test(file!());

    let frames: Vec<Frame> = (0..12)
        .map(|i| {
            Frame::new(incrementing_payload(5 + i))
                .with_id(i as u64)
                .with_dest(i as u64 % 3)
        })
        .collect();
    let (demux, sinks) = build_demux(&engine, &frames, 2, SelectSource::Dest);

    run_simulation!(engine);

    for (dest, sink) in sinks.iter().enumerate() {
        assert_eq!(
            frames_from_stream(&sink.sunk()).unwrap(),
            frames_for_dest(&frames, dest as u64)
        );
    }
    // Dest 2 has no output
    assert_eq!(demux.num_dropped_frames(), 4);
}

#[test]
fn drop_control_discards_frames() {
    let engine = start_test(file!());

    let frames: Vec<Frame> = (0..5)
        .map(|i| Frame::new(incrementing_payload(9)).with_id(i))
        .collect();
    let (demux, sinks) = build_demux(&engine, &frames, 2, SelectSource::Control);
    demux.set_drop(true);

    run_simulation!(engine);

    assert_eq!(demux.num_dropped_frames(), 5);
    assert!(sinks.iter().all(|s| s.num_sunk() == 0));
}

#[test]
fn disabled_demux_holds_input() {
    let engine = start_test(file!());

    let frames = vec![Frame::new(incrementing_payload(16))];
    let (demux, sinks) = build_demux(&engine, &frames, 2, SelectSource::Control);
    demux.set_enable(false);

    engine.run_for(20).unwrap();
    assert_eq!(demux.route(), Route::Idle);
    assert_eq!(sinks[0].num_sunk(), 0);

    demux.set_enable(true);
    run_simulation!(engine);
    assert_eq!(frames_from_stream(&sinks[0].sunk()).unwrap(), frames);
}

#[test]
fn disable_mid_frame_completes_frame() {
    let engine = start_test(file!());

    let frames = vec![
        Frame::new(incrementing_payload(32)).with_id(1),
        Frame::new(incrementing_payload(16)).with_id(2),
    ];
    let (demux, sinks) = build_demux(&engine, &frames, 2, SelectSource::Control);

    engine.run_for(3).unwrap();
    assert_eq!(demux.route(), Route::Output(0));

    // The frame in flight still completes, the next one is held
    demux.set_enable(false);
    engine.run_for(40).unwrap();
    assert_eq!(frames_from_stream(&sinks[0].sunk()).unwrap(), vec![frames[0].clone()]);
    assert_eq!(demux.route(), Route::Idle);
    assert_eq!(sinks[1].num_sunk(), 0);

    demux.set_enable(true);
    run_simulation!(engine);
    assert_eq!(frames_from_stream(&sinks[0].sunk()).unwrap(), frames);
}

#[test]
fn stalled_output_backpressures() {
    let engine = start_test(file!());

    let frames: Vec<Frame> = (0..3)
        .map(|i| Frame::new(incrementing_payload(12)).with_id(i))
        .collect();
    let (demux, sinks) = build_demux(&engine, &frames, 2, SelectSource::Control);
    demux.set_select(1);
    sinks[1].set_backpressure_generator(Some(Box::new(std::iter::repeat(true).take(40))));

    engine.run_for(20).unwrap();
    assert_eq!(demux.route(), Route::Output(1));
    assert!(sinks.iter().all(|s| s.num_sunk() == 0));

    run_simulation!(engine);

    assert_eq!(frames_from_stream(&sinks[1].sunk()).unwrap(), frames);
    assert_eq!(sinks[0].num_sunk(), 0);
    assert_eq!(demux.num_dropped_frames(), 0);
}
