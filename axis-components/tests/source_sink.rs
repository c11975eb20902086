// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use axis_components::sink::Sink;
use axis_components::source::Source;
use axis_components::test_helpers::{cycle_pause, random_pattern};
use axis_components::{connect_port, option_box_repeat};
use axis_engine::run_simulation;
use axis_engine::test_helpers::start_test;

#[test]
fn source_sink() {
    let engine = start_test(file!());

    let source = Source::new_and_register(&engine, engine.top(), "source", option_box_repeat!(0x123 ; 10)).unwrap();
    let sink = Sink::new_and_register(&engine, engine.top(), "sink").unwrap();
    connect_port!(source, tx => sink, rx).unwrap();

    run_simulation!(engine);
    assert_eq!(source.num_sourced(), 10);
    assert_eq!(sink.num_sunk(), 10);

    // One tick through the port and then one value per tick
    assert_eq!(engine.clock().tick_now().tick(), 11);
}

#[test]
fn order_kept_with_idle_and_backpressure() {
    let engine = start_test(file!());

    let values: Vec<usize> = (0..100).collect();
    let source = Source::new_and_register(
        &engine,
        engine.top(),
        "source",
        Some(Box::new(values.clone().into_iter())),
    )
    .unwrap();
    source.set_idle_generator(Some(random_pattern(1, 0.4)));
    let sink = Sink::new_and_register(&engine, engine.top(), "sink").unwrap();
    sink.set_backpressure_generator(Some(cycle_pause()));
    connect_port!(source, tx => sink, rx).unwrap();

    run_simulation!(engine);
    assert_eq!(sink.sunk(), values);
}

#[test]
fn no_generator() {
    let engine = start_test(file!());

    let source = Source::new_and_register(&engine, engine.top(), "source", None).unwrap();
    let sink: std::rc::Rc<Sink<i32>> = Sink::new_and_register(&engine, engine.top(), "sink").unwrap();
    connect_port!(source, tx => sink, rx).unwrap();

    run_simulation!(engine);
    assert_eq!(sink.num_sunk(), 0);
}

#[test]
#[should_panic(expected = "top::sink::rx already connected")]
fn double_connect() {
    let engine = start_test(file!());

    let source_a = Source::new_and_register(&engine, engine.top(), "a", option_box_repeat!(1 ; 1)).unwrap();
    let source_b = Source::new_and_register(&engine, engine.top(), "b", option_box_repeat!(1 ; 1)).unwrap();
    let sink = Sink::new_and_register(&engine, engine.top(), "sink").unwrap();
    connect_port!(source_a, tx => sink, rx).unwrap();
    connect_port!(source_b, tx => sink, rx).unwrap();
}
