// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use axis_components::broadcast::Broadcast;
use axis_components::connect_port;
use axis_components::sink::Sink;
use axis_components::source::Source;
use axis_components::test_helpers::{cycle_pause, random_pattern};
use axis_engine::run_simulation;
use axis_engine::test_helpers::start_test;

#[test]
fn all_outputs_see_same_stream() {
    let engine = start_test(file!());

    let values: Vec<i32> = (0..50).collect();
    let source = Source::new_and_register(
        &engine,
        engine.top(),
        "source",
        Some(Box::new(values.clone().into_iter())),
    )
    .unwrap();
    source.set_idle_generator(Some(cycle_pause()));
    let broadcast = Broadcast::new_and_register(&engine, engine.top(), "broadcast", 3).unwrap();
    connect_port!(source, tx => broadcast, rx).unwrap();

    let sinks: Vec<_> = (0..3)
        .map(|i| {
            let sink = Sink::new_and_register(&engine, engine.top(), &format!("sink{i}")).unwrap();
            sink.set_backpressure_generator(Some(random_pattern(i, 0.25 * i as f64)));
            connect_port!(broadcast, tx, i as usize => sink, rx).unwrap();
            sink
        })
        .collect();

    run_simulation!(engine);

    for sink in &sinks {
        assert_eq!(sink.sunk(), values);
    }
}

#[test]
fn needs_an_output() {
    let engine = start_test(file!());
    let result = Broadcast::<i32>::new_and_register(&engine, engine.top(), "broadcast", 0);
    assert_eq!(
        result.err().unwrap().to_string(),
        "Error: top::broadcast: must have at least one output"
    );
}
