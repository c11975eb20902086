// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use axis_components::connect_port;
use axis_components::crosspoint::Crosspoint;
use axis_components::sink::Sink;
use axis_components::source::Source;
use axis_engine::engine::Engine;
use axis_engine::run_simulation;
use axis_engine::test_helpers::start_test;

fn build_crosspoint(
    engine: &Engine,
    inputs: &[Vec<i32>],
    num_tx: usize,
) -> (Rc<Crosspoint<i32>>, Vec<Rc<Sink<i32>>>) {
    let crosspoint =
        Crosspoint::new_and_register(engine, engine.top(), "crosspoint", inputs.len(), num_tx).unwrap();
    for (i, values) in inputs.iter().enumerate() {
        let source = Source::new_and_register(
            engine,
            engine.top(),
            &format!("source{i}"),
            Some(Box::new(values.clone().into_iter())),
        )
        .unwrap();
        connect_port!(source, tx => crosspoint, rx, i).unwrap();
    }
    let sinks = (0..num_tx)
        .map(|i| {
            let sink = Sink::new_and_register(engine, engine.top(), &format!("sink{i}")).unwrap();
            connect_port!(crosspoint, tx, i => sink, rx).unwrap();
            sink
        })
        .collect();
    (crosspoint, sinks)
}

#[test]
fn default_selects_fan_out_input_zero() {
    let engine = start_test(file!());
    let values: Vec<i32> = (0..10).collect();
    let (crosspoint, sinks) = build_crosspoint(&engine, &[values.clone()], 2);

    run_simulation!(engine);

    assert_eq!(sinks[0].sunk(), values);
    assert_eq!(sinks[1].sunk(), values);
    assert_eq!(crosspoint.num_dropped(), 0);
}

#[test]
fn swapped_selects() {
    let engine = start_test(file!());
    let a: Vec<i32> = (0..10).collect();
    let b: Vec<i32> = (100..110).collect();
    let (crosspoint, sinks) = build_crosspoint(&engine, &[a.clone(), b.clone()], 2);
    crosspoint.set_select(0, 1).unwrap();
    crosspoint.set_select(1, 0).unwrap();

    run_simulation!(engine);

    assert_eq!(sinks[0].sunk(), b);
    assert_eq!(sinks[1].sunk(), a);
}

#[test]
fn select_change_takes_effect_next_cycle() {
    let engine = start_test(file!());
    let a: Vec<i32> = (0..10).collect();
    let b: Vec<i32> = (100..110).collect();
    let (crosspoint, sinks) = build_crosspoint(&engine, &[a.clone(), b], 2);

    engine.run_for(5).unwrap();
    crosspoint.set_select(0, 1).unwrap();
    run_simulation!(engine);

    let mut expected: Vec<i32> = (0..4).collect();
    expected.extend(104..110);
    assert_eq!(sinks[0].sunk(), expected);
    assert_eq!(sinks[1].sunk(), a);
}

#[test]
fn output_not_ready_drops() {
    let engine = start_test(file!());
    let values: Vec<i32> = (0..5).collect();
    let (crosspoint, sinks) = build_crosspoint(&engine, &[values], 1);
    sinks[0].set_backpressure_generator(Some(Box::new(std::iter::repeat(true))));

    engine.run_for(20).unwrap();

    // Two values fit in the sink port, the rest are lost
    assert_eq!(crosspoint.num_dropped(), 3);
    assert_eq!(sinks[0].num_sunk(), 0);
}

#[test]
fn select_out_of_range() {
    let engine = start_test(file!());
    let (crosspoint, _) = build_crosspoint(&engine, &[vec![], vec![]], 3);

    assert_eq!(
        crosspoint.set_select(3, 0).unwrap_err().to_string(),
        "Error: top::crosspoint: select output 3 out of range (0..3)"
    );
    assert_eq!(
        crosspoint.set_select(0, 2).unwrap_err().to_string(),
        "Error: top::crosspoint: select input 2 out of range (0..2)"
    );
}
