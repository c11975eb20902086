// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use axis_components::arbiter::LsbPriority;
use axis_components::arbiter::policy::{ArbiterPolicy, Priority};
use axis_components::connect_port;
use axis_components::sink::Sink;
use axis_components::source::Source;
use axis_components::switch::{Switch, SwitchConfig, SwitchOutputConfig};
use axis_components::test_helpers::{
    check_frames_atomic, frame_generator, frames_for_dest, incrementing_payload, random_pattern,
};
use axis_components::types::Route;
use axis_engine::engine::Engine;
use axis_engine::run_simulation;
use axis_engine::test_helpers::start_test;
use axis_engine::traits::Framed;
use axis_protocols::frame::{Frame, frames_from_stream};
use axis_protocols::transaction::Transaction;
use axis_track::tracker::in_memory_tracker;

const BYTES_PER_BEAT: usize = 8;

fn build_switch(
    engine: &Engine,
    config: &SwitchConfig,
    all_frames: &[Vec<Frame>],
    stress: bool,
) -> (Rc<Switch<Transaction>>, Vec<Rc<Sink<Transaction>>>) {
    let switch = Switch::new_and_register(engine, engine.top(), "switch", config).unwrap();

    for (i, frames) in all_frames.iter().enumerate() {
        let source = Source::new_and_register(
            engine,
            engine.top(),
            &format!("source{i}"),
            frame_generator(engine.top(), frames, BYTES_PER_BEAT).unwrap(),
        )
        .unwrap();
        if stress {
            source.set_idle_generator(Some(random_pattern(i as u64, 0.2)));
        }
        connect_port!(source, tx => switch, rx, i).unwrap();
    }

    let sinks = (0..config.outputs.len())
        .map(|i| {
            let sink = Sink::new_and_register(engine, engine.top(), &format!("sink{i}")).unwrap();
            if stress {
                sink.set_backpressure_generator(Some(random_pattern(100 + i as u64, 0.3)));
            }
            connect_port!(switch, tx, i => sink, rx).unwrap();
            sink
        })
        .collect();
    (switch, sinks)
}

/// Frames received from one source, identified by the id of the frame.
fn frames_from(sink: &Sink<Transaction>, source: u64) -> Vec<Frame> {
    let transactions: Vec<Transaction> = sink
        .sunk()
        .into_iter()
        .filter(|t| t.id() == source)
        .collect();
    frames_from_stream(&transactions).unwrap()
}

#[test]
fn two_by_two_keeps_frames_whole() {
    let engine = start_test(file!());

    let all_frames: Vec<Vec<Frame>> = (0..2)
        .map(|s| {
            (0..20)
                .map(|i| {
                    Frame::new(incrementing_payload(64))
                        .with_id(s)
                        .with_dest((i + s) % 2)
                })
                .collect()
        })
        .collect();
    let config = SwitchConfig::default();
    let (switch, sinks) = build_switch(&engine, &config, &all_frames, true);

    run_simulation!(engine);

    for (dest, sink) in sinks.iter().enumerate() {
        check_frames_atomic(&sink.sunk());
        for (s, frames) in all_frames.iter().enumerate() {
            assert_eq!(
                frames_from(sink, s as u64),
                frames_for_dest(frames, dest as u64)
            );
        }
    }
    assert_eq!(switch.num_unroutable_frames(), 0);
    assert_eq!(switch.routes(), vec![Route::Idle; 2]);
}

#[test]
fn priority_policy_delivers_everything() {
    let engine = start_test(file!());

    // Every frame from both inputs goes to output 0
    let all_frames: Vec<Vec<Frame>> = (0..2)
        .map(|s| {
            (0..10)
                .map(|i| Frame::new(incrementing_payload(8 + i)).with_id(s))
                .collect()
        })
        .collect();
    let config = SwitchConfig {
        arbiter: ArbiterPolicy::Priority(Priority::new(LsbPriority::High)),
        ..SwitchConfig::default()
    };
    let (_, sinks) = build_switch(&engine, &config, &all_frames, false);

    run_simulation!(engine);

    check_frames_atomic(&sinks[0].sunk());
    for (s, frames) in all_frames.iter().enumerate() {
        assert_eq!(&frames_from(&sinks[0], s as u64), frames);
    }
    assert_eq!(sinks[1].num_sunk(), 0);
}

#[test]
fn unroutable_frames_dropped() {
    let (tracker, lines) = in_memory_tracker(log::Level::Warn);
    let engine = Engine::new(&tracker);

    let config = SwitchConfig {
        num_inputs: 2,
        outputs: vec![
            SwitchOutputConfig::new(0x00, 0x0f).with_connect(vec![0]),
            SwitchOutputConfig::new(0x10, 0x1f),
        ],
        arbiter: ArbiterPolicy::default(),
    };
    let all_frames = vec![
        vec![
            Frame::new(incrementing_payload(24)).with_id(0).with_dest(0x20),
            Frame::new(incrementing_payload(24)).with_id(0).with_dest(0x05),
            Frame::new(incrementing_payload(24)).with_id(0).with_dest(0x15),
        ],
        vec![
            // Input 1 may not reach output 0
            Frame::new(incrementing_payload(24)).with_id(1).with_dest(0x05),
            Frame::new(incrementing_payload(24)).with_id(1).with_dest(0x15),
        ],
    ];
    let (switch, sinks) = build_switch(&engine, &config, &all_frames, false);

    run_simulation!(engine);

    assert_eq!(switch.num_unroutable_frames(), 2);
    assert_eq!(frames_from(&sinks[0], 0), vec![all_frames[0][1].clone()]);
    assert_eq!(frames_from(&sinks[0], 1), vec![]);
    assert_eq!(frames_from(&sinks[1], 0), vec![all_frames[0][2].clone()]);
    assert_eq!(frames_from(&sinks[1], 1), vec![all_frames[1][1].clone()]);

    let lines = lines.lock().unwrap();
    assert!(lines.contains(&"top::switch:WARN: rx0: no route for dest 0x20, dropping frame".to_string()));
    assert!(lines.contains(&"top::switch:WARN: rx1: no route for dest 0x5, dropping frame".to_string()));
}

#[test]
fn config_route() {
    let config = SwitchConfig {
        num_inputs: 3,
        outputs: vec![
            SwitchOutputConfig::new(0, 9),
            SwitchOutputConfig::new(10, 19).with_connect(vec![0, 2]),
        ],
        arbiter: ArbiterPolicy::default(),
    };
    assert_eq!(config.route(1, 4), Some(0));
    assert_eq!(config.route(0, 15), Some(1));
    assert_eq!(config.route(1, 15), None);
    assert_eq!(config.route(2, 20), None);
}

#[test]
fn invalid_configs_rejected() {
    let engine = start_test(file!());

    let check = |config: SwitchConfig, expected: &str| {
        let result = Switch::<Transaction>::new_and_register(&engine, engine.top(), "switch", &config);
        assert_eq!(result.err().unwrap().to_string(), expected);
    };

    check(
        SwitchConfig {
            num_inputs: 0,
            ..SwitchConfig::default()
        },
        "Error: top::switch: switch must have at least one input",
    );
    check(
        SwitchConfig {
            outputs: vec![],
            ..SwitchConfig::default()
        },
        "Error: top::switch: switch must have at least one output",
    );
    check(
        SwitchConfig {
            outputs: vec![SwitchOutputConfig::new(0x10, 0x0f)],
            ..SwitchConfig::default()
        },
        "Error: top::switch: output 0: base 0x10 above top 0xf",
    );
    check(
        SwitchConfig {
            outputs: vec![SwitchOutputConfig::new(0, 1).with_connect(vec![0, 2])],
            ..SwitchConfig::default()
        },
        "Error: top::switch: output 0: connected input 2 out of range (0..2)",
    );
    check(
        SwitchConfig {
            outputs: vec![
                SwitchOutputConfig::new(0, 7),
                SwitchOutputConfig::new(8, 9),
                SwitchOutputConfig::new(4, 5),
            ],
            ..SwitchConfig::default()
        },
        "Error: top::switch: output 0 and output 2 ranges overlap",
    );
}
