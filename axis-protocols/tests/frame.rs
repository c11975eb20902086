// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use axis_protocols::frame::{Frame, frames_from_stream};
use axis_track::entity::toplevel;
use axis_track::tracker::in_memory_tracker;

#[test]
fn stream_of_frames_survives_width_changes() {
    let (tracker, _lines) = in_memory_tracker(log::Level::Warn);
    let top = toplevel(&tracker, "top");

    let frames: Vec<Frame> = (0..5)
        .map(|i| {
            Frame::new((0..(i * 7 + 1) as u8).collect())
                .with_id(i)
                .with_dest(i % 2)
        })
        .collect();

    for bytes_per_beat in [1, 3, 8, 64] {
        let stream: Vec<_> = frames
            .iter()
            .flat_map(|f| f.to_transactions(&top, bytes_per_beat).unwrap())
            .collect();
        assert_eq!(frames_from_stream(&stream).unwrap(), frames);
    }
}

#[test]
fn incomplete_stream_is_reported() {
    let (tracker, _lines) = in_memory_tracker(log::Level::Warn);
    let top = toplevel(&tracker, "top");

    let mut stream = Frame::new(vec![1, 2, 3, 4]).to_transactions(&top, 2).unwrap();
    stream.pop();
    let err = frames_from_stream(&stream).unwrap_err();
    assert_eq!(
        format!("{err}"),
        "Error: 1 transactions left after the last complete frame"
    );
}
