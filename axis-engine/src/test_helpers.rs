// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use axis_track::tracker::{EntityManager, TextTracker};
use axis_track::{Tracker, Writer};

use crate::engine::Engine;

/// Create a tracker that writes all log messages of a test to its own file.
#[must_use]
pub fn create_tracker(full_filepath: &str) -> Tracker {
    // Place all log files in one folder
    const FOLDER: &str = "traces";

    // Create that folder if it doesn't exist yet
    fs::create_dir_all(FOLDER).unwrap();

    let filename_only = Path::new(full_filepath)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap();

    let writer: Writer = Box::new(BufWriter::new(
        fs::File::create(format!("{FOLDER}/{filename_only}.log")).unwrap(),
    ));

    let default_log_level = log::Level::Debug;
    let entity_manager = EntityManager::new(default_log_level);
    let tracker: Tracker = Arc::new(TextTracker::new(entity_manager, writer));
    tracker
}

#[must_use]
pub fn start_test(full_filepath: &str) -> Engine {
    Engine::new(&create_tracker(full_filepath))
}
