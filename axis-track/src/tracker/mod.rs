// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Define the [`Track`] trait a number of [`Tracker`]s.

/// Include the /dev/null tracker.
pub mod dev_null;
/// Include the in-memory tracker.
pub mod in_memory;
/// Include the text-based tracker.
pub mod text;

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub use dev_null::DevNullTracker;
pub use in_memory::InMemoryTracker;
use regex::Regex;
pub use text::TextTracker;

use crate::{ROOT, Tag};

/// This is the interface that is supported by all [`Tracker`]s.
pub trait Track {
    /// Allocate a new global tag
    fn unique_tag(&self) -> Tag;

    /// Determine whether an entity has events of the given level enabled.
    fn is_entity_enabled(&self, tag: Tag, level: log::Level) -> bool;

    /// Register an entity so that its enables can be determined.
    fn add_entity(&self, tag: Tag, entity_name: &str);

    /// Track when an object with the given tag arrives.
    fn enter(&self, tag: Tag, object: Tag);

    /// Track when an object with the given tag leaves.
    fn exit(&self, tag: Tag, object: Tag);

    /// Track a log message of the given level.
    fn log(&self, tag: Tag, level: log::Level, msg: std::fmt::Arguments);

    /// Flush any buffered output.
    fn shutdown(&self);
}

/// The type of a [`Tracker`] that is shared across entities.
pub type Tracker = Arc<dyn Track + Send + Sync>;

/// Create a [`Tracker`] that prints all events at `level` or above to
/// `stdout`.
pub fn stdout_tracker(level: log::Level) -> Tracker {
    let entity_manager = EntityManager::new(level);
    let stdout_writer = Box::new(std::io::BufWriter::new(io::stdout()));
    let tracker: Tracker = Arc::new(TextTracker::new(entity_manager, stdout_writer));
    tracker
}

/// Create a `stdout` [`Tracker`] where only entities matching `filter_regex`
/// log at `level`. Others log at `Error`.
///
/// An empty `filter_regex` enables `level` for all entities.
pub fn filtered_stdout_tracker(level: log::Level, filter_regex: &str) -> Tracker {
    let entity_manager = if filter_regex.is_empty() {
        EntityManager::new(level)
    } else {
        let mut entity_manager = EntityManager::new(log::Level::Error);
        entity_manager.add_log_filter(filter_regex, level);
        entity_manager
    };
    let stdout_writer = Box::new(std::io::BufWriter::new(io::stdout()));
    Arc::new(TextTracker::new(entity_manager, stdout_writer))
}

/// Create a [`Tracker`] that suppresses all track events.
pub fn dev_null_tracker() -> Tracker {
    let tracker: Tracker = Arc::new(DevNullTracker {});
    tracker
}

/// Create a [`Tracker`] that keeps all emitted lines in memory.
///
/// The returned vector is shared with the tracker so that tests can inspect
/// what has been logged.
pub fn in_memory_tracker(level: log::Level) -> (Tracker, Arc<Mutex<Vec<String>>>) {
    let tracker = InMemoryTracker::new(EntityManager::new(level));
    let lines = tracker.lines();
    let tracker: Tracker = Arc::new(tracker);
    (tracker, lines)
}

/// The [`EntityManager`] is responsible for determining entity log levels.
///
/// This is shared by the [`Text`](crate::tracker::text) and
/// [`InMemory`](crate::tracker::in_memory) trackers.
///
/// This manager is also used to allocate unique [`Tag`] values.
pub struct EntityManager {
    /// Level of _log_ events to output.
    default_log_level: log::Level,

    /// List of regular expressions mapping entity names to log levels.
    regex_to_log_level: Vec<(Regex, log::Level)>,

    /// Level determined for each entity when it was added.
    entity_levels: Mutex<HashMap<Tag, log::Level>>,

    /// Used to assign unique tags.
    unique_tag: AtomicU64,
}

impl EntityManager {
    /// Constructor with a default [`log::Level`]
    #[must_use]
    pub fn new(default_log_level: log::Level) -> Self {
        Self {
            default_log_level,
            regex_to_log_level: Vec::new(),
            entity_levels: Mutex::new(HashMap::new()),
            unique_tag: AtomicU64::new(ROOT.0 + 1),
        }
    }

    fn unique_tag(&self) -> Tag {
        let tag = self.unique_tag.fetch_add(1, Ordering::SeqCst);
        Tag(tag)
    }

    fn log_level_for(&self, entity_name: &str) -> log::Level {
        for (regex, level) in self.regex_to_log_level.iter() {
            if regex.is_match(entity_name) {
                return *level;
            }
        }
        self.default_log_level
    }

    /// Add a log filter regular expression.
    ///
    /// The first filter added that matches an entity name wins.
    ///
    /// # Example
    ///
    /// ```rust
    /// use axis_track::tracker::EntityManager;
    /// let mut manager = EntityManager::new(log::Level::Warn);
    /// manager.add_log_filter(".*arb.*", log::Level::Trace);
    /// ```
    pub fn add_log_filter(&mut self, regex_str: &str, level: log::Level) {
        match Regex::new(regex_str) {
            Ok(regex) => self.regex_to_log_level.push((regex, level)),
            Err(e) => panic!("Failed to parse regex {regex_str}:\n{e}\n"),
        };
    }

    fn add_entity(&self, tag: Tag, entity_name: &str) {
        let level = self.log_level_for(entity_name);
        if let Ok(mut levels) = self.entity_levels.lock() {
            levels.insert(tag, level);
        }
    }

    fn is_enabled(&self, tag: Tag, level: log::Level) -> bool {
        let entity_level = match self.entity_levels.lock() {
            Ok(levels) => levels.get(&tag).copied().unwrap_or(self.default_log_level),
            Err(_) => self.default_log_level,
        };
        level <= entity_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_paths() -> Vec<&'static str> {
        vec!["top", "top::sw", "top::sw::arb0", "top::sw::arb1"]
    }

    #[test]
    fn no_filters() {
        let manager = EntityManager::new(log::Level::Error);

        for p in entity_paths() {
            assert_eq!(manager.log_level_for(p), log::Level::Error);
        }
    }

    #[test]
    fn filter_log_first_match_wins() {
        let mut manager = EntityManager::new(log::Level::Error);
        manager.add_log_filter(r".*arb0", log::Level::Info);
        manager.add_log_filter(r".*sw.*", log::Level::Trace);
        manager.add_log_filter(r"top.*", log::Level::Warn);

        let expected_levels = [
            log::Level::Warn,
            log::Level::Trace,
            log::Level::Info,
            log::Level::Trace,
        ];

        for (i, p) in entity_paths().iter().enumerate() {
            assert_eq!(manager.log_level_for(p), expected_levels[i]);
        }
    }

    #[test]
    fn enables_follow_entity_level() {
        let mut manager = EntityManager::new(log::Level::Warn);
        manager.add_log_filter(r".*arb.*", log::Level::Debug);
        manager.add_entity(Tag(10), "top::sw::arb0");
        manager.add_entity(Tag(11), "top::sw");

        assert!(manager.is_enabled(Tag(10), log::Level::Debug));
        assert!(!manager.is_enabled(Tag(10), log::Level::Trace));
        assert!(manager.is_enabled(Tag(11), log::Level::Warn));
        assert!(!manager.is_enabled(Tag(11), log::Level::Info));
    }

    #[test]
    fn tags() {
        let manager = EntityManager::new(log::Level::Error);
        for i in 0..10 {
            assert_eq!(manager.unique_tag(), Tag(i + ROOT.0 + 1));
        }
    }
}
