// Copyright (c) 2024 Graphcore Ltd. All rights reserved.

use std::sync::{Arc, Mutex};

use crate::Tag;
use crate::tracker::{EntityManager, Track};

/// A tracker that keeps every emitted line in a shared vector.
///
/// Entity names are recorded so that lines read `name:level: message`
/// rather than using raw tags, which makes assertions in tests readable.
pub struct InMemoryTracker {
    entity_manager: EntityManager,
    names: Mutex<Vec<(Tag, String)>>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl InMemoryTracker {
    /// Create a new [`InMemoryTracker`] with an [`EntityManager`].
    pub fn new(entity_manager: EntityManager) -> Self {
        Self {
            entity_manager,
            names: Mutex::new(Vec::new()),
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a handle to the recorded lines.
    pub fn lines(&self) -> Arc<Mutex<Vec<String>>> {
        self.lines.clone()
    }

    fn name_of(&self, tag: Tag) -> String {
        match self.names.lock() {
            Ok(names) => names
                .iter()
                .find(|(t, _)| *t == tag)
                .map_or_else(|| tag.to_string(), |(_, name)| name.clone()),
            Err(_) => tag.to_string(),
        }
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl Track for InMemoryTracker {
    fn unique_tag(&self) -> Tag {
        self.entity_manager.unique_tag()
    }

    fn is_entity_enabled(&self, tag: Tag, level: log::Level) -> bool {
        self.entity_manager.is_enabled(tag, level)
    }

    fn add_entity(&self, tag: Tag, entity_name: &str) {
        self.entity_manager.add_entity(tag, entity_name);
        if let Ok(mut names) = self.names.lock() {
            names.push((tag, entity_name.to_string()));
        }
    }

    fn enter(&self, tag: Tag, object: Tag) {
        self.push(format!("{}: enter {object}", self.name_of(tag)));
    }

    fn exit(&self, tag: Tag, object: Tag) {
        self.push(format!("{}: exit {object}", self.name_of(tag)));
    }

    fn log(&self, tag: Tag, level: log::Level, msg: std::fmt::Arguments) {
        self.push(format!("{}:{level}: {msg}", self.name_of(tag)));
    }

    fn shutdown(&self) {}
}
