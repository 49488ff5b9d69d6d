//! In-session pipeline history.
//!
//! The core's only obligation toward history is to make each executed
//! [`Pipeline`] and its string rendering available; persistence to disk is a
//! collaborator concern and lives elsewhere.

use crate::command::Pipeline;
use std::collections::VecDeque;

const DEFAULT_CAPACITY: usize = 1000;

/// Bounded list of rendered pipelines, oldest first.
pub struct PipelineHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl PipelineHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a pipeline. The oldest entry is dropped once the capacity is
    /// reached. Degenerate (empty) pipelines are not recorded.
    pub fn add(&mut self, pipeline: &Pipeline) {
        if pipeline.stages().iter().all(|stage| stage.is_empty()) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(pipeline.to_string());
    }

    /// Recorded renderings, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PipelineHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_pipeline;

    #[test]
    fn records_rendered_pipelines_in_order() {
        let mut history = PipelineHistory::new();
        history.add(&parse_pipeline("echo one"));
        history.add(&parse_pipeline("echo two | wc"));
        let entries: Vec<&str> = history.entries().collect();
        assert_eq!(entries, vec!["echo one", "echo two | wc"]);
    }

    #[test]
    fn skips_empty_input() {
        let mut history = PipelineHistory::new();
        history.add(&parse_pipeline("   "));
        assert!(history.is_empty());
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let mut history = PipelineHistory::with_capacity(2);
        history.add(&parse_pipeline("echo a"));
        history.add(&parse_pipeline("echo b"));
        history.add(&parse_pipeline("echo c"));
        let entries: Vec<&str> = history.entries().collect();
        assert_eq!(entries, vec!["echo b", "echo c"]);
    }
}
