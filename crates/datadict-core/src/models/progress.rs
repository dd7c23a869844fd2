//! Batch index progress counter

use serde::{Deserialize, Serialize};
use std::fmt;

/// Completed vs reachable explore count, rendered as `"{completed} / {total}"`
///
/// `total` starts at the worklist size and shrinks by one for every failed
/// explore, so a finished run always ends with `completed == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.completed += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.total = self.total.saturating_sub(1);
    }

    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Completion ratio in `[0.0, 1.0]`; an empty worklist counts as done
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.completed, self.total)
    }
}
