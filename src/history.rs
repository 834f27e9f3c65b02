//! Conversation history
//!
//! Rendered lines in coordinator processing order. Unbounded unless a
//! limit is configured: every line is kept for the life of the process,
//! so a long-running server grows without bound.

use std::collections::VecDeque;

use crate::types::Line;

#[derive(Debug, Default)]
pub struct History {
    lines: VecDeque<Line>,
    limit: Option<usize>,
}

impl History {
    /// Create a history, optionally keeping only the newest `limit` lines
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            lines: VecDeque::new(),
            limit,
        }
    }

    /// Append a line, evicting the oldest when over the limit
    pub fn push(&mut self, line: Line) {
        if self.limit == Some(0) {
            return;
        }
        self.lines.push_back(line);
        if let Some(limit) = self.limit {
            while self.lines.len() > limit {
                self.lines.pop_front();
            }
        }
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<Line> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
