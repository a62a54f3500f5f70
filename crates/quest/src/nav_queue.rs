//! Path of visited questions plus the current position.
//!
//! Invariants:
//! - `cursor` is `None` iff `path` is empty, otherwise `cursor < path.len()`.
//! - `previous`/`next` only move the cursor; entries are removed only by
//!   `truncate_forward` and `clear`.

use crate::error::NavError;
use core_types::QuestionId;
use serde::{Deserialize, Serialize};

/// Persisted form of a [`NavigationQueue`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub path: Vec<QuestionId>,
    pub cursor: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationQueue {
    path: Vec<QuestionId>,
    cursor: Option<usize>,
}

impl NavigationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` as the new tail and move the cursor onto it.
    /// Duplicates are allowed; this is a path, not a set.
    pub fn add(&mut self, id: impl Into<QuestionId>) {
        self.path.push(id.into());
        self.cursor = Some(self.path.len() - 1);
    }

    /// Advance onto the existing successor. No-op at the tail.
    pub fn next(&mut self) -> Option<&QuestionId> {
        if let Some(i) = self.cursor
            && i + 1 < self.path.len()
        {
            self.cursor = Some(i + 1);
        }
        self.current_node()
    }

    /// Step back one entry. No-op at the head; never removes entries.
    pub fn previous(&mut self) -> Option<&QuestionId> {
        if let Some(i) = self.cursor
            && i > 0
        {
            self.cursor = Some(i - 1);
        }
        self.current_node()
    }

    pub fn current_node(&self) -> Option<&QuestionId> {
        self.cursor.and_then(|i| self.path.get(i))
    }

    /// The entry `next` would move onto, if any.
    pub fn peek_next(&self) -> Option<&QuestionId> {
        self.cursor.and_then(|i| self.path.get(i + 1))
    }

    /// Drop every entry after the cursor.
    pub fn truncate_forward(&mut self) {
        if let Some(i) = self.cursor {
            self.path.truncate(i + 1);
        }
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.cursor = None;
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn path(&self) -> &[QuestionId] {
        &self.path
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            path: self.path.clone(),
            cursor: self.cursor,
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "path": self.path,
            "cursor": self.cursor,
        })
    }

    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }

    /// Replace the whole queue from a snapshot. On error the queue is unchanged.
    pub fn load_snapshot(&mut self, snapshot: QueueSnapshot) -> Result<(), NavError> {
        let len = snapshot.path.len();
        match snapshot.cursor {
            Some(cursor) if cursor >= len => return Err(NavError::CursorOutOfRange { cursor, len }),
            None if len > 0 => return Err(NavError::MissingCursor),
            _ => {}
        }
        self.path = snapshot.path;
        self.cursor = snapshot.cursor;
        Ok(())
    }

    pub fn load_from_json(&mut self, serialized: &str) -> Result<(), NavError> {
        let snapshot: QueueSnapshot = serde_json::from_str(serialized)?;
        self.load_snapshot(snapshot)
    }

    /// Same as [`load_from_json`](Self::load_from_json) for an already parsed value.
    pub fn load_from_value(&mut self, value: serde_json::Value) -> Result<(), NavError> {
        let snapshot: QueueSnapshot = serde_json::from_value(value)?;
        self.load_snapshot(snapshot)
    }
}
