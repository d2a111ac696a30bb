//! Bounded, deduplicated tab recency list.

use crate::types::settings::DEFAULT_HISTORY_LIMIT;
use crate::types::tab::TabId;

/// Ordered list of previously current tabs, most recently superseded first.
///
/// Never holds the same id twice and never grows past its limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabHistory {
    entries: Vec<TabId>,
    limit: usize,
}

impl TabHistory {
    /// Creates an empty history. A zero limit is raised to 1.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Builds a history from stored entries, keeping the first occurrence of
    /// each id and truncating to `limit`.
    pub fn from_entries<I: IntoIterator<Item = TabId>>(entries: I, limit: usize) -> Self {
        let mut history = Self::new(limit);
        for tab_id in entries {
            if history.entries.len() == history.limit {
                break;
            }
            if !history.entries.contains(&tab_id) {
                history.entries.push(tab_id);
            }
        }
        history
    }

    /// Moves `tab_id` to the front, dropping any earlier occurrence and
    /// whatever falls off the end.
    pub fn push_front(&mut self, tab_id: TabId) {
        self.entries.retain(|id| *id != tab_id);
        self.entries.insert(0, tab_id);
        self.entries.truncate(self.limit);
    }

    /// Removes `tab_id`. Returns whether it was present.
    pub fn remove(&mut self, tab_id: TabId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|id| *id != tab_id);
        self.entries.len() != before
    }

    /// First entry that is not `current`.
    pub fn last_used(&self, current: Option<TabId>) -> Option<TabId> {
        self.entries
            .iter()
            .copied()
            .find(|id| Some(*id) != current)
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.entries.contains(&tab_id)
    }

    pub fn entries(&self) -> &[TabId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for TabHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
