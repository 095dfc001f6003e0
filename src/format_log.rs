//! The per-document format log.
//!
//! Every placeholder id maps to the literal native markup it stands for, or, for
//! placeholders produced by collapsing, to the placeholder sequence it replaced
//! (marked `recursive`). The log is append-only; entries not yet written to the
//! format stream are handed out by [`FormatLog::take_pending`].

use crate::ids::TagId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    pub id: TagId,
    pub markup: String,
    /// The markup contains further placeholders that expand through this log.
    pub recursive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FormatLog {
    entries: Vec<FormatEntry>,
    written: usize,
}

impl FormatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records native markup for a placeholder id.
    pub fn record(&mut self, id: TagId, markup: impl Into<String>) {
        self.push(id, markup.into(), false);
    }

    /// Records a placeholder sequence that itself expands through the log.
    pub fn record_recursive(&mut self, id: TagId, markup: impl Into<String>) {
        self.push(id, markup.into(), true);
    }

    fn push(&mut self, id: TagId, markup: String, recursive: bool) {
        log::trace!("format log {} (recursive: {}): {}", id, recursive, markup);
        self.entries.push(FormatEntry {
            id,
            markup,
            recursive,
        });
    }

    pub fn get(&self, id: TagId) -> Option<&FormatEntry> {
        self.entries.iter().rev().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries appended since the previous call.
    pub fn take_pending(&mut self) -> &[FormatEntry] {
        let start = self.written;
        self.written = self.entries.len();
        &self.entries[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_entries_are_handed_out_once() {
        let mut log = FormatLog::new();
        log.record(1, "<b>");
        log.record_recursive(2, "<x id='1'/>");
        assert_eq!(log.take_pending().len(), 2);
        assert!(log.take_pending().is_empty());

        log.record(3, "</b>");
        let pending = log.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, 3);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_get_finds_entry() {
        let mut log = FormatLog::new();
        log.record(7, "<img src=\"a.png\"/>");
        assert_eq!(log.get(7).unwrap().markup, "<img src=\"a.png\"/>");
        assert!(!log.get(7).unwrap().recursive);
        assert!(log.get(8).is_none());
    }
}
