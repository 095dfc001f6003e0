//! Identifier allocation for placeholder tags.
//!
//! Tag ids and reference ids (rids) are two independent counters, both unique
//! within one document. Rids of spanning tags are kept on a stack: pushed when the
//! native tag opens, popped when it closes, so the `ex` always pairs with the most
//! recent unclosed `bx` even when the native markup is not well nested.

use crate::error::Error;

/// Unique id of a `bx`, `ex` or `x` placeholder.
pub type TagId = u32;

/// Reference id shared by a `bx` and its matching `ex`.
pub type Rid = u32;

#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last_tag_id: TagId,
    last_rid: Rid,
    open_rids: Vec<Rid>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for the next placeholder tag.
    pub fn next_tag_id(&mut self) -> TagId {
        self.last_tag_id += 1;
        self.last_tag_id
    }

    /// Returns a fresh rid without touching the open-rid stack.
    pub fn next_rid(&mut self) -> Rid {
        self.last_rid += 1;
        self.last_rid
    }

    /// Allocates a rid for a spanning tag that just opened.
    pub fn open_rid(&mut self) -> Rid {
        let rid = self.next_rid();
        self.open_rids.push(rid);
        rid
    }

    /// Pops the rid of the innermost open spanning tag.
    pub fn close_rid(&mut self) -> Result<Rid, Error> {
        self.open_rids.pop().ok_or(Error::RidUnderflow)
    }

    /// Makes sure ids and rids already in use are never issued again.
    pub fn observe(&mut self, tag_id: Option<TagId>, rid: Option<Rid>) {
        if let Some(id) = tag_id {
            self.last_tag_id = self.last_tag_id.max(id);
        }
        if let Some(rid) = rid {
            self.last_rid = self.last_rid.max(rid);
        }
    }

    /// Number of spanning tags currently open.
    pub fn open_depth(&self) -> usize {
        self.open_rids.len()
    }

    /// Rids still open, outermost first.
    pub fn open_rids(&self) -> &[Rid] {
        &self.open_rids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_tag_id(), 1);
        assert_eq!(ids.next_tag_id(), 2);
        assert_eq!(ids.next_tag_id(), 3);
    }

    #[test]
    fn test_rids_pair_in_stack_order() {
        let mut ids = IdAllocator::new();
        let outer = ids.open_rid();
        let inner = ids.open_rid();
        assert_eq!(ids.open_depth(), 2);
        assert_eq!(ids.close_rid().unwrap(), inner);
        assert_eq!(ids.close_rid().unwrap(), outer);
        assert_eq!(ids.open_depth(), 0);
    }

    #[test]
    fn test_free_rids_share_the_counter() {
        let mut ids = IdAllocator::new();
        let open = ids.open_rid();
        let free = ids.next_rid();
        assert!(free > open);
        assert_eq!(ids.open_rids(), &[open]);
    }

    #[test]
    fn test_observed_ids_are_skipped() {
        let mut ids = IdAllocator::new();
        ids.observe(Some(7), Some(11));
        ids.observe(Some(3), None);
        assert_eq!(ids.next_tag_id(), 8);
        assert_eq!(ids.next_rid(), 12);
    }

    #[test]
    fn test_close_on_empty_stack_underflows() {
        let mut ids = IdAllocator::new();
        assert!(matches!(ids.close_rid(), Err(Error::RidUnderflow)));
    }
}
