//! Per-document conversion state.
//!
//! Everything that must be unique or accumulated across the units of one document
//! lives here and is threaded by `&mut` through every pipeline stage. Separate
//! documents use separate contexts.

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    config::UnitIdStrategy,
    format_log::FormatLog,
    ids::{IdAllocator, Rid, TagId},
};

#[derive(Debug, Clone)]
pub struct UnitIdGenerator {
    strategy: UnitIdStrategy,
    issued: u64,
}

impl UnitIdGenerator {
    pub fn new(strategy: UnitIdStrategy) -> Self {
        Self {
            strategy,
            issued: 0,
        }
    }

    /// Returns a fresh translation-unit id.
    pub fn next_id(&mut self) -> String {
        self.issued += 1;
        match &self.strategy {
            UnitIdStrategy::Uuid => Uuid::new_v4().to_string(),
            UnitIdStrategy::Sequential { prefix } => format!("{}{}", prefix, self.issued),
        }
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

#[derive(Debug, Clone)]
pub struct ConversionContext {
    pub ids: IdAllocator,
    pub format_log: FormatLog,
    pub unit_ids: UnitIdGenerator,
    /// Open-tag ids of anchors that only name a location (no href).
    pub bookmarks: HashSet<TagId>,
    /// Open spans whose `bx` was emitted with an earlier unit.
    pub detached_rids: HashSet<Rid>,
    rid_underflow_reported: bool,
}

impl ConversionContext {
    pub fn new(unit_ids: UnitIdStrategy) -> Self {
        Self {
            ids: IdAllocator::new(),
            format_log: FormatLog::new(),
            unit_ids: UnitIdGenerator::new(unit_ids),
            bookmarks: HashSet::new(),
            detached_rids: HashSet::new(),
            rid_underflow_reported: false,
        }
    }

    /// Context with `tu1`, `tu2`, … unit ids.
    pub fn sequential() -> Self {
        Self::new(UnitIdStrategy::Sequential {
            prefix: "tu".to_string(),
        })
    }

    /// Returns true the first time it is called for this document.
    pub(crate) fn first_rid_underflow(&mut self) -> bool {
        !std::mem::replace(&mut self.rid_underflow_reported, true)
    }
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new(UnitIdStrategy::default())
    }
}
