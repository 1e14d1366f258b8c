use std::collections::HashSet;

use termwatch_common::FlaggedItem;

/// Append-only set of flagged items keyed by permalink url.
/// First writer wins; later duplicates are silently dropped.
///
/// Owned exclusively by the polling scheduler and touched only between
/// cycles, so no locking is needed.
#[derive(Debug, Default)]
pub struct DedupAccumulator {
    items: Vec<FlaggedItem>,
    seen: HashSet<String>,
}

impl DedupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `candidate` iff no accumulated item shares its url.
    /// Returns whether it was admitted.
    pub fn admit(&mut self, candidate: FlaggedItem) -> bool {
        if self.seen.contains(&candidate.url) {
            return false;
        }
        self.seen.insert(candidate.url.clone());
        self.items.push(candidate);
        true
    }

    /// Accumulated items in admission order.
    pub fn items(&self) -> &[FlaggedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
