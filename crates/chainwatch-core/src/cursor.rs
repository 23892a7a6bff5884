//! Exporter cursor: tracks the next block a deployment has not processed yet.

/// Maximum number of blocks covered by one `eth_getLogs` page.
pub const MAX_BLOCK_RANGE: u64 = 1000;

/// An inclusive block range `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    /// Number of blocks in the range.
    pub fn len(&self) -> u64 {
        self.to - self.from + 1
    }

    /// Always `false`: a range holds at least one block.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl std::fmt::Display for BlockRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.from, self.to)
    }
}

/// The exporter's position in the chain.
///
/// Holds the next block to process. It only moves forward, and only after a
/// range has been fully processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    next_block: u64,
    max_range: u64,
}

impl Cursor {
    /// Create a cursor that starts at `next_block` with the default page size.
    pub fn new(next_block: u64) -> Self {
        Self::with_max_range(next_block, MAX_BLOCK_RANGE)
    }

    /// Create a cursor with a custom page size (clamped to at least one block).
    pub fn with_max_range(next_block: u64, max_range: u64) -> Self {
        Self {
            next_block,
            max_range: max_range.max(1),
        }
    }

    /// The next block to process.
    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// The next range to process given the chain head, or `None` when the head
    /// has not moved past the cursor.
    pub fn next_range(&self, head: u64) -> Option<BlockRange> {
        if head <= self.next_block {
            return None;
        }
        let page_end = self.next_block.saturating_add(self.max_range - 1);
        Some(BlockRange {
            from: self.next_block,
            to: head.min(page_end),
        })
    }

    /// Mark `range` as processed. Ranges behind the cursor are ignored, so the
    /// cursor never moves backwards.
    pub fn advance_past(&mut self, range: BlockRange) {
        let next = range.to.saturating_add(1);
        if next > self.next_block {
            self.next_block = next;
        }
    }
}
