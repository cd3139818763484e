// src/processing/partition.rs
use std::ops::Range as IndexRange;

use serde::{Deserialize, Serialize};

/// Contiguous `[from, from + count)` slice of the index space handled by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub from: usize,
    pub count: usize,
}

impl Range {
    pub fn new(from: usize, count: usize) -> Self {
        Self { from, count }
    }

    /// One past the last index.
    pub fn end(&self) -> usize {
        self.from + self.count
    }

    pub fn indices(&self) -> IndexRange<usize> {
        self.from..self.end()
    }
}

/// Splits `total_count` items into ranges of `unit_size`.
///
/// A `unit_size` of zero means one range for everything. The last range holds
/// the remainder and is never empty. `total_count == 0` yields no ranges.
pub fn partition(total_count: usize, unit_size: usize) -> Vec<Range> {
    if total_count == 0 {
        return Vec::new();
    }

    let unit_size = if unit_size == 0 {
        total_count
    } else {
        unit_size.min(total_count)
    };

    let mut ranges = Vec::with_capacity(total_count.div_ceil(unit_size));
    let mut from = 0;
    while from < total_count {
        let count = unit_size.min(total_count - from);
        ranges.push(Range::new(from, count));
        from += count;
    }

    ranges
}
