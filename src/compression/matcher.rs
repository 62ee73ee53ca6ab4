//! Window search for the packer
//!
//! Finds the leftmost longest earlier occurrence of the bytes at the
//! current position, looking back at most 255 bytes.

use crate::common::{MAX_DISTANCE, MAX_RUN_LENGTH, MIN_MATCH_LENGTH};

/// Result of a window search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    /// Length of the found match (0 if no match)
    pub length: usize,
    /// Backward distance to the match (0 if no match)
    pub distance: usize,
}

impl MatchResult {
    /// Create a new match result
    pub fn new(length: usize, distance: usize) -> Self {
        Self { length, distance }
    }

    /// Create a "no match" result
    pub fn no_match() -> Self {
        Self {
            length: 0,
            distance: 0,
        }
    }

    /// Whether the match is long enough to be cheaper than literals
    pub fn is_worthwhile(&self) -> bool {
        self.length > MIN_MATCH_LENGTH
    }
}

/// Find the longest match for `data[pos..]` starting in the window behind `pos`
///
/// Candidates are scanned from the far end of the window, and only a strictly
/// longer match replaces the current best, so ties go to the farthest start.
/// The match may run into `pos` itself; the decoder copies byte by byte.
pub fn find_longest_match(data: &[u8], pos: usize) -> MatchResult {
    let mut best = MatchResult::no_match();
    if pos >= data.len() {
        return best;
    }

    for start in pos.saturating_sub(MAX_DISTANCE)..pos {
        if data[start] != data[pos] {
            continue;
        }

        let mut length = 1;
        while length < MAX_RUN_LENGTH
            && pos + length < data.len()
            && data[start + length] == data[pos + length]
        {
            length += 1;
        }

        if length > best.length {
            best = MatchResult::new(length, pos - start);
            if length == MAX_RUN_LENGTH {
                break;
            }
        }
    }

    best
}
