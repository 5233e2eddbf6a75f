//! Logical record ranges and their grid coordinates
//!
//! Positions are 1-indexed ordinals into the search result set. The grid shows
//! [`PAGE_SIZE`] rows per page, so every position maps to a 1-indexed page and a
//! 0-indexed row on that page.

use crate::SugerError;
use std::fmt;

/// Rows per grid page, fixed by the remote interface
pub const PAGE_SIZE: u32 = 20;

/// Grid page holding logical position `pos`
///
/// Positions start at 1; position 0 is treated as position 1.
pub fn page_of(pos: u32) -> u32 {
    pos.saturating_sub(1) / PAGE_SIZE + 1
}

/// Row within its grid page of logical position `pos`
///
/// Positions start at 1; position 0 is treated as position 1.
pub fn row_of(pos: u32) -> u32 {
    pos.saturating_sub(1) % PAGE_SIZE
}

/// A half-open span `[start, stop)` of logical positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    start: u32,
    stop: u32,
}

impl Range {
    /// Creates the range `[start, start + count)`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless both `start` and `count` are greater than zero
    /// and the end position is representable.
    pub fn new(start: u32, count: u32) -> Result<Self, SugerError> {
        if start == 0 || count == 0 {
            return Err(SugerError::InvalidArgument(format!(
                "start ({}) and count ({}) must be greater than zero",
                start, count
            )));
        }

        let stop = start.checked_add(count).ok_or_else(|| {
            SugerError::InvalidArgument(format!(
                "range starting at {} with count {} overflows",
                start, count
            ))
        })?;

        Ok(Self { start, stop })
    }

    /// First position not yet fetched
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Exclusive upper bound
    pub fn stop(&self) -> u32 {
        self.stop
    }

    /// Number of positions left
    pub fn len(&self) -> u32 {
        self.stop.saturating_sub(self.start)
    }

    /// Returns the range without its first position
    ///
    /// An exhausted range stays exhausted.
    #[must_use]
    pub fn advance(self) -> Self {
        Self {
            start: self.start.saturating_add(1),
            stop: self.stop,
        }
    }

    /// Returns true when every position has been fetched
    pub fn is_exhausted(&self) -> bool {
        self.start >= self.stop
    }

    /// Splits the range into `n` contiguous, near-equal pieces
    ///
    /// Each piece holds `len / n` positions except the last, which also absorbs
    /// the remainder so the pieces cover the range exactly.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `n` is zero or larger than the range.
    pub fn partition(&self, n: u32) -> Result<Vec<Range>, SugerError> {
        let count = self.len();
        if n == 0 || n > count {
            return Err(SugerError::InvalidArgument(format!(
                "cannot split {} positions into {} partitions",
                count, n
            )));
        }

        let quotient = count / n;
        let mut parts: Vec<Range> = (0..n)
            .map(|i| {
                let start = self.start + quotient * i;
                Range {
                    start,
                    stop: start + quotient,
                }
            })
            .collect();

        if let Some(last) = parts.last_mut() {
            last.stop = self.stop;
        }

        Ok(parts)
    }

    /// Grid page of the first unfetched position
    pub fn page(&self) -> u32 {
        page_of(self.start)
    }

    /// Grid row of the first unfetched position
    pub fn row(&self) -> u32 {
        row_of(self.start)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.stop)
    }
}
