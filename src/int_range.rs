use std::fmt;

use serde::{Deserialize, Serialize};

/// A simple type for integer ranges
///
/// All ranges follow the bed file range convention: 0-indexed, half-closed, [start,end)
///
/// This is used for both read and reference intervals of an alignment segment.
///
#[derive(Clone, Default, Deserialize, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
}

impl IntRange {
    pub fn from_int(start: i64) -> Self {
        Self {
            start,
            end: start + 1,
        }
    }

    pub fn from_pair(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// False for empty or inverted ranges
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// Expand this range to cover other
    pub fn merge(&mut self, other: &IntRange) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }

    /// Translate a range to its reversed version, given a certain region size
    ///
    /// This converts coordinates given on the reverse strand of a sequence into forward strand
    /// coordinates, and vice versa.
    ///
    /// # Example
    ///
    /// reverse_range([1,3), 6) -> [3,5)
    ///
    /// Fwd:
    ///  [-)
    /// 012345
    ///
    /// Rev:
    ///    [-)
    /// 012345
    ///
    pub fn reverse(&mut self, size: i64) {
        let istart = self.start;
        self.start = size - self.end;
        self.end = size - istart;
    }
}

impl fmt::Debug for IntRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}-{})", self.start, self.end)
    }
}

/// Get the number of positions shared by 2 ranges, 0 if they do not intersect
///
pub fn get_int_range_overlap_size(ir1: &IntRange, ir2: &IntRange) -> usize {
    let start = std::cmp::max(ir1.start, ir2.start);
    let end = std::cmp::min(ir1.end, ir2.end);
    std::cmp::max(end - start, 0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_int_range_overlap_size() {
        let r1 = IntRange::from_pair(0, 100);
        let r2 = IntRange::from_pair(90, 200);
        let r3 = IntRange::from_pair(100, 200);
        let r4 = IntRange::from_pair(10, 20);

        assert_eq!(get_int_range_overlap_size(&r1, &r2), 10);
        assert_eq!(get_int_range_overlap_size(&r2, &r1), 10);
        assert_eq!(get_int_range_overlap_size(&r1, &r3), 0);
        assert_eq!(get_int_range_overlap_size(&r1, &r4), 10);
    }

    #[test]
    fn test_reverse() {
        let mut r = IntRange::from_pair(1, 3);
        r.reverse(6);
        assert_eq!(r, IntRange::from_pair(3, 5));
    }
}
