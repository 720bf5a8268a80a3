use std::fmt;

use simple_error::{SimpleResult, bail};

use crate::int_range::IntRange;

/// One local alignment between a read interval and a reference interval
///
/// Read coordinates are always given on the forward strand of the read, so that segments from
/// the same read can be ordered along the read regardless of their alignment strand.
///
#[derive(Clone, Eq, PartialEq)]
pub struct AlignmentSegment {
    pub read_id: String,

    /// Forward-strand read interval
    pub read_range: IntRange,

    /// True if the read aligns to the forward strand of the reference in this segment
    pub is_fwd_strand: bool,

    /// chrom_index is defined by the run's ChromList
    pub chrom_index: usize,

    /// Forward-strand reference interval
    pub ref_range: IntRange,

    pub score: i64,
}

impl AlignmentSegment {
    /// Check the coordinate invariants of the segment
    ///
    pub fn check(&self) -> SimpleResult<()> {
        if !self.read_range.is_valid() {
            bail!(
                "Alignment segment for read '{}' has invalid read interval {:?}",
                self.read_id,
                self.read_range
            );
        }
        if self.read_range.start < 0 {
            bail!(
                "Alignment segment for read '{}' has negative read start {}",
                self.read_id,
                self.read_range.start
            );
        }
        if !self.ref_range.is_valid() {
            bail!(
                "Alignment segment for read '{}' has invalid reference interval {:?}",
                self.read_id,
                self.ref_range
            );
        }
        if self.ref_range.start < 0 {
            bail!(
                "Alignment segment for read '{}' has negative reference start {}",
                self.read_id,
                self.ref_range.start
            );
        }
        Ok(())
    }

    pub fn strand_char(&self) -> char {
        get_strand_char(self.is_fwd_strand)
    }
}

impl fmt::Debug for AlignmentSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "AlignmentSegment: {} read: {:?} ref: {}:{:?} strand: {} score: {}",
            self.read_id,
            self.read_range,
            self.chrom_index,
            self.ref_range,
            self.strand_char(),
            self.score
        )
    }
}

pub fn get_strand_char(is_fwd_strand: bool) -> char {
    if is_fwd_strand { '+' } else { '-' }
}

#[cfg(test)]
#[allow(clippy::too_many_arguments)]
pub fn get_test_segment(
    read_id: &str,
    read_start: i64,
    read_end: i64,
    chrom_index: usize,
    is_fwd_strand: bool,
    ref_start: i64,
    ref_end: i64,
    score: i64,
) -> AlignmentSegment {
    AlignmentSegment {
        read_id: read_id.to_string(),
        read_range: IntRange::from_pair(read_start, read_end),
        is_fwd_strand,
        chrom_index,
        ref_range: IntRange::from_pair(ref_start, ref_end),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_check() {
        let seg = get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90);
        assert!(seg.check().is_ok());

        let seg = get_test_segment("r1", 100, 100, 0, true, 1000, 1100, 90);
        assert!(seg.check().is_err());

        let seg = get_test_segment("r1", 0, 100, 0, false, 1100, 1000, 90);
        assert!(seg.check().is_err());
    }
}
