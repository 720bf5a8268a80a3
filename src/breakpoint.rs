use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alignment_segment::get_strand_char;
use crate::chrom_list::ChromList;

/// A single breakend, one side of a breakpoint
///
/// By convention the position is the reference coordinate at the junction: for the left side of
/// a breakpoint this is the position where the read leaves its alignment segment, for the right
/// side it is the position where the read enters the next segment. Positions use the half-open
/// zero-indexed convention, so a read leaving a forward-strand segment [1000,1100) leaves at 1100,
/// and a read entering a reverse-strand segment [400,500) enters at 500.
///
#[derive(Clone, Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub struct Breakend {
    pub chrom_index: usize,
    pub pos: i64,

    /// Strand of the alignment segment on this side of the junction
    pub is_fwd_strand: bool,
}

impl Breakend {
    /// Key used to standardize breakpoints, the forward strand sorts first
    fn order_key(&self) -> (usize, i64, bool) {
        (self.chrom_index, self.pos, !self.is_fwd_strand)
    }

    /// The same breakend as seen from a read traversing the junction in the opposite direction
    pub fn flip(&self) -> Self {
        Self {
            chrom_index: self.chrom_index,
            pos: self.pos,
            is_fwd_strand: !self.is_fwd_strand,
        }
    }

    pub fn to_locus_str(&self, chrom_list: &ChromList) -> String {
        format!(
            "{}:{}{}",
            chrom_list.label(self.chrom_index),
            self.pos,
            get_strand_char(self.is_fwd_strand)
        )
    }
}

impl fmt::Debug for Breakend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Breakend: {}:{} strand: {}",
            self.chrom_index,
            self.pos,
            get_strand_char(self.is_fwd_strand)
        )
    }
}

/// Classification of a rearranged junction between two alignment segments
///
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    PartialEq,
    PartialOrd,
    Ord,
    Serialize,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
pub enum BreakpointType {
    /// The two sides are on different reference sequences
    InterChromosomal,

    /// The read switches reference strand, as in an inversion
    StrandSwitch,

    /// Forward jump too large to be a simple deletion
    LargeGap,

    /// Backward jump too large to be an alignment boundary overlap, as in a tandem duplication
    ReverseJump,
}

/// Breakpoints can only be compared within the same partition
///
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub struct BreakpointPartition {
    pub left_chrom_index: usize,
    pub left_is_fwd_strand: bool,
    pub right_chrom_index: usize,
    pub right_is_fwd_strand: bool,
}

/// A junction between two alignment segments which are adjacent in a read
///
#[derive(Clone, Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize)]
pub struct Breakpoint {
    pub left: Breakend,
    pub right: Breakend,
}

impl Breakpoint {
    /// Create a standardized breakpoint
    pub fn new(left: Breakend, right: Breakend) -> Self {
        let mut bp = Self { left, right };
        bp.standardize();
        bp
    }

    /// The same junction as observed from a read spanning it in the opposite direction
    ///
    fn flip(&self) -> Self {
        Self {
            left: self.right.flip(),
            right: self.left.flip(),
        }
    }

    fn order_key(&self) -> ((usize, i64, bool), (usize, i64, bool)) {
        (self.left.order_key(), self.right.order_key())
    }

    /// Test for standardized breakpoint representation
    ///
    /// A junction can be observed from reads running across it in either direction, these
    /// observations have the two sides swapped and both strands inverted. The standardized form is
    /// whichever of these two representations has the lower order key.
    ///
    pub fn is_standardized(&self) -> bool {
        self.order_key() <= self.flip().order_key()
    }

    pub fn standardize(&mut self) {
        if !self.is_standardized() {
            *self = self.flip();
        }
    }

    /// Reference distance the read jumps over at this junction, measured in the direction of read
    /// traversal
    ///
    /// Positive values are forward gaps, zero is a contiguous traversal and negative values are
    /// backward jumps.
    ///
    /// Returns None if the two sides are on different chromosomes or strands.
    ///
    pub fn get_ref_jump(&self) -> Option<i64> {
        if self.left.chrom_index != self.right.chrom_index
            || self.left.is_fwd_strand != self.right.is_fwd_strand
        {
            None
        } else if self.left.is_fwd_strand {
            Some(self.right.pos - self.left.pos)
        } else {
            Some(self.left.pos - self.right.pos)
        }
    }

    pub fn get_type(&self) -> BreakpointType {
        if self.left.chrom_index != self.right.chrom_index {
            BreakpointType::InterChromosomal
        } else if self.left.is_fwd_strand != self.right.is_fwd_strand {
            BreakpointType::StrandSwitch
        } else if self.get_ref_jump().unwrap_or(0) > 0 {
            BreakpointType::LargeGap
        } else {
            BreakpointType::ReverseJump
        }
    }

    pub fn get_partition(&self) -> BreakpointPartition {
        BreakpointPartition {
            left_chrom_index: self.left.chrom_index,
            left_is_fwd_strand: self.left.is_fwd_strand,
            right_chrom_index: self.right.chrom_index,
            right_is_fwd_strand: self.right.is_fwd_strand,
        }
    }

    /// Update chromosome indices to a new ChromList, then restore standardized form
    ///
    /// Returns true if the breakpoint was flipped to restore standardized form.
    ///
    pub fn remap_chrom_index(&mut self, index_map: &[usize]) -> bool {
        self.left.chrom_index = index_map[self.left.chrom_index];
        self.right.chrom_index = index_map[self.right.chrom_index];
        let is_flipped = !self.is_standardized();
        self.standardize();
        is_flipped
    }
}

impl fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Breakpoint: left: {:?} right: {:?}", self.left, self.right)
    }
}

/// A single breakpoint observation from one read
///
#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct BreakpointObservation {
    pub read_id: String,
    pub breakpoint: Breakpoint,
}

#[cfg(test)]
pub fn get_test_breakpoint(
    left_chrom_index: usize,
    left_pos: i64,
    left_is_fwd_strand: bool,
    right_chrom_index: usize,
    right_pos: i64,
    right_is_fwd_strand: bool,
) -> Breakpoint {
    Breakpoint::new(
        Breakend {
            chrom_index: left_chrom_index,
            pos: left_pos,
            is_fwd_strand: left_is_fwd_strand,
        },
        Breakend {
            chrom_index: right_chrom_index,
            pos: right_pos,
            is_fwd_strand: right_is_fwd_strand,
        },
    )
}
