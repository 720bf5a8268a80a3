use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::breakpoint::{Breakend, Breakpoint, BreakpointPartition, BreakpointType};
use crate::cluster_breakpoints::BinnedPoint;
use crate::int_range::IntRange;

/// A cluster of breakpoint observations from one run with sufficient distinct read support
///
#[derive(Clone, Deserialize, Serialize)]
pub struct RearrangementGroup {
    /// Index of the group in the sorted group output of its source run
    pub group_index: usize,

    /// Representative breakpoint, each breakend position is the median of member positions
    pub breakpoint: Breakpoint,

    /// Range of member positions on each side
    pub left_range: IntRange,
    pub right_range: IntRange,

    /// Sorted distinct ids of the reads supporting this group
    pub read_ids: Vec<String>,

    /// Total breakpoint observations, a read may contribute more than one observation
    pub observation_count: usize,
}

impl RearrangementGroup {
    pub fn support(&self) -> usize {
        self.read_ids.len()
    }

    pub fn get_type(&self) -> BreakpointType {
        self.breakpoint.get_type()
    }

    /// Update chromosome indices to a new ChromList
    ///
    /// If this changes the standardized orientation of the breakpoint, the side ranges are swapped
    /// to follow their breakends.
    ///
    pub fn remap_chrom_index(&mut self, index_map: &[usize]) {
        if self.breakpoint.remap_chrom_index(index_map) {
            std::mem::swap(&mut self.left_range, &mut self.right_range);
        }
    }
}

impl std::fmt::Debug for RearrangementGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RearrangementGroup {}: {:?} left_range: {:?} right_range: {:?} support: {} observations: {}",
            self.group_index,
            self.breakpoint,
            self.left_range,
            self.right_range,
            self.support(),
            self.observation_count,
        )
    }
}

impl BinnedPoint for RearrangementGroup {
    type Partition = BreakpointPartition;

    fn partition(&self) -> Self::Partition {
        self.breakpoint.get_partition()
    }

    fn coords(&self) -> [i64; 2] {
        [self.breakpoint.left.pos, self.breakpoint.right.pos]
    }
}

/// Get the representative breakpoint for a set of members of one partition
///
pub fn get_representative_breakpoint(partition: &BreakpointPartition, coords: [i64; 2]) -> Breakpoint {
    Breakpoint {
        left: Breakend {
            chrom_index: partition.left_chrom_index,
            pos: coords[0],
            is_fwd_strand: partition.left_is_fwd_strand,
        },
        right: Breakend {
            chrom_index: partition.right_chrom_index,
            pos: coords[1],
            is_fwd_strand: partition.right_is_fwd_strand,
        },
    }
}

/// Sort groups by representative locus, then by descending support, and update each group_index
/// to match the new order
///
pub fn sort_rearrangement_groups(groups: &mut [RearrangementGroup]) {
    groups.sort_by(|a, b| {
        a.breakpoint
            .cmp(&b.breakpoint)
            .then_with(|| Reverse(a.support()).cmp(&Reverse(b.support())))
            .then_with(|| a.read_ids.cmp(&b.read_ids))
    });
    for (group_index, group) in groups.iter_mut().enumerate() {
        group.group_index = group_index;
    }
}

#[cfg(test)]
pub fn get_test_group(breakpoint: Breakpoint, read_ids: &[&str]) -> RearrangementGroup {
    RearrangementGroup {
        group_index: 0,
        left_range: IntRange::from_int(breakpoint.left.pos),
        right_range: IntRange::from_int(breakpoint.right.pos),
        breakpoint,
        read_ids: read_ids.iter().map(|x| x.to_string()).collect(),
        observation_count: read_ids.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::get_test_breakpoint;

    #[test]
    fn test_sort_rearrangement_groups() {
        let mut groups = vec![
            get_test_group(get_test_breakpoint(1, 100, true, 1, 5000, true), &["a"]),
            get_test_group(get_test_breakpoint(0, 100, true, 1, 500, false), &["a", "b"]),
            get_test_group(get_test_breakpoint(0, 100, true, 1, 500, false), &["c", "d", "e"]),
        ];
        sort_rearrangement_groups(&mut groups);
        assert_eq!(groups[0].support(), 3);
        assert_eq!(groups[1].support(), 2);
        assert_eq!(groups[2].breakpoint.left.chrom_index, 1);
        assert_eq!(groups[2].group_index, 2);
    }

    #[test]
    fn test_remap_chrom_index() {
        // Reversing the chromosome order flips the standardized orientation
        let mut group = get_test_group(get_test_breakpoint(0, 1100, true, 1, 500, false), &["a"]);
        group.left_range = IntRange::from_pair(1090, 1110);
        group.right_range = IntRange::from_pair(495, 505);
        group.remap_chrom_index(&[1, 0]);
        assert_eq!(group.breakpoint.left.chrom_index, 0);
        assert_eq!(group.breakpoint.left.pos, 500);
        assert_eq!(group.left_range, IntRange::from_pair(495, 505));
        assert_eq!(group.right_range, IntRange::from_pair(1090, 1110));

        // No flip
        let mut group = get_test_group(get_test_breakpoint(0, 1100, true, 1, 500, false), &["a"]);
        group.left_range = IntRange::from_pair(1090, 1110);
        group.remap_chrom_index(&[0, 2]);
        assert_eq!(group.breakpoint.right.chrom_index, 2);
        assert_eq!(group.left_range, IntRange::from_pair(1090, 1110));
    }
}
