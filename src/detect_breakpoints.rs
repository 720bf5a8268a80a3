//! Find rearrangement breakpoints in read alignment chains
//!

use log::info;
use rayon::prelude::*;

use crate::alignment_segment::AlignmentSegment;
use crate::breakpoint::{Breakend, Breakpoint, BreakpointObservation};
use crate::read_chain::ReadChain;
use crate::run_stats::DetectStats;

/// Classifies the junctions between adjacent segments of each read chain
///
pub struct BreakBuilder {
    /// Largest forward reference gap between adjacent segments which is treated as a simple
    /// deletion or alignment gap
    indel_tolerance: i64,

    /// Largest backward reference jump between adjacent segments which is treated as an alignment
    /// boundary overlap
    reverse_tolerance: i64,
}

impl BreakBuilder {
    pub fn new(indel_tolerance: usize, reverse_tolerance: usize) -> Self {
        Self {
            indel_tolerance: indel_tolerance as i64,
            reverse_tolerance: reverse_tolerance as i64,
        }
    }

    /// Get the breakpoint for the junction between two segments, ordered such that s1 comes
    /// before s2 in the read
    ///
    fn get_junction_breakpoint(s1: &AlignmentSegment, s2: &AlignmentSegment) -> Breakpoint {
        let left = Breakend {
            chrom_index: s1.chrom_index,
            pos: if s1.is_fwd_strand {
                s1.ref_range.end
            } else {
                s1.ref_range.start
            },
            is_fwd_strand: s1.is_fwd_strand,
        };
        let right = Breakend {
            chrom_index: s2.chrom_index,
            pos: if s2.is_fwd_strand {
                s2.ref_range.start
            } else {
                s2.ref_range.end
            },
            is_fwd_strand: s2.is_fwd_strand,
        };
        Breakpoint::new(left, right)
    }

    /// True if the junction can be explained as a simple indel or alignment boundary artifact
    ///
    /// This requires both sides to be on the same chromosome and strand, with a reference jump in
    /// the read direction that is within the forward or reverse tolerance.
    ///
    pub fn is_linear_junction(&self, bp: &Breakpoint) -> bool {
        match bp.get_ref_jump() {
            Some(jump) => {
                if jump >= 0 {
                    jump <= self.indel_tolerance
                } else {
                    -jump <= self.reverse_tolerance
                }
            }
            None => false,
        }
    }

    /// Scan each adjacent segment pair in the chain, and push a breakpoint observation into
    /// `all_bpo` for each rearranged junction
    ///
    pub fn process_read_chain(
        &self,
        chain: &ReadChain,
        all_bpo: &mut Vec<BreakpointObservation>,
        stats: &mut DetectStats,
    ) {
        let mut is_rearranged_read = false;
        for segment_pair in chain.segments.windows(2) {
            let breakpoint = Self::get_junction_breakpoint(&segment_pair[0], &segment_pair[1]);
            if self.is_linear_junction(&breakpoint) {
                stats.linear_junction_count += 1;
                continue;
            }

            stats.add_breakpoint_type(breakpoint.get_type());
            is_rearranged_read = true;
            all_bpo.push(BreakpointObservation {
                read_id: chain.read_id.clone(),
                breakpoint,
            });
        }
        if is_rearranged_read {
            stats.rearranged_read_count += 1;
        }
    }
}

/// Find breakpoint observations from all read chains
///
/// Chains are processed in parallel, observations are returned in chain order.
///
pub fn detect_breakpoints(
    break_builder: &BreakBuilder,
    chains: &[ReadChain],
) -> (Vec<BreakpointObservation>, DetectStats) {
    info!("Detecting breakpoints in read chains");

    let results = chains
        .par_iter()
        .filter(|x| x.segments.len() > 1)
        .map(|chain| {
            let mut all_bpo = Vec::new();
            let mut stats = DetectStats::default();
            break_builder.process_read_chain(chain, &mut all_bpo, &mut stats);
            (all_bpo, stats)
        })
        .collect::<Vec<_>>();

    let mut all_bpo = Vec::new();
    let mut stats = DetectStats::default();
    for (mut read_bpo, read_stats) in results {
        all_bpo.append(&mut read_bpo);
        stats.merge(&read_stats);
    }

    info!(
        "Found {} breakpoint observations in {} rearranged reads",
        stats.breakpoint_count, stats.rearranged_read_count
    );

    (all_bpo, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_segment::get_test_segment;
    use crate::breakpoint::BreakpointType;

    fn get_chain(segments: Vec<AlignmentSegment>) -> ReadChain {
        ReadChain {
            read_id: segments[0].read_id.clone(),
            segments,
        }
    }

    fn get_read_bpos(
        break_builder: &BreakBuilder,
        chain: &ReadChain,
    ) -> (Vec<BreakpointObservation>, DetectStats) {
        let mut all_bpo = Vec::new();
        let mut stats = DetectStats::default();
        break_builder.process_read_chain(chain, &mut all_bpo, &mut stats);
        (all_bpo, stats)
    }

    #[test]
    fn test_single_segment_chain() {
        let break_builder = BreakBuilder::new(1000, 1000);
        let chain = get_chain(vec![get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90)]);
        let (all_bpo, stats) = get_read_bpos(&break_builder, &chain);
        assert!(all_bpo.is_empty());
        assert_eq!(stats.rearranged_read_count, 0);
    }

    #[test]
    fn test_large_gap_breakpoint() {
        let break_builder = BreakBuilder::new(1000, 1000);
        let chain = get_chain(vec![
            get_test_segment("R1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("R1", 100, 200, 0, true, 50000, 50100, 90),
        ]);
        let (all_bpo, stats) = get_read_bpos(&break_builder, &chain);
        assert_eq!(all_bpo.len(), 1);
        let bp = &all_bpo[0].breakpoint;
        assert_eq!((bp.left.chrom_index, bp.left.pos, bp.left.is_fwd_strand), (0, 1100, true));
        assert_eq!((bp.right.chrom_index, bp.right.pos, bp.right.is_fwd_strand), (0, 50000, true));
        assert_eq!(bp.get_type(), BreakpointType::LargeGap);
        assert_eq!(all_bpo[0].read_id, "R1");
        assert_eq!(stats.large_gap_count, 1);
    }

    #[test]
    fn test_linear_junctions() {
        let break_builder = BreakBuilder::new(1000, 100);

        // Forward strand gap within tolerance
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 0, true, 2000, 2100, 90),
        ]);
        assert!(get_read_bpos(&break_builder, &chain).0.is_empty());

        // Reverse strand gap within tolerance
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, false, 5000, 5100, 90),
            get_test_segment("r1", 100, 200, 0, false, 4800, 4990, 90),
        ]);
        assert!(get_read_bpos(&break_builder, &chain).0.is_empty());

        // Small backward overlap at the alignment boundary
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 0, true, 1080, 1180, 90),
        ]);
        let (all_bpo, stats) = get_read_bpos(&break_builder, &chain);
        assert!(all_bpo.is_empty());
        assert_eq!(stats.linear_junction_count, 1);
    }

    #[test]
    fn test_rearranged_junctions() {
        let break_builder = BreakBuilder::new(1000, 100);

        // Different chromosomes are always rearranged, even when positions are close
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 1, true, 1100, 1200, 90),
        ]);
        let (all_bpo, _) = get_read_bpos(&break_builder, &chain);
        assert_eq!(all_bpo.len(), 1);
        assert_eq!(all_bpo[0].breakpoint.get_type(), BreakpointType::InterChromosomal);

        // Strand switch
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 0, false, 1200, 1300, 90),
        ]);
        let (all_bpo, _) = get_read_bpos(&break_builder, &chain);
        assert_eq!(all_bpo[0].breakpoint.get_type(), BreakpointType::StrandSwitch);

        // Backward jump beyond the reverse tolerance
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 0, true, 500, 600, 90),
        ]);
        let (all_bpo, _) = get_read_bpos(&break_builder, &chain);
        assert_eq!(all_bpo[0].breakpoint.get_type(), BreakpointType::ReverseJump);
    }

    #[test]
    fn test_multiple_junctions_in_one_read() {
        let break_builder = BreakBuilder::new(1000, 100);
        let chain = get_chain(vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 1, true, 500, 600, 90),
            get_test_segment("r1", 200, 300, 1, true, 650, 750, 90),
            get_test_segment("r1", 300, 400, 0, true, 1200, 1300, 90),
        ]);
        let (all_bpo, stats) = get_read_bpos(&break_builder, &chain);
        assert_eq!(all_bpo.len(), 2);
        assert_eq!(stats.inter_chromosomal_count, 2);
        assert_eq!(stats.linear_junction_count, 1);
        assert_eq!(stats.rearranged_read_count, 1);
    }

    #[test]
    fn test_detect_breakpoints() {
        let break_builder = BreakBuilder::new(1000, 100);
        let chains = vec![
            get_chain(vec![get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90)]),
            get_chain(vec![
                get_test_segment("r2", 0, 100, 0, true, 1000, 1100, 90),
                get_test_segment("r2", 100, 200, 1, false, 400, 500, 90),
            ]),
        ];
        let (all_bpo, stats) = detect_breakpoints(&break_builder, &chains);
        assert_eq!(all_bpo.len(), 1);
        assert_eq!(all_bpo[0].read_id, "r2");
        assert_eq!(stats.breakpoint_count, 1);
    }
}
