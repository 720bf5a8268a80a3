//! Build per-read alignment chains from alignment segments
//!

use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;

use crate::alignment_segment::AlignmentSegment;
use crate::int_range::get_int_range_overlap_size;
use crate::run_stats::ChainStats;

/// Only this many malformed segments are logged individually, the rest are only counted
const MAX_REPORTED_MALFORMED_SEGMENTS: usize = 10;

/// Ordered alignment segments of one read
///
/// Segments are sorted by read start position, and no two segments overlap in the read by more
/// than the read overlap tolerance.
///
#[derive(Debug)]
pub struct ReadChain {
    pub read_id: String,
    pub segments: Vec<AlignmentSegment>,
}

pub struct ReadChainSet {
    /// Chains with at least one segment, sorted by read_id
    pub chains: Vec<ReadChain>,

    /// Segments removed during ambiguity resolution, retained for audit output
    pub ambiguous_segments: Vec<AlignmentSegment>,

    pub stats: ChainStats,
}

/// Select one alignment for each region of the read
///
/// Segments are accepted greedily in order of descending score, and a segment is discarded if it
/// overlaps any already accepted segment by more than `read_overlap_tolerance` read positions.
///
/// Returns the accepted segments sorted in read order, and the discarded segments.
///
fn resolve_ambiguous_segments(
    mut segments: Vec<AlignmentSegment>,
    read_overlap_tolerance: usize,
) -> (Vec<AlignmentSegment>, Vec<AlignmentSegment>) {
    segments.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.read_range.cmp(&b.read_range))
            .then_with(|| a.chrom_index.cmp(&b.chrom_index))
            .then_with(|| a.ref_range.cmp(&b.ref_range))
            .then_with(|| b.is_fwd_strand.cmp(&a.is_fwd_strand))
    });

    let mut accepted: Vec<AlignmentSegment> = Vec::new();
    let mut discarded = Vec::new();
    for segment in segments {
        let is_ambiguous = accepted.iter().any(|x| {
            get_int_range_overlap_size(&x.read_range, &segment.read_range) > read_overlap_tolerance
        });
        if is_ambiguous {
            discarded.push(segment);
        } else {
            accepted.push(segment);
        }
    }

    accepted.sort_by(|a, b| a.read_range.cmp(&b.read_range));
    (accepted, discarded)
}

fn build_read_chain(
    read_id: String,
    segments: Vec<AlignmentSegment>,
    read_overlap_tolerance: usize,
) -> (ReadChain, Vec<AlignmentSegment>) {
    let (segments, discarded) = resolve_ambiguous_segments(segments, read_overlap_tolerance);
    (ReadChain { read_id, segments }, discarded)
}

/// Group alignment segments by read and build the alignment chain for each read
///
/// Segments violating coordinate invariants are dropped with a warning. Reads left with no valid
/// segments are counted as empty chains and excluded from the output.
///
pub fn build_read_chains(
    segments: Vec<AlignmentSegment>,
    read_overlap_tolerance: usize,
) -> ReadChainSet {
    info!("Building read alignment chains");

    let mut stats = ChainStats::default();

    let mut read_segments: BTreeMap<String, Vec<AlignmentSegment>> = BTreeMap::new();
    for segment in segments {
        match segment.check() {
            Ok(_) => {
                read_segments
                    .entry(segment.read_id.clone())
                    .or_default()
                    .push(segment);
            }
            Err(msg) => {
                stats.malformed_segment_count += 1;
                if stats.malformed_segment_count <= MAX_REPORTED_MALFORMED_SEGMENTS {
                    warn!("Skipping malformed alignment segment: {msg}");
                }
                read_segments.entry(segment.read_id).or_default();
            }
        }
    }

    if stats.malformed_segment_count > MAX_REPORTED_MALFORMED_SEGMENTS {
        warn!(
            "Skipped {} malformed alignment segments in total",
            stats.malformed_segment_count
        );
    }

    stats.read_count = read_segments.len();

    let read_segments = read_segments.into_iter().collect::<Vec<_>>();
    let results = read_segments
        .into_par_iter()
        .filter(|(_, segments)| !segments.is_empty())
        .map(|(read_id, segments)| build_read_chain(read_id, segments, read_overlap_tolerance))
        .collect::<Vec<_>>();

    stats.empty_chain_count = stats.read_count - results.len();
    if stats.empty_chain_count > 0 {
        warn!(
            "Excluded {} reads with no valid alignment segments",
            stats.empty_chain_count
        );
    }

    let mut chains = Vec::new();
    let mut ambiguous_segments = Vec::new();
    for (chain, mut discarded) in results {
        stats.ambiguous_segment_count += discarded.len();
        ambiguous_segments.append(&mut discarded);
        if chain.segments.len() == 1 {
            stats.single_segment_chain_count += 1;
        } else {
            stats.multi_segment_chain_count += 1;
        }
        chains.push(chain);
    }

    info!(
        "Built {} read chains, {} with multiple segments",
        chains.len(),
        stats.multi_segment_chain_count
    );

    ReadChainSet {
        chains,
        ambiguous_segments,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_segment::get_test_segment;

    #[test]
    fn test_chain_order() {
        let segments = vec![
            get_test_segment("r1", 100, 200, 0, true, 50000, 50100, 90),
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r2", 0, 100, 1, false, 1000, 1100, 90),
        ];
        let chain_set = build_read_chains(segments, 20);
        assert_eq!(chain_set.chains.len(), 2);
        let chain = &chain_set.chains[0];
        assert_eq!(chain.read_id, "r1");
        assert_eq!(chain.segments[0].read_range.start, 0);
        assert_eq!(chain.segments[1].read_range.start, 100);
        assert_eq!(chain_set.stats.multi_segment_chain_count, 1);
        assert_eq!(chain_set.stats.single_segment_chain_count, 1);
    }

    #[test]
    fn test_ambiguous_overlap_keeps_highest_score() {
        let segments = vec![
            get_test_segment("r1", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r1", 100, 200, 0, true, 50000, 50100, 60),
            get_test_segment("r1", 105, 200, 1, true, 7000, 7095, 80),
            // Small overlap within tolerance is retained:
            get_test_segment("r1", 190, 300, 0, true, 9000, 9110, 70),
        ];
        let chain_set = build_read_chains(segments, 20);
        let chain = &chain_set.chains[0];
        assert_eq!(chain.segments.len(), 3);
        assert_eq!(chain.segments[1].chrom_index, 1);
        assert_eq!(chain.segments[2].read_range.start, 190);
        assert_eq!(chain_set.ambiguous_segments.len(), 1);
        assert_eq!(chain_set.ambiguous_segments[0].score, 60);
        assert_eq!(chain_set.stats.ambiguous_segment_count, 1);
    }

    #[test]
    fn test_malformed_segments() {
        let segments = vec![
            get_test_segment("r1", 100, 50, 0, true, 1000, 1100, 90),
            get_test_segment("r2", 0, 100, 0, true, 1000, 1100, 90),
            get_test_segment("r2", 100, 200, 0, true, 2000, 1900, 90),
        ];
        let chain_set = build_read_chains(segments, 20);
        assert_eq!(chain_set.stats.read_count, 2);
        assert_eq!(chain_set.stats.malformed_segment_count, 2);
        assert_eq!(chain_set.stats.empty_chain_count, 1);
        assert_eq!(chain_set.chains.len(), 1);
        assert_eq!(chain_set.chains[0].read_id, "r2");
        assert_eq!(chain_set.chains[0].segments.len(), 1);
    }
}
