use std::collections::BTreeSet;

use log::info;

use super::tolerance_bins::{BinnedPoint, cluster_by_tolerance, get_cluster_representative};
use crate::breakpoint::{BreakpointObservation, BreakpointPartition};
use crate::int_range::IntRange;
use crate::rearrangement_group::{
    RearrangementGroup, get_representative_breakpoint, sort_rearrangement_groups,
};
use crate::run_stats::ClusterStats;

impl BinnedPoint for BreakpointObservation {
    type Partition = BreakpointPartition;

    fn partition(&self) -> Self::Partition {
        self.breakpoint.get_partition()
    }

    fn coords(&self) -> [i64; 2] {
        [self.breakpoint.left.pos, self.breakpoint.right.pos]
    }
}

/// Get the range spanned by the member positions in one dimension
fn get_member_range(bpos: &[BreakpointObservation], members: &[usize], dim: usize) -> IntRange {
    let mut range = IntRange::from_int(bpos[members[0]].coords()[dim]);
    for &i in members.iter().skip(1) {
        range.merge(&IntRange::from_int(bpos[i].coords()[dim]));
    }
    range
}

/// Convert one cluster of breakpoint observations into a rearrangement group
///
fn build_rearrangement_group(bpos: &[BreakpointObservation], members: &[usize]) -> RearrangementGroup {
    let rep = get_cluster_representative(bpos, members);
    let partition = bpos[members[0]].partition();
    let read_ids = members
        .iter()
        .map(|&i| bpos[i].read_id.clone())
        .collect::<BTreeSet<_>>();

    RearrangementGroup {
        group_index: 0,
        breakpoint: get_representative_breakpoint(&partition, rep),
        left_range: get_member_range(bpos, members, 0),
        right_range: get_member_range(bpos, members, 1),
        read_ids: read_ids.into_iter().collect(),
        observation_count: members.len(),
    }
}

/// Cluster breakpoint observations from all reads into rearrangement groups
///
/// Every member of a group is within `cluster_tolerance` of the group's representative breakpoint on
/// both sides. Groups supported by fewer than `min_support` distinct reads are discarded.
///
/// Groups are returned in sorted order with group_index set.
///
pub fn process_breakpoint_clusters(
    mut bpos: Vec<BreakpointObservation>,
    cluster_tolerance: usize,
    min_support: usize,
) -> (Vec<RearrangementGroup>, ClusterStats) {
    info!("Clustering breakpoint observations");

    let mut cluster_stats = ClusterStats {
        total_breakpoint_observation_count: bpos.len(),
        partition_count: bpos
            .iter()
            .map(|x| x.partition())
            .collect::<BTreeSet<_>>()
            .len(),
        ..Default::default()
    };

    bpos.sort();
    let clusters = cluster_by_tolerance(&bpos, cluster_tolerance);
    cluster_stats.total_breakpoint_cluster_count = clusters.len();

    let mut groups = Vec::new();
    for members in clusters.iter() {
        let group = build_rearrangement_group(&bpos, members);
        if group.support() < min_support {
            cluster_stats.low_support_cluster_count += 1;
        } else {
            groups.push(group);
        }
    }
    sort_rearrangement_groups(&mut groups);
    cluster_stats.rearrangement_group_count = groups.len();

    info!(
        "Found {} rearrangement groups from {} breakpoint clusters",
        cluster_stats.rearrangement_group_count, cluster_stats.total_breakpoint_cluster_count
    );

    (groups, cluster_stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::{Breakpoint, get_test_breakpoint};

    fn get_bpo(read_id: &str, breakpoint: Breakpoint) -> BreakpointObservation {
        BreakpointObservation {
            read_id: read_id.to_string(),
            breakpoint,
        }
    }

    #[test]
    fn test_three_read_group() {
        let bpos = vec![
            get_bpo("r1", get_test_breakpoint(0, 1100, true, 1, 500, false)),
            get_bpo("r2", get_test_breakpoint(0, 1120, true, 1, 490, false)),
            // Observed from the opposite read direction:
            get_bpo("r3", get_test_breakpoint(1, 500, true, 0, 1100, false)),
        ];
        let (groups, stats) = process_breakpoint_clusters(bpos, 50, 2);
        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.support(), 3);
        assert_eq!(group.breakpoint, get_test_breakpoint(0, 1100, true, 1, 500, false));
        assert_eq!(stats.rearrangement_group_count, 1);
        assert_eq!(stats.partition_count, 1);
    }

    #[test]
    fn test_low_support_group() {
        let bpos = vec![
            get_bpo("r1", get_test_breakpoint(0, 1100, true, 1, 500, false)),
            get_bpo("r2", get_test_breakpoint(0, 1120, true, 1, 490, false)),
            get_bpo("r3", get_test_breakpoint(0, 80000, true, 1, 500, false)),
        ];
        let (groups, stats) = process_breakpoint_clusters(bpos, 100, 2);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].read_ids, vec!["r1", "r2"]);
        assert_eq!(groups[0].left_range, IntRange::from_pair(1100, 1121));
        assert_eq!(groups[0].right_range, IntRange::from_pair(490, 501));
        assert_eq!(stats.low_support_cluster_count, 1);
        assert_eq!(stats.total_breakpoint_cluster_count, 2);
    }

    #[test]
    fn test_support_counts_distinct_reads() {
        // One read crossing the same junction twice only counts once
        let bpos = vec![
            get_bpo("r1", get_test_breakpoint(0, 1100, true, 1, 500, false)),
            get_bpo("r1", get_test_breakpoint(0, 1105, true, 1, 505, false)),
        ];
        let (groups, stats) = process_breakpoint_clusters(bpos, 100, 2);
        assert!(groups.is_empty());
        assert_eq!(stats.low_support_cluster_count, 1);
    }

    #[test]
    fn test_members_within_tolerance() {
        let cluster_tolerance = 100;
        let bpos = (0..30)
            .map(|i| {
                get_bpo(
                    &format!("r{i}"),
                    get_test_breakpoint(0, 1000 + 37 * i, true, 0, 90000 - 11 * i, true),
                )
            })
            .collect::<Vec<_>>();
        let (groups, _) = process_breakpoint_clusters(bpos.clone(), cluster_tolerance, 1);

        let total_support = groups.iter().map(|x| x.support()).sum::<usize>();
        assert_eq!(total_support, 30);
        for group in groups.iter() {
            for read_id in group.read_ids.iter() {
                let bpo = bpos.iter().find(|x| &x.read_id == read_id).unwrap();
                let left_dist = (bpo.breakpoint.left.pos - group.breakpoint.left.pos).abs();
                let right_dist = (bpo.breakpoint.right.pos - group.breakpoint.right.pos).abs();
                assert!(left_dist <= cluster_tolerance as i64);
                assert!(right_dist <= cluster_tolerance as i64);
            }
        }
    }

    #[test]
    fn test_deterministic_output() {
        let bpos = vec![
            get_bpo("r1", get_test_breakpoint(0, 1100, true, 1, 500, false)),
            get_bpo("r2", get_test_breakpoint(0, 1150, true, 1, 520, false)),
            get_bpo("r3", get_test_breakpoint(0, 1190, true, 1, 560, false)),
            get_bpo("r4", get_test_breakpoint(0, 1240, true, 1, 600, false)),
            get_bpo("r5", get_test_breakpoint(0, 1300, true, 1, 640, false)),
            get_bpo("r6", get_test_breakpoint(0, 5000, true, 0, 9000, false)),
        ];
        let mut reversed_bpos = bpos.clone();
        reversed_bpos.reverse();

        let (groups1, _) = process_breakpoint_clusters(bpos, 100, 1);
        let (groups2, _) = process_breakpoint_clusters(reversed_bpos, 100, 1);
        assert_eq!(groups1.len(), groups2.len());
        for (g1, g2) in groups1.iter().zip(groups2.iter()) {
            assert_eq!(g1.breakpoint, g2.breakpoint);
            assert_eq!(g1.read_ids, g2.read_ids);
            assert_eq!(g1.group_index, g2.group_index);
        }
    }
}
