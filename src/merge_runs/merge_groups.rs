use std::cmp::Reverse;
use std::collections::BTreeSet;

use log::{info, warn};

use super::SampleMergeData;
use crate::breakpoint::{Breakpoint, BreakpointPartition, BreakpointType};
use crate::cluster_breakpoints::{BinnedPoint, cluster_by_tolerance, get_cluster_representative};
use crate::int_range::IntRange;
use crate::rearrangement_group::{RearrangementGroup, get_representative_breakpoint};
use crate::run_stats::MergeStats;

/// A set of compatible rearrangement groups from one or more samples
///
pub struct MergedCall {
    /// Index of the call in sorted output order
    pub call_index: usize,

    /// Representative breakpoint, each breakend position is the median of the member group
    /// representative positions
    pub breakpoint: Breakpoint,

    pub left_range: IntRange,
    pub right_range: IntRange,

    /// Distinct supporting read ids for each case sample, indexed on sample_index
    pub sample_read_ids: Vec<Vec<String>>,

    /// Distinct supporting reads from all control samples
    pub control_support: usize,

    /// Set when more than one group from the same sample was merged into this call
    pub is_fragmented: bool,
}

impl MergedCall {
    pub fn get_type(&self) -> BreakpointType {
        self.breakpoint.get_type()
    }

    pub fn sample_support(&self, sample_index: usize) -> usize {
        self.sample_read_ids[sample_index].len()
    }

    /// Total support over all case samples
    pub fn total_support(&self) -> usize {
        self.sample_read_ids.iter().map(|x| x.len()).sum()
    }
}

/// A rearrangement group annotated with its source sample
///
struct AnnoRearrangementGroup<'a> {
    sample_index: usize,
    sample_name: &'a str,
    is_control: bool,
    group: &'a RearrangementGroup,
}

impl BinnedPoint for AnnoRearrangementGroup<'_> {
    type Partition = BreakpointPartition;

    fn partition(&self) -> Self::Partition {
        self.group.partition()
    }

    fn coords(&self) -> [i64; 2] {
        self.group.coords()
    }
}

/// Get all groups from all samples in a canonical order
///
/// The order depends only on group and sample content, not on the order in which samples are
/// provided.
///
fn get_sorted_anno_groups(all_sample_data: &[SampleMergeData]) -> Vec<AnnoRearrangementGroup<'_>> {
    let mut anno_groups = all_sample_data
        .iter()
        .flat_map(|sample_data| {
            sample_data.groups.iter().map(|group| AnnoRearrangementGroup {
                sample_index: sample_data.sample_index,
                sample_name: sample_data.sample_name.as_str(),
                is_control: sample_data.is_control,
                group,
            })
        })
        .collect::<Vec<_>>();

    anno_groups.sort_by(|a, b| {
        a.group
            .breakpoint
            .cmp(&b.group.breakpoint)
            .then_with(|| a.is_control.cmp(&b.is_control))
            .then_with(|| a.sample_name.cmp(&b.sample_name))
            .then_with(|| a.group.read_ids.cmp(&b.group.read_ids))
    });
    anno_groups
}

fn build_merged_call(
    case_sample_count: usize,
    anno_groups: &[AnnoRearrangementGroup],
    members: &[usize],
) -> MergedCall {
    let rep = get_cluster_representative(anno_groups, members);
    let partition = anno_groups[members[0]].partition();

    let mut sample_read_ids = vec![BTreeSet::new(); case_sample_count];
    let mut control_read_ids = BTreeSet::new();
    let mut merged_samples = BTreeSet::new();
    let mut is_fragmented = false;
    let mut left_range = anno_groups[members[0]].group.left_range.clone();
    let mut right_range = anno_groups[members[0]].group.right_range.clone();
    for &i in members {
        let anno_group = &anno_groups[i];
        let read_ids = anno_group.group.read_ids.iter().map(|x| x.as_str());
        if anno_group.is_control {
            // Control read ids are qualified with their sample so that read names repeated across
            // control samples are not collapsed
            control_read_ids.extend(read_ids.map(|x| (anno_group.sample_index, x)));
        } else {
            sample_read_ids[anno_group.sample_index].extend(read_ids);
        }
        if !merged_samples.insert(anno_group.sample_index) {
            is_fragmented = true;
        }
        left_range.merge(&anno_group.group.left_range);
        right_range.merge(&anno_group.group.right_range);
    }

    MergedCall {
        call_index: 0,
        breakpoint: get_representative_breakpoint(&partition, rep),
        left_range,
        right_range,
        sample_read_ids: sample_read_ids
            .into_iter()
            .map(|x| x.into_iter().map(|x| x.to_string()).collect())
            .collect(),
        control_support: control_read_ids.len(),
        is_fragmented,
    }
}

/// Merge rearrangement groups from all samples into calls
///
/// Case samples must use sample_index values 0..case_sample_count, control samples follow.
///
/// Calls with any control sample support, or with total case support below `min_total_support`
/// are filtered out. Remaining calls are returned in sorted order with call_index set.
///
pub fn merge_groups(
    all_sample_data: &[SampleMergeData],
    merge_tolerance: usize,
    min_total_support: usize,
) -> (Vec<MergedCall>, MergeStats) {
    info!("Merging rearrangement groups from all samples");

    let case_sample_count = all_sample_data.iter().filter(|x| !x.is_control).count();
    assert!(
        all_sample_data
            .iter()
            .all(|x| x.is_control == (x.sample_index >= case_sample_count))
    );

    let mut merge_stats = MergeStats::default();
    for sample_data in all_sample_data.iter() {
        if sample_data.is_control {
            merge_stats.control_group_count += sample_data.groups.len();
        } else {
            merge_stats.input_group_count += sample_data.groups.len();
        }
    }

    let anno_groups = get_sorted_anno_groups(all_sample_data);
    let clusters = cluster_by_tolerance(&anno_groups, merge_tolerance);
    merge_stats.merged_call_count = clusters.len();

    let mut calls = Vec::new();
    for members in clusters.iter() {
        let call = build_merged_call(case_sample_count, &anno_groups, members);
        if call.is_fragmented {
            merge_stats.fragmented_call_count += 1;
        }
        if call.control_support > 0 {
            merge_stats.control_filtered_call_count += 1;
        } else if call.total_support() < min_total_support {
            merge_stats.low_support_call_count += 1;
        } else {
            calls.push(call);
        }
    }

    if merge_stats.fragmented_call_count > 0 {
        warn!(
            "{} merged calls include multiple rearrangement groups from the same sample",
            merge_stats.fragmented_call_count
        );
    }

    calls.sort_by(|a, b| {
        a.breakpoint
            .cmp(&b.breakpoint)
            .then_with(|| Reverse(a.total_support()).cmp(&Reverse(b.total_support())))
            .then_with(|| a.sample_read_ids.cmp(&b.sample_read_ids))
    });
    for (call_index, call) in calls.iter_mut().enumerate() {
        call.call_index = call_index;
    }
    merge_stats.output_call_count = calls.len();

    info!(
        "Merged {} rearrangement groups into {} calls, {} calls after filtering",
        merge_stats.input_group_count + merge_stats.control_group_count,
        merge_stats.merged_call_count,
        merge_stats.output_call_count
    );

    (calls, merge_stats)
}
