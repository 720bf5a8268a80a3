//! Track stats for the whole chainsplit run
//!

use std::fs::File;

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::breakpoint::BreakpointType;

pub const RUN_STATS_FILENAME: &str = "run.stats.json";

#[derive(Default, Deserialize, Serialize)]
pub struct InputStats {
    /// Total non-comment records found in all alignment input files
    pub record_count: usize,

    /// Records dropped because they could not be parsed
    pub unparsable_record_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct ChainStats {
    pub read_count: usize,

    /// Segments dropped for violating coordinate invariants
    pub malformed_segment_count: usize,

    /// Segments dropped in favor of a higher scoring segment covering the same part of the read
    pub ambiguous_segment_count: usize,

    /// Reads with no usable segments left
    pub empty_chain_count: usize,

    pub single_segment_chain_count: usize,
    pub multi_segment_chain_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct DetectStats {
    /// Adjacent segment pairs explained as simple indels
    pub linear_junction_count: usize,

    pub breakpoint_count: usize,

    /// Reads with at least one breakpoint
    pub rearranged_read_count: usize,

    pub inter_chromosomal_count: usize,
    pub strand_switch_count: usize,
    pub large_gap_count: usize,
    pub reverse_jump_count: usize,
}

impl DetectStats {
    pub fn add_breakpoint_type(&mut self, bp_type: BreakpointType) {
        self.breakpoint_count += 1;
        match bp_type {
            BreakpointType::InterChromosomal => self.inter_chromosomal_count += 1,
            BreakpointType::StrandSwitch => self.strand_switch_count += 1,
            BreakpointType::LargeGap => self.large_gap_count += 1,
            BreakpointType::ReverseJump => self.reverse_jump_count += 1,
        }
    }

    pub fn merge(&mut self, other: &Self) {
        self.linear_junction_count += other.linear_junction_count;
        self.breakpoint_count += other.breakpoint_count;
        self.rearranged_read_count += other.rearranged_read_count;
        self.inter_chromosomal_count += other.inter_chromosomal_count;
        self.strand_switch_count += other.strand_switch_count;
        self.large_gap_count += other.large_gap_count;
        self.reverse_jump_count += other.reverse_jump_count;
    }
}

#[derive(Default, Deserialize, Serialize)]
pub struct ClusterStats {
    pub total_breakpoint_observation_count: usize,
    pub partition_count: usize,
    pub total_breakpoint_cluster_count: usize,

    /// Clusters discarded for having fewer distinct supporting reads than the minimum
    pub low_support_cluster_count: usize,

    pub rearrangement_group_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct MergeStats {
    pub input_group_count: usize,
    pub control_group_count: usize,
    pub merged_call_count: usize,

    /// Calls combining more than one group from the same source run
    pub fragmented_call_count: usize,

    pub control_filtered_call_count: usize,
    pub low_support_call_count: usize,
    pub output_call_count: usize,
}

#[derive(Default, Deserialize, Serialize)]
pub struct LinkStats {
    pub input_group_count: usize,
    pub link_count: usize,
    pub derived_path_count: usize,
    pub circular_path_count: usize,

    /// Groups with neither end linked to another group
    pub unlinked_group_count: usize,
}

#[derive(Deserialize, Serialize)]
pub struct DiscoverRunStats {
    pub sample_name: String,
    pub input_stats: InputStats,
    pub chain_stats: ChainStats,
    pub detect_stats: DetectStats,
    pub cluster_stats: ClusterStats,
}

#[derive(Deserialize, Serialize)]
pub struct MergeRunStats {
    pub sample_names: Vec<String>,
    pub control_sample_names: Vec<String>,
    pub merge_stats: MergeStats,
}

#[derive(Deserialize, Serialize)]
pub struct LinkRunStats {
    pub sample_name: String,
    pub link_stats: LinkStats,
}

fn write_run_stats<T: Serialize>(output_dir: &Utf8Path, run_stats: &T) {
    let filename = output_dir.join(RUN_STATS_FILENAME);

    info!("Writing run statistics to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create run statistics json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, run_stats),
        "Unable to write run statistics json file: '{filename}'"
    );
}

/// Write run_stats structure out in json format
pub fn write_discover_run_stats(discover_dir: &Utf8Path, run_stats: &DiscoverRunStats) {
    write_run_stats(discover_dir, run_stats);
}

pub fn read_discover_run_stats(discover_dir: &Utf8Path) -> DiscoverRunStats {
    use std::io::BufReader;

    let filename = discover_dir.join(RUN_STATS_FILENAME);
    let file = unwrap!(
        File::open(&filename),
        "Unable to read discover-mode run stats json file: `{filename}`"
    );
    let reader = BufReader::new(file);
    unwrap!(
        serde_json::from_reader(reader),
        "Unable to parse discover-mode run stats from json file: `{filename}`"
    )
}

/// Write run_stats structure out in json format
pub fn write_merge_run_stats(output_dir: &Utf8Path, run_stats: &MergeRunStats) {
    write_run_stats(output_dir, run_stats);
}

/// Write run_stats structure out in json format
pub fn write_link_run_stats(output_dir: &Utf8Path, run_stats: &LinkRunStats) {
    write_run_stats(output_dir, run_stats);
}
