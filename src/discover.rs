use log::info;
use unwrap::unwrap;

use crate::alignment_input::{AlignmentInput, read_alignment_files};
use crate::cli;
use crate::cluster_breakpoints::process_breakpoint_clusters;
use crate::detect_breakpoints::{BreakBuilder, detect_breakpoints};
use crate::group_output::{
    DiscoverGroups, serialize_discover_groups, write_debug_discarded_segments,
    write_debug_groups_bed, write_groups_tsv,
};
use crate::read_chain::build_read_chains;
use crate::run_stats::{DiscoverRunStats, write_discover_run_stats};

pub const SETTINGS_FILENAME: &str = "discover.settings.json";

pub fn run_discover(shared_settings: &cli::SharedSettings, settings: &cli::DiscoverSettings) {
    cli::write_discover_settings(&settings.output_dir, settings);

    let sample_name = settings.sample_name();
    info!("Discovering rearrangement groups for sample '{sample_name}'");

    let worker_pool = unwrap!(
        rayon::ThreadPoolBuilder::new()
            .num_threads(shared_settings.thread_count)
            .build(),
        "Unable to create worker thread pool"
    );

    let AlignmentInput {
        chrom_list,
        segments,
        stats: input_stats,
    } = read_alignment_files(&settings.alignment_filenames, settings.format);

    let (groups, discover_run_stats) = worker_pool.install(|| {
        let chain_set = build_read_chains(segments, settings.read_overlap_tolerance);

        if shared_settings.debug {
            write_debug_discarded_segments(
                &settings.output_dir,
                &chrom_list,
                &chain_set.ambiguous_segments,
            );
        }

        let break_builder = BreakBuilder::new(settings.indel_tolerance, settings.reverse_tolerance);
        let (bpos, detect_stats) = detect_breakpoints(&break_builder, &chain_set.chains);

        let (groups, cluster_stats) =
            process_breakpoint_clusters(bpos, settings.cluster_tolerance, settings.min_support);

        let discover_run_stats = DiscoverRunStats {
            sample_name: sample_name.to_string(),
            input_stats,
            chain_stats: chain_set.stats,
            detect_stats,
            cluster_stats,
        };
        (groups, discover_run_stats)
    });

    write_groups_tsv(&settings.output_dir, &chrom_list, sample_name, &groups);

    if shared_settings.debug {
        write_debug_groups_bed(&settings.output_dir, &chrom_list, &groups);
    }

    serialize_discover_groups(
        &settings.output_dir,
        &DiscoverGroups {
            sample_name: sample_name.to_string(),
            chrom_list,
            groups,
        },
    );

    // The run stats file is written last, so that its presence indicates a completed discover run
    write_discover_run_stats(&settings.output_dir, &discover_run_stats);
}
