mod merge_groups;
mod read_sample_data;
mod supporting_read_names;

use log::info;
use unwrap::unwrap;

pub use self::merge_groups::MergedCall;
use self::merge_groups::merge_groups;
pub use self::read_sample_data::SampleMergeData;
use self::read_sample_data::read_all_sample_data;
use self::supporting_read_names::write_supporting_read_names;

use crate::cli::{MergeSettings, SharedSettings};
use crate::group_output::write_merged_calls_tsv;
use crate::run_stats::{MergeRunStats, write_merge_run_stats};

pub fn run_merge(shared_settings: &SharedSettings, settings: &MergeSettings) {
    let (chrom_list, all_sample_data) = read_all_sample_data(shared_settings, settings);

    let worker_pool = unwrap!(
        rayon::ThreadPoolBuilder::new()
            .num_threads(shared_settings.thread_count)
            .build(),
        "Unable to create worker thread pool"
    );

    let (calls, merge_stats) = worker_pool.install(|| {
        merge_groups(
            &all_sample_data,
            settings.merge_tolerance,
            settings.min_total_support,
        )
    });

    let sample_names = all_sample_data
        .iter()
        .filter(|x| !x.is_control)
        .map(|x| x.sample_name.as_str())
        .collect::<Vec<_>>();
    let control_sample_names = all_sample_data
        .iter()
        .filter(|x| x.is_control)
        .map(|x| x.sample_name.clone())
        .collect::<Vec<_>>();

    info!(
        "Writing {} merged calls for {} samples",
        calls.len(),
        sample_names.len()
    );

    write_merged_calls_tsv(&settings.output_dir, &chrom_list, &sample_names, &calls);
    write_supporting_read_names(&settings.output_dir, &sample_names, &calls);

    write_merge_run_stats(
        &settings.output_dir,
        &MergeRunStats {
            sample_names: sample_names.iter().map(|x| x.to_string()).collect(),
            control_sample_names,
            merge_stats,
        },
    );
}
