use std::collections::HashSet;
use std::sync::mpsc::channel;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};
use unwrap::unwrap;

use crate::chrom_list::{ChromList, merge_chrom_lists};
use crate::cli::{MergeSettings, SharedSettings, read_discover_settings};
use crate::group_output::{DiscoverGroups, deserialize_discover_groups};
use crate::rearrangement_group::RearrangementGroup;
use crate::run_stats::read_discover_run_stats;

/// Rearrangement groups and related settings from one sample's discover run
///
pub struct SampleMergeData {
    /// Sample's order within the merge run, case samples come before control samples
    pub sample_index: usize,

    pub sample_name: String,
    pub is_control: bool,

    /// Groups with chrom_index values updated to the merged chromosome list
    pub groups: Vec<RearrangementGroup>,
}

fn read_sample_discover_data(discover_dir: &Utf8Path) -> (DiscoverGroups, usize) {
    debug!("Reading sample discovery input from '{discover_dir}'");

    let discover_settings = read_discover_settings(discover_dir);
    let discover_run_stats = read_discover_run_stats(discover_dir);
    let discover_groups = deserialize_discover_groups(discover_dir);
    assert_eq!(
        discover_run_stats.sample_name, discover_groups.sample_name,
        "Inconsistent sample names in discover directory '{discover_dir}'"
    );

    (discover_groups, discover_settings.cluster_tolerance)
}

/// Read all discover directories in parallel
///
/// Results are returned in the input directory order.
///
fn read_all_discover_data(
    thread_count: usize,
    discover_dirs: &[&Utf8PathBuf],
) -> Vec<(DiscoverGroups, usize)> {
    let worker_pool = unwrap!(
        rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build(),
        "Unable to create worker thread pool"
    );

    let (tx, rx) = channel();

    worker_pool.scope(move |scope| {
        for (sample_index, discover_dir) in discover_dirs.iter().enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let sample_data = read_sample_discover_data(discover_dir);
                unwrap!(tx.send((sample_index, sample_data)));
            });
        }
    });

    let mut all_sample_data = rx.into_iter().collect::<Vec<_>>();
    all_sample_data.sort_by_key(|x| x.0);
    all_sample_data.into_iter().map(|x| x.1).collect()
}

/// Read the discover results of all samples, and convert all groups to use a single merged
/// chromosome list
///
pub fn read_all_sample_data(
    shared_settings: &SharedSettings,
    settings: &MergeSettings,
) -> (ChromList, Vec<SampleMergeData>) {
    let discover_dirs = settings
        .sample
        .iter()
        .chain(settings.control.iter())
        .collect::<Vec<_>>();

    info!(
        "Reading discover results from {} samples and {} control samples",
        settings.sample.len(),
        settings.control.len()
    );

    let all_discover_data = read_all_discover_data(shared_settings.thread_count, &discover_dirs);
    build_sample_merge_data(
        all_discover_data,
        settings.sample.len(),
        settings.merge_tolerance,
    )
}

/// Convert the discover results of all samples to a single merged chromosome list
///
/// `all_discover_data` holds the groups and cluster tolerance of each sample, with the
/// `case_sample_count` case samples first, followed by the control samples.
///
fn build_sample_merge_data(
    all_discover_data: Vec<(DiscoverGroups, usize)>,
    case_sample_count: usize,
    merge_tolerance: usize,
) -> (ChromList, Vec<SampleMergeData>) {
    let (chrom_list, index_maps) = {
        let chrom_lists = all_discover_data
            .iter()
            .map(|x| &x.0.chrom_list)
            .collect::<Vec<_>>();
        merge_chrom_lists(&chrom_lists)
    };

    let mut sample_names = HashSet::new();
    let mut all_sample_data = Vec::new();
    for (sample_index, ((discover_groups, cluster_tolerance), index_map)) in all_discover_data
        .into_iter()
        .zip(index_maps.iter())
        .enumerate()
    {
        let is_control = sample_index >= case_sample_count;
        let sample_name = discover_groups.sample_name;
        assert!(
            sample_names.insert(sample_name.clone()),
            "Sample name '{}' is repeated in the merge input",
            sample_name
        );

        if cluster_tolerance > merge_tolerance {
            warn!(
                "Merge tolerance {} is less than the cluster tolerance {} used for sample '{sample_name}'",
                merge_tolerance, cluster_tolerance
            );
        }

        let mut groups = discover_groups.groups;
        for group in groups.iter_mut() {
            group.remap_chrom_index(index_map);
        }

        all_sample_data.push(SampleMergeData {
            sample_index,
            sample_name,
            is_control,
            groups,
        });
    }

    (chrom_list, all_sample_data)
}
