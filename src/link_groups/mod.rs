mod derived_paths;

use log::info;

pub use self::derived_paths::{DerivedPath, link_groups};

use crate::cli::LinkSettings;
use crate::group_output::{deserialize_discover_groups, write_links_tsv};
use crate::run_stats::{LinkRunStats, write_link_run_stats};

pub fn run_link(settings: &LinkSettings) {
    let discover_groups = deserialize_discover_groups(&settings.sample);
    info!(
        "Linking {} rearrangement groups from sample '{}'",
        discover_groups.groups.len(),
        discover_groups.sample_name
    );

    let (paths, link_stats) = link_groups(&discover_groups.groups, settings.max_link_distance);

    write_links_tsv(&settings.output_dir, &discover_groups.chrom_list, &paths);

    write_link_run_stats(
        &settings.output_dir,
        &LinkRunStats {
            sample_name: discover_groups.sample_name,
            link_stats,
        },
    );
}
