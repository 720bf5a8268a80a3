use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};
use unwrap::unwrap;

use super::defaults::{
    CLUSTER_TOLERANCE, INDEL_TOLERANCE, MIN_SUPPORT, READ_OVERLAP_TOLERANCE, REVERSE_TOLERANCE,
};
use super::utils::{canonicalize_path, check_nonzero_setting, check_required_filename};
use crate::alignment_input::AlignmentFormat;
use crate::discover::SETTINGS_FILENAME;

#[derive(Args, Default, Deserialize, Serialize)]
pub struct DiscoverSettings {
    /// Directory for all discover command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_discover_output"))]
    pub output_dir: Utf8PathBuf,

    /// Split read alignment file, optionally gzipped. Can be specified multiple times to combine
    /// alignments from several files into one sample.
    #[arg(long = "alignments", value_name = "FILE", required = true)]
    pub alignment_filenames: Vec<String>,

    /// Format of all alignment files
    #[arg(long, value_enum, default_value_t)]
    pub format: AlignmentFormat,

    /// Sample name used to label this run's output. Defaults to the name of the first alignment
    /// file without extensions.
    #[arg(long = "sample", value_name = "NAME")]
    pub sample_name: Option<String>,

    /// Largest reference gap between adjacent segments in a read which is still treated as a
    /// simple deletion instead of a rearrangement
    #[arg(long, default_value_t = INDEL_TOLERANCE)]
    pub indel_tolerance: usize,

    /// Largest backward reference jump between adjacent segments in a read which is still
    /// treated as overlapping alignment ends instead of a rearrangement
    #[arg(long, default_value_t = REVERSE_TOLERANCE)]
    pub reverse_tolerance: usize,

    /// Segments of the same read overlapping by more than this many read bases are ambiguous,
    /// and only the highest scoring segment is kept
    #[arg(long, default_value_t = READ_OVERLAP_TOLERANCE)]
    pub read_overlap_tolerance: usize,

    /// Breakpoint observations within this distance of a group's representative breakpoint on
    /// both sides are clustered into the group
    #[arg(long, default_value_t = CLUSTER_TOLERANCE)]
    pub cluster_tolerance: usize,

    /// Minimum number of distinct supporting reads required to report a rearrangement group
    #[arg(long, default_value_t = MIN_SUPPORT)]
    pub min_support: usize,

    /// Don't canonicalize input file paths
    ///
    /// By default, all alignment file paths input to the discover step are canonicalized before
    /// they are stored in the discover output directory.
    ///
    #[arg(long)]
    pub disable_path_canonicalization: bool,
}

/// Default sample name from an alignment filename, with any .gz extension and then one more file
/// extension removed
///
fn get_default_sample_name(filename: &str) -> String {
    let file_name = Utf8Path::new(filename).file_name().unwrap_or(filename);
    let file_name = file_name.strip_suffix(".gz").unwrap_or(file_name);
    match Utf8Path::new(file_name).file_stem() {
        Some(x) if !x.is_empty() => x.to_string(),
        _ => file_name.to_string(),
    }
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_discovery_settings(
    settings: DiscoverSettings,
) -> SimpleResult<DiscoverSettings> {
    if settings.alignment_filenames.is_empty() {
        bail!("Must specify at least one alignment file");
    }
    for filename in settings.alignment_filenames.iter() {
        check_required_filename(filename, "alignment")?;
    }

    check_nonzero_setting(settings.indel_tolerance, "indel-tolerance")?;
    check_nonzero_setting(settings.reverse_tolerance, "reverse-tolerance")?;
    check_nonzero_setting(settings.cluster_tolerance, "cluster-tolerance")?;
    check_nonzero_setting(settings.min_support, "min-support")?;

    let mut settings = settings;
    match &settings.sample_name {
        Some(x) => {
            if x.is_empty() || x.contains(char::is_whitespace) {
                bail!("Invalid sample name: '{}'", x);
            }
        }
        None => {
            settings.sample_name = Some(get_default_sample_name(&settings.alignment_filenames[0]));
        }
    }

    if !settings.disable_path_canonicalization {
        settings.alignment_filenames = settings
            .alignment_filenames
            .iter()
            .map(|x| canonicalize_path(Utf8Path::new(x)).map(|x| x.to_string()))
            .collect::<SimpleResult<Vec<_>>>()?;
    }

    Ok(settings)
}

impl DiscoverSettings {
    /// Sample name, filled in during settings validation
    pub fn sample_name(&self) -> &str {
        self.sample_name.as_deref().unwrap_or_default()
    }
}

/// Write discover settings out in json format
pub fn write_discover_settings(output_dir: &Utf8Path, settings: &DiscoverSettings) {
    use log::info;

    let filename = output_dir.join(SETTINGS_FILENAME);

    info!("Writing discover settings to file: '{filename}'");

    let f = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create discover settings json file: '{filename}'"
    );

    unwrap!(
        serde_json::to_writer_pretty(&f, &settings),
        "Unable to write discover settings json file: '{filename}'"
    );
}

pub fn read_discover_settings(discover_dir: &Utf8Path) -> DiscoverSettings {
    use std::fs::File;
    use std::io::BufReader;

    let filename = discover_dir.join(SETTINGS_FILENAME);
    let file = unwrap!(
        File::open(&filename),
        "Unable to read discover-mode settings json file: `{filename}`"
    );
    let reader = BufReader::new(file);
    unwrap!(
        serde_json::from_reader(reader),
        "Unable to parse discover-mode settings from json file: `{filename}`"
    )
}
