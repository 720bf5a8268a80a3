use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use const_format::concatcp;
use simple_error::{SimpleResult, bail};

use super::defaults::{MERGE_TOLERANCE, MIN_TOTAL_SUPPORT};
use super::utils::{canonicalize_path, check_nonzero_setting};
use crate::discover::SETTINGS_FILENAME;
use crate::group_output::GROUPS_MESSAGEPACK_FILENAME;
use crate::run_stats::RUN_STATS_FILENAME;

#[derive(Args)]
pub struct MergeSettings {
    /// Directory for all merge command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_merge_output"))]
    pub output_dir: Utf8PathBuf,

    /// Sample discover-mode results directory (required). Can be specified multiple times to
    /// merge calls over multiple samples.
    #[arg(long, value_name = "DIR", required = true)]
    pub sample: Vec<Utf8PathBuf>,

    /// Control sample discover-mode results directory. Can be specified multiple times. Any call
    /// supported by a control sample is removed from the output.
    #[arg(long, value_name = "DIR")]
    pub control: Vec<Utf8PathBuf>,

    /// Rearrangement groups from different samples are merged when their representative
    /// breakpoints are within this distance on both sides
    #[arg(long, default_value_t = MERGE_TOLERANCE)]
    pub merge_tolerance: usize,

    /// Minimum number of supporting reads summed over all samples required to report a call
    #[arg(long, default_value_t = MIN_TOTAL_SUPPORT)]
    pub min_total_support: usize,
}

/// Check that a discover dir represents a completed discover run
///
/// The run stats file is the last file written in the discover step.
///
pub(super) fn check_valid_discover_dir(discover_dir: &Utf8Path, label: &str) -> SimpleResult<()> {
    if !discover_dir.exists() {
        bail!("{} discover path does not exist: '{}'", label, discover_dir);
    }
    if !discover_dir.is_dir() {
        bail!("{} discover path is not a directory: '{}'", label, discover_dir);
    }
    for filename in [SETTINGS_FILENAME, GROUPS_MESSAGEPACK_FILENAME, RUN_STATS_FILENAME] {
        if !discover_dir.join(filename).is_file() {
            bail!(
                "{} discover dir: '{}' does not contain completed discover step output",
                label,
                discover_dir
            );
        }
    }
    Ok(())
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_merge_settings(settings: MergeSettings) -> SimpleResult<MergeSettings> {
    if settings.sample.is_empty() {
        bail!("Must specify at least one sample discover directory");
    }

    check_nonzero_setting(settings.merge_tolerance, "merge-tolerance")?;
    check_nonzero_setting(settings.min_total_support, "min-total-support")?;

    for (sample_index, discover_dir) in settings.sample.iter().enumerate() {
        check_valid_discover_dir(discover_dir, &format!("For input sample {},", sample_index + 1))?;
    }
    for (control_index, discover_dir) in settings.control.iter().enumerate() {
        check_valid_discover_dir(
            discover_dir,
            &format!("For control sample {},", control_index + 1),
        )?;
    }

    let mut settings = settings;
    settings.sample = settings
        .sample
        .iter()
        .map(|x| canonicalize_path(x))
        .collect::<SimpleResult<Vec<_>>>()?;
    settings.control = settings
        .control
        .iter()
        .map(|x| canonicalize_path(x))
        .collect::<SimpleResult<Vec<_>>>()?;

    // Check for repeated entries
    let mut check_dirs = HashSet::new();
    for discover_dir in settings.sample.iter().chain(settings.control.iter()) {
        if !check_dirs.insert(discover_dir.as_str()) {
            bail!("Duplicated input discover dir: '{}'", discover_dir);
        }
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_settings(sample: Vec<Utf8PathBuf>) -> MergeSettings {
        MergeSettings {
            output_dir: Utf8PathBuf::from("merge_output"),
            sample,
            control: Vec::new(),
            merge_tolerance: MERGE_TOLERANCE,
            min_total_support: MIN_TOTAL_SUPPORT,
        }
    }

    #[test]
    fn test_missing_discover_dir() {
        let settings = get_test_settings(vec![Utf8PathBuf::from("./test_data/not_there")]);
        assert!(validate_and_fix_merge_settings(settings).is_err());
    }

    #[test]
    fn test_incomplete_discover_dir() {
        let settings = get_test_settings(vec![Utf8PathBuf::from("src")]);
        assert!(validate_and_fix_merge_settings(settings).is_err());
    }

    #[test]
    fn test_zero_merge_tolerance() {
        let mut settings = get_test_settings(vec![Utf8PathBuf::from("src")]);
        settings.merge_tolerance = 0;
        let msg = validate_and_fix_merge_settings(settings).err().unwrap();
        assert_eq!(
            msg.as_str(),
            "--merge-tolerance argument must be greater than 0"
        );
    }
}
