use camino::Utf8PathBuf;
use clap::Args;
use const_format::concatcp;
use simple_error::SimpleResult;

use super::defaults::MAX_LINK_DISTANCE;
use super::merge::check_valid_discover_dir;
use super::utils::{canonicalize_path, check_nonzero_setting};

#[derive(Args)]
pub struct LinkSettings {
    /// Directory for all link command output (must not already exist)
    #[arg(long, value_name = "DIR", default_value = concatcp!(env!("CARGO_PKG_NAME"), "_link_output"))]
    pub output_dir: Utf8PathBuf,

    /// Sample discover-mode results directory with the rearrangement groups to link
    #[arg(long, value_name = "DIR", required = true)]
    pub sample: Utf8PathBuf,

    /// Largest reference distance between two facing group breakends which can be linked
    /// through a derived chromosome segment
    #[arg(long, default_value_t = MAX_LINK_DISTANCE)]
    pub max_link_distance: usize,
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
/// Assumes that the logger is not setup
///
pub fn validate_and_fix_link_settings(mut settings: LinkSettings) -> SimpleResult<LinkSettings> {
    check_nonzero_setting(settings.max_link_distance, "max-link-distance")?;
    check_valid_discover_dir(&settings.sample, "For input sample,")?;
    settings.sample = canonicalize_path(&settings.sample)?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_settings(sample: &str) -> LinkSettings {
        LinkSettings {
            output_dir: Utf8PathBuf::from("link_output"),
            sample: Utf8PathBuf::from(sample),
            max_link_distance: MAX_LINK_DISTANCE,
        }
    }

    #[test]
    fn test_incomplete_discover_dir() {
        let settings = get_test_settings("src");
        assert!(validate_and_fix_link_settings(settings).is_err());
    }

    #[test]
    fn test_zero_max_link_distance() {
        let mut settings = get_test_settings("src");
        settings.max_link_distance = 0;
        let msg = validate_and_fix_link_settings(settings).err().unwrap();
        assert_eq!(
            msg.as_str(),
            "--max-link-distance argument must be greater than 0"
        );
    }
}
