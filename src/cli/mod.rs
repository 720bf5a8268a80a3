mod defaults;
mod discover;
mod link;
mod merge;
mod shared;
mod utils;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use simple_error::{SimpleResult, bail};

pub use self::discover::{
    DiscoverSettings, read_discover_settings, validate_and_fix_discovery_settings,
    write_discover_settings,
};
pub use self::link::{LinkSettings, validate_and_fix_link_settings};
pub use self::merge::{MergeSettings, validate_and_fix_merge_settings};
use self::shared::validate_and_fix_shared_settings;
pub use self::shared::SharedSettings;

#[derive(Subcommand)]
pub enum Commands {
    /// Discover rearrangement groups from split read alignments of one sample
    Discover(DiscoverSettings),

    /// Merge rearrangement groups from one to many samples, given the discover command results
    /// from each
    Merge(MergeSettings),

    /// Link rearrangement groups from one sample's discover command results into derived
    /// chromosome paths
    Link(LinkSettings),
}

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
#[clap(propagate_version = true, rename_all = "kebab_case")]
pub struct Settings {
    #[command(flatten)]
    pub shared: SharedSettings,

    #[command(subcommand)]
    pub command: Commands,
}

impl Settings {
    pub fn get_output_dir(&self) -> &Utf8Path {
        match &self.command {
            Commands::Discover(x) => &x.output_dir,
            Commands::Merge(x) => &x.output_dir,
            Commands::Link(x) => &x.output_dir,
        }
    }
}

/// Checks if a directory does not exist
///
pub fn check_novel_dirname(dirname: &Utf8Path, label: &str) -> SimpleResult<()> {
    if dirname.exists() {
        bail!("{} already exists: \"{}\"", label, dirname);
    }
    Ok(())
}

/// Validate settings and update parameters that can't be processed by clap
///
pub fn validate_and_fix_settings_impl(mut settings: Settings) -> SimpleResult<Settings> {
    settings.shared = validate_and_fix_shared_settings(settings.shared)?;

    settings.command = match settings.command {
        Commands::Discover(x) => {
            let x = validate_and_fix_discovery_settings(x)?;
            Commands::Discover(x)
        }
        Commands::Merge(x) => {
            let x = validate_and_fix_merge_settings(x)?;
            Commands::Merge(x)
        }
        Commands::Link(x) => {
            let x = validate_and_fix_link_settings(x)?;
            Commands::Link(x)
        }
    };

    Ok(settings)
}

/// Validate settings and update to parameters that can't be processed automatically by clap.
///
pub fn validate_and_fix_settings(settings: Settings) -> Settings {
    match validate_and_fix_settings_impl(settings) {
        Ok(x) => x,
        Err(msg) => {
            eprintln!("Invalid command-line setting: {}", msg);
            std::process::exit(exitcode::USAGE);
        }
    }
}

pub fn parse_settings() -> Settings {
    Settings::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discover_defaults() {
        let settings =
            Settings::try_parse_from(["chainsplit", "discover", "--alignments", "a.maf"]).unwrap();
        let Commands::Discover(x) = &settings.command else {
            panic!("Expected discover command");
        };
        assert_eq!(x.alignment_filenames, vec!["a.maf"]);
        assert_eq!(x.indel_tolerance, 10000);
        assert_eq!(x.cluster_tolerance, 100);
        assert_eq!(x.min_support, 2);
        assert_eq!(settings.get_output_dir().as_str(), "chainsplit_discover_output");
    }

    #[test]
    fn test_parse_merge() {
        let settings = Settings::try_parse_from([
            "chainsplit",
            "merge",
            "--sample",
            "s1",
            "--sample",
            "s2",
            "--control",
            "c1",
            "--threads",
            "2",
        ])
        .unwrap();
        let Commands::Merge(x) = &settings.command else {
            panic!("Expected merge command");
        };
        assert_eq!(x.sample.len(), 2);
        assert_eq!(x.control.len(), 1);
        assert_eq!(x.merge_tolerance, 200);
        assert!(!settings.shared.clobber);
    }

    #[test]
    fn test_parse_link() {
        let settings =
            Settings::try_parse_from(["chainsplit", "link", "--sample", "s1"]).unwrap();
        let Commands::Link(x) = &settings.command else {
            panic!("Expected link command");
        };
        assert_eq!(x.sample.as_str(), "s1");
        assert_eq!(x.max_link_distance, 1_000_000);
        assert_eq!(settings.get_output_dir().as_str(), "chainsplit_link_output");
    }

    #[test]
    fn test_parse_missing_alignments() {
        assert!(Settings::try_parse_from(["chainsplit", "discover"]).is_err());
    }
}
