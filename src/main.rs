mod alignment_input;
mod alignment_segment;
mod breakpoint;
mod chrom_list;
mod cli;
mod cluster_breakpoints;
mod detect_breakpoints;
mod discover;
mod globals;
mod group_output;
mod int_range;
mod link_groups;
mod log_utils;
mod logger;
mod merge_runs;
mod os_utils;
mod read_chain;
mod rearrangement_group;
mod run_stats;

use std::{error, process};

use hhmmss::Hhmmss;
use log::info;

use crate::cli::Commands;
use crate::discover::run_discover;
use crate::globals::{PROGRAM_NAME, PROGRAM_VERSION};
use crate::link_groups::run_link;
use crate::logger::setup_output_dir_and_logger;
use crate::merge_runs::run_merge;

fn run(settings: &cli::Settings) -> Result<(), Box<dyn error::Error>> {
    info!("Starting {PROGRAM_NAME} {PROGRAM_VERSION}");
    info!(
        "cmdline: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    );
    info!("Running on {} threads", settings.shared.thread_count);

    let start = std::time::Instant::now();

    match &settings.command {
        Commands::Discover(x) => {
            run_discover(&settings.shared, x);
        }
        Commands::Merge(x) => {
            run_merge(&settings.shared, x);
        }
        Commands::Link(x) => {
            run_link(x);
        }
    }

    info!(
        "{PROGRAM_NAME} completed. Total Runtime: {}",
        start.elapsed().hhmmssxxx()
    );
    Ok(())
}

fn main() {
    let settings = cli::validate_and_fix_settings(cli::parse_settings());

    // Setup logger, including creation of the output directory for the log file:
    setup_output_dir_and_logger(
        settings.get_output_dir(),
        settings.shared.clobber,
        settings.shared.debug,
    );

    if let Err(err) = run(&settings) {
        eprintln!("{err}");
        process::exit(2);
    }
}
