pub mod process_breakpoint_clusters;
mod tolerance_bins;

pub use process_breakpoint_clusters::*;
pub use tolerance_bins::{BinnedPoint, cluster_by_tolerance, get_cluster_representative};
