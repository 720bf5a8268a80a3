pub const INDEL_TOLERANCE: usize = 10000;
pub const REVERSE_TOLERANCE: usize = 1000;
pub const READ_OVERLAP_TOLERANCE: usize = 20;
pub const CLUSTER_TOLERANCE: usize = 100;
pub const MIN_SUPPORT: usize = 2;
pub const MERGE_TOLERANCE: usize = 200;
pub const MIN_TOTAL_SUPPORT: usize = 1;
pub const MAX_LINK_DISTANCE: usize = 1_000_000;
