//! Tolerance-bin clustering of two-dimensional genomic points
//!
//! This is shared by breakpoint observation clustering within one run, and by rearrangement group
//! merging across runs, at different tolerance settings.
//!

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::log_utils::debug_msg;

/// A point which can be clustered with `cluster_by_tolerance`
///
pub trait BinnedPoint {
    /// Points are only clustered with other points from the same partition
    type Partition: Clone + Ord + Send + Sync;

    fn partition(&self) -> Self::Partition;

    /// Position of the point within its partition
    fn coords(&self) -> [i64; 2];
}

type BinKey = (i64, i64);

fn get_bin(coords: [i64; 2], tolerance: i64) -> BinKey {
    (
        coords[0].div_euclid(tolerance),
        coords[1].div_euclid(tolerance),
    )
}

/// Chebyshev distance between two points
fn get_distance(a: [i64; 2], b: [i64; 2]) -> i64 {
    std::cmp::max((a[0] - b[0]).abs(), (a[1] - b[1]).abs())
}

fn get_neighbor_bins(bin: BinKey) -> impl Iterator<Item = BinKey> {
    (-1..=1).flat_map(move |dx| (-1..=1).map(move |dy| (bin.0 + dx, bin.1 + dy)))
}

/// Get the cluster representative, which is the lower median of the member coordinates in each
/// dimension
///
pub fn get_cluster_representative<T: BinnedPoint>(points: &[T], members: &[usize]) -> [i64; 2] {
    assert!(!members.is_empty());
    let mut rep = [0; 2];
    for (dim, rep_val) in rep.iter_mut().enumerate() {
        let mut vals = members
            .iter()
            .map(|&i| points[i].coords()[dim])
            .collect::<Vec<_>>();
        vals.sort_unstable();
        *rep_val = vals[(vals.len() - 1) / 2];
    }
    rep
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut x = x;
        while self.parent[x] != root {
            let next = self.parent[x];
            self.parent[x] = root;
            x = next;
        }
        root
    }

    /// Join the sets containing a and b, the lower root index becomes the new root
    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra < rb {
            self.parent[rb] = ra;
        } else if rb < ra {
            self.parent[ra] = rb;
        }
    }
}

/// Run one round of binning and assignment for the given members of a single partition
///
/// 1. Points are binned on tolerance-sized windows in each dimension.
/// 2. Neighboring bins are joined when their median positions differ by less than the tolerance.
/// 3. Each point is assigned to the nearest joined component representative within tolerance. Ties
///    go to the component with more members, then to the component with the lowest bin.
///
/// Points with no representative within tolerance stay in their own component.
///
fn bin_and_assign<T: BinnedPoint>(
    points: &[T],
    members: &[usize],
    tolerance: i64,
) -> Vec<Vec<usize>> {
    let mut bins: BTreeMap<BinKey, Vec<usize>> = BTreeMap::new();
    for &i in members {
        bins.entry(get_bin(points[i].coords(), tolerance))
            .or_default()
            .push(i);
    }

    let bin_lookup = bins
        .keys()
        .enumerate()
        .map(|(bin_index, &key)| (key, bin_index))
        .collect::<BTreeMap<_, _>>();
    let bin_reps = bins
        .values()
        .map(|x| get_cluster_representative(points, x))
        .collect::<Vec<_>>();

    let mut bin_sets = DisjointSet::new(bins.len());
    for (bin_index, &key) in bins.keys().enumerate() {
        for neighbor_key in get_neighbor_bins(key) {
            if let Some(&neighbor_index) = bin_lookup.get(&neighbor_key) {
                if neighbor_index > bin_index
                    && get_distance(bin_reps[bin_index], bin_reps[neighbor_index]) < tolerance
                {
                    bin_sets.union(bin_index, neighbor_index);
                }
            }
        }
    }

    // Components are numbered in order of their lowest bin:
    let mut root_to_component = BTreeMap::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut point_component = BTreeMap::new();
    for (bin_index, bin_members) in bins.values().enumerate() {
        let root = bin_sets.find(bin_index);
        let component_index = *root_to_component.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        for &i in bin_members {
            point_component.insert(i, component_index);
        }
        components[component_index].extend(bin_members.iter().copied());
    }

    let component_reps = components
        .iter()
        .map(|x| get_cluster_representative(points, x))
        .collect::<Vec<_>>();
    let mut rep_bins: BTreeMap<BinKey, Vec<usize>> = BTreeMap::new();
    for (component_index, &rep) in component_reps.iter().enumerate() {
        rep_bins
            .entry(get_bin(rep, tolerance))
            .or_default()
            .push(component_index);
    }

    let mut assigned = vec![Vec::new(); components.len()];
    for &i in members {
        let coords = points[i].coords();
        let mut best = None;
        for neighbor_key in get_neighbor_bins(get_bin(coords, tolerance)) {
            let Some(candidates) = rep_bins.get(&neighbor_key) else {
                continue;
            };
            for &component_index in candidates {
                let dist = get_distance(coords, component_reps[component_index]);
                if dist > tolerance {
                    continue;
                }
                let key = (
                    dist,
                    Reverse(components[component_index].len()),
                    component_index,
                );
                if best.as_ref().is_none_or(|x| key < *x) {
                    best = Some(key);
                }
            }
        }
        let component_index = match best {
            Some((_, _, x)) => x,
            None => point_component[&i],
        };
        assigned[component_index].push(i);
    }

    assigned.into_iter().filter(|x| !x.is_empty()).collect()
}

/// Remove cluster members until every remaining member is within tolerance of the cluster
/// representative
///
/// Returns the remaining members and the removed members. At least one member always remains.
///
fn trim_cluster<T: BinnedPoint>(
    points: &[T],
    cluster: Vec<usize>,
    tolerance: i64,
) -> (Vec<usize>, Vec<usize>) {
    let mut kept = cluster;
    let mut trimmed = Vec::new();
    loop {
        let rep = get_cluster_representative(points, &kept);
        let dists = kept
            .iter()
            .map(|&i| get_distance(points[i].coords(), rep))
            .collect::<Vec<_>>();
        let max_inside_dist = if dists.iter().any(|&d| d <= tolerance) {
            tolerance
        } else {
            // Every member is out of range of the median, so keep only the closest members:
            dists.iter().copied().min().unwrap_or(0)
        };
        if dists.iter().all(|&d| d <= max_inside_dist) {
            return (kept, trimmed);
        }
        let mut inside = Vec::new();
        for (&i, &d) in kept.iter().zip(dists.iter()) {
            if d <= max_inside_dist {
                inside.push(i);
            } else {
                trimmed.push(i);
            }
        }
        kept = inside;
    }
}

/// Cluster all points of one partition
///
/// Rounds of binning and assignment are repeated on any members trimmed from the previous round's
/// clusters, until no members are trimmed.
///
fn cluster_partition<T: BinnedPoint>(
    points: &[T],
    members: Vec<usize>,
    tolerance: i64,
) -> Vec<Vec<usize>> {
    let debug = false;

    let mut clusters = Vec::new();
    let mut pending = members;
    let mut round = 0;
    while !pending.is_empty() {
        round += 1;
        let round_clusters = bin_and_assign(points, &pending, tolerance);
        debug_msg!(
            debug,
            "cluster_partition: round {round} input points: {} clusters: {}",
            pending.len(),
            round_clusters.len()
        );
        pending.clear();
        for cluster in round_clusters {
            let (kept, mut trimmed) = trim_cluster(points, cluster, tolerance);
            clusters.push(kept);
            pending.append(&mut trimmed);
        }
        pending.sort_unstable();
    }
    clusters
}

/// Cluster points such that every cluster member is within `tolerance` of the cluster
/// representative in both dimensions
///
/// Partitions are clustered in parallel. The result does not depend on the order of `points`,
/// except for the order of the returned clusters. Each cluster is a sorted list of indices into
/// `points`, and clusters are returned in partition order, then in order of their lowest index.
///
pub fn cluster_by_tolerance<T: BinnedPoint + Sync>(
    points: &[T],
    tolerance: usize,
) -> Vec<Vec<usize>> {
    assert!(tolerance > 0);
    let tolerance = tolerance as i64;

    let mut partitions: BTreeMap<T::Partition, Vec<usize>> = BTreeMap::new();
    for (i, point) in points.iter().enumerate() {
        partitions.entry(point.partition()).or_default().push(i);
    }
    let partitions = partitions.into_values().collect::<Vec<_>>();

    partitions
        .into_par_iter()
        .map(|members| {
            let mut clusters = cluster_partition(points, members, tolerance);
            for cluster in clusters.iter_mut() {
                cluster.sort_unstable();
            }
            clusters.sort_unstable_by_key(|x| x[0]);
            clusters
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}
