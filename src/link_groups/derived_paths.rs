//! Link rearrangement groups into derived chromosome paths
//!
//! Each group is treated as a junction which a derived chromosome can traverse in either direction.
//! A group has two ends, each describing where the derived sequence continues into the reference
//! on that side of the junction. Two ends facing each other on the same chromosome can be joined by
//! the reference stretch between them.
//!

use std::collections::BTreeMap;

use log::info;

use crate::breakpoint::Breakend;
use crate::int_range::IntRange;
use crate::rearrangement_group::RearrangementGroup;
use crate::run_stats::LinkStats;

#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
enum GroupSide {
    Left,
    Right,
}

impl GroupSide {
    fn other(self) -> Self {
        match self {
            GroupSide::Left => GroupSide::Right,
            GroupSide::Right => GroupSide::Left,
        }
    }
}

/// One end of a group, `group_pos` is the group's position in group_index order
///
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
struct GroupEnd {
    group_pos: usize,
    side: GroupSide,
}

impl GroupEnd {
    fn index(&self) -> usize {
        self.group_pos * 2 + (self.side as usize)
    }
}

/// Reference stretch traversed by a derived chromosome between two linked groups
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DerivedSegment {
    pub chrom_index: usize,
    pub range: IntRange,
}

pub struct PathStep {
    /// group_index of the traversed group
    pub group_index: usize,

    /// True if the group is traversed from its left breakend to its right breakend
    pub is_forward: bool,

    /// Breakends where the path enters and exits the junction, with strands given in the
    /// direction of path traversal
    pub entry: Breakend,
    pub exit: Breakend,

    /// Segment leading to the next group in the path, None at the end of a linear path
    pub next_segment: Option<DerivedSegment>,
}

pub struct DerivedPath {
    pub steps: Vec<PathStep>,

    /// Set when the last step's segment leads back to the first step
    pub is_circular: bool,
}

/// Reference position and direction in which the derived sequence continues from a group end
///
fn get_end_direction(group: &RearrangementGroup, side: GroupSide) -> (usize, i64, bool) {
    match side {
        GroupSide::Left => {
            let b = &group.breakpoint.left;
            (b.chrom_index, b.pos, !b.is_fwd_strand)
        }
        GroupSide::Right => {
            let b = &group.breakpoint.right;
            (b.chrom_index, b.pos, b.is_fwd_strand)
        }
    }
}

fn get_derived_segment(
    groups: &[&RearrangementGroup],
    end1: GroupEnd,
    end2: GroupEnd,
) -> DerivedSegment {
    let (chrom_index, pos1, _) = get_end_direction(groups[end1.group_pos], end1.side);
    let (_, pos2, _) = get_end_direction(groups[end2.group_pos], end2.side);
    DerivedSegment {
        chrom_index,
        range: IntRange::from_pair(pos1.min(pos2), pos1.max(pos2)),
    }
}

/// Find the partner of each group end, indexed by GroupEnd::index
///
/// A forward-running end at position p and a reverse-running end at position q on the same
/// chromosome can be linked if 0 < q - p <= max_link_distance. Candidates are accepted greedily
/// from the shortest distance, and each end takes at most one link.
///
fn find_end_links(
    groups: &[&RearrangementGroup],
    max_link_distance: i64,
) -> Vec<Option<GroupEnd>> {
    let mut chrom_ends: BTreeMap<usize, (Vec<(i64, GroupEnd)>, Vec<(i64, GroupEnd)>)> =
        BTreeMap::new();
    for (group_pos, group) in groups.iter().enumerate() {
        for side in [GroupSide::Left, GroupSide::Right] {
            let (chrom_index, pos, is_fwd) = get_end_direction(group, side);
            let ends = chrom_ends.entry(chrom_index).or_default();
            let end = GroupEnd { group_pos, side };
            if is_fwd {
                ends.0.push((pos, end));
            } else {
                ends.1.push((pos, end));
            }
        }
    }

    let mut candidates = Vec::new();
    for (fwd_ends, mut rev_ends) in chrom_ends.into_values() {
        rev_ends.sort();
        for (fwd_pos, fwd_end) in fwd_ends {
            let start = rev_ends.partition_point(|x| x.0 <= fwd_pos);
            for &(rev_pos, rev_end) in rev_ends[start..].iter() {
                let distance = rev_pos - fwd_pos;
                if distance > max_link_distance {
                    break;
                }
                if rev_end.group_pos == fwd_end.group_pos {
                    continue;
                }
                candidates.push((distance, fwd_end.min(rev_end), fwd_end.max(rev_end)));
            }
        }
    }
    candidates.sort();

    let mut links = vec![None; groups.len() * 2];
    for (_, end1, end2) in candidates {
        if links[end1.index()].is_none() && links[end2.index()].is_none() {
            links[end1.index()] = Some(end2);
            links[end2.index()] = Some(end1);
        }
    }
    links
}

/// Walk a path starting from `start_pos`, entering it through `entry_side`
///
fn walk_path(
    groups: &[&RearrangementGroup],
    links: &[Option<GroupEnd>],
    start_pos: usize,
    entry_side: GroupSide,
    is_visited: &mut [bool],
) -> DerivedPath {
    let mut steps = Vec::new();
    let mut group_pos = start_pos;
    let mut entry_side = entry_side;
    loop {
        is_visited[group_pos] = true;
        let group = groups[group_pos];
        let exit_end = GroupEnd {
            group_pos,
            side: entry_side.other(),
        };
        let next_end = links[exit_end.index()];

        let is_forward = entry_side == GroupSide::Left;
        let (entry, exit) = if is_forward {
            (group.breakpoint.left.clone(), group.breakpoint.right.clone())
        } else {
            (group.breakpoint.right.flip(), group.breakpoint.left.flip())
        };
        steps.push(PathStep {
            group_index: group.group_index,
            is_forward,
            entry,
            exit,
            next_segment: next_end.map(|x| get_derived_segment(groups, exit_end, x)),
        });

        match next_end {
            None => {
                return DerivedPath {
                    steps,
                    is_circular: false,
                };
            }
            Some(x) if x.group_pos == start_pos => {
                return DerivedPath {
                    steps,
                    is_circular: true,
                };
            }
            Some(x) => {
                group_pos = x.group_pos;
                entry_side = x.side;
            }
        }
    }
}

/// Link rearrangement groups into derived chromosome paths
///
/// Groups are processed in group_index order, so the result does not depend on input order. Linear
/// paths start from their lowest-index group with a free end, cycles start from their lowest-index
/// group traversed forward. Groups without any links are not returned as paths. Paths are sorted by
/// their first group.
///
pub fn link_groups(
    groups: &[RearrangementGroup],
    max_link_distance: usize,
) -> (Vec<DerivedPath>, LinkStats) {
    let mut groups = groups.iter().collect::<Vec<_>>();
    groups.sort_by_key(|x| x.group_index);

    let links = find_end_links(&groups, max_link_distance as i64);

    let mut stats = LinkStats {
        input_group_count: groups.len(),
        link_count: links.iter().filter(|x| x.is_some()).count() / 2,
        ..Default::default()
    };

    let mut is_visited = vec![false; groups.len()];
    let mut paths = Vec::new();
    for group_pos in 0..groups.len() {
        if is_visited[group_pos] {
            continue;
        }
        let is_free = |side: GroupSide| links[GroupEnd { group_pos, side }.index()].is_none();
        let entry_side = match (is_free(GroupSide::Left), is_free(GroupSide::Right)) {
            (true, true) => {
                is_visited[group_pos] = true;
                stats.unlinked_group_count += 1;
                continue;
            }
            (true, false) => GroupSide::Left,
            (false, true) => GroupSide::Right,
            (false, false) => continue,
        };
        paths.push(walk_path(
            &groups,
            &links,
            group_pos,
            entry_side,
            &mut is_visited,
        ));
    }

    // Everything left is part of a cycle
    for group_pos in 0..groups.len() {
        if !is_visited[group_pos] {
            paths.push(walk_path(
                &groups,
                &links,
                group_pos,
                GroupSide::Left,
                &mut is_visited,
            ));
        }
    }

    paths.sort_by_key(|x| x.steps[0].group_index);

    stats.derived_path_count = paths.len();
    stats.circular_path_count = paths.iter().filter(|x| x.is_circular).count();

    info!(
        "Linked {} of {} rearrangement groups into {} derived paths ({} circular)",
        stats.input_group_count - stats.unlinked_group_count,
        stats.input_group_count,
        stats.derived_path_count,
        stats.circular_path_count
    );

    (paths, stats)
}
