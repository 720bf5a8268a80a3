//! Write rearrangement groups and merged calls
//!

use std::fs::File;
use std::io::{self, BufWriter, Write};

use camino::Utf8Path;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use unwrap::unwrap;

use crate::alignment_segment::{AlignmentSegment, get_strand_char};
use crate::breakpoint::Breakend;
use crate::chrom_list::ChromList;
use crate::globals::PROGRAM_NAME;
use crate::int_range::IntRange;
use crate::link_groups::DerivedPath;
use crate::merge_runs::MergedCall;
use crate::rearrangement_group::RearrangementGroup;

pub const GROUPS_TSV_FILENAME: &str = "groups.tsv";
pub const GROUPS_MESSAGEPACK_FILENAME: &str = "groups.mpack";
pub const MERGED_CALLS_TSV_FILENAME: &str = "merged.calls.tsv";
pub const LINKS_TSV_FILENAME: &str = "links.tsv";
const DEBUG_GROUPS_BED_FILENAME: &str = "debug.groups.bed";
const DEBUG_DISCARDED_SEGMENTS_FILENAME: &str = "debug.discarded_segments.tsv";

/// All rearrangement groups from one discover run, with the chromosome list needed to interpret them
///
#[derive(Deserialize, Serialize)]
pub struct DiscoverGroups {
    pub sample_name: String,
    pub chrom_list: ChromList,
    pub groups: Vec<RearrangementGroup>,
}

pub fn serialize_discover_groups(discover_dir: &Utf8Path, discover_groups: &DiscoverGroups) {
    let mut buf = Vec::new();
    unwrap!(
        discover_groups.serialize(&mut rmp_serde::Serializer::new(&mut buf)),
        "Unable to serialize rearrangement groups"
    );

    let filename = discover_dir.join(GROUPS_MESSAGEPACK_FILENAME);

    info!("Writing rearrangement groups to binary file: '{filename}'");

    unwrap!(
        std::fs::write(&filename, buf.as_slice()),
        "Unable to open and write rearrangement groups binary file: '{filename}'"
    );
}

pub fn deserialize_discover_groups(discover_dir: &Utf8Path) -> DiscoverGroups {
    let filename = discover_dir.join(GROUPS_MESSAGEPACK_FILENAME);
    let buf = unwrap!(
        std::fs::read(&filename),
        "Unable to open and read rearrangement groups binary file: '{filename}'"
    );
    let mut discover_groups: DiscoverGroups = unwrap!(
        rmp_serde::from_slice(&buf),
        "Unable to parse rearrangement groups binary file: '{filename}'"
    );
    discover_groups.chrom_list.rebuild_index();
    discover_groups
}

/// Label used for each derived chromosome path in link output
fn get_derived_path_id(path_index: usize) -> String {
    format!("{PROGRAM_NAME}:derived:{path_index}")
}

/// Label used for each merged call in tabular output and the supporting read names file
pub fn get_call_id(call_index: usize) -> String {
    format!("{PROGRAM_NAME}:call:{call_index}")
}

fn get_breakend_fields(chrom_list: &ChromList, breakend: &Breakend) -> String {
    format!(
        "{}\t{}\t{}",
        chrom_list.label(breakend.chrom_index),
        breakend.pos,
        get_strand_char(breakend.is_fwd_strand)
    )
}

fn get_range_field(range: &IntRange) -> String {
    format!("{}-{}", range.start, range.end)
}

fn write_groups_tsv_impl(
    f: &mut impl Write,
    chrom_list: &ChromList,
    sample_name: &str,
    groups: &[RearrangementGroup],
) -> io::Result<()> {
    writeln!(
        f,
        "#id\tleft_chrom\tleft_pos\tleft_strand\tright_chrom\tright_pos\tright_strand\tleft_range\tright_range\ttype\tsupport\tsource\tread_ids"
    )?;
    for group in groups {
        writeln!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            group.group_index,
            get_breakend_fields(chrom_list, &group.breakpoint.left),
            get_breakend_fields(chrom_list, &group.breakpoint.right),
            get_range_field(&group.left_range),
            get_range_field(&group.right_range),
            group.get_type(),
            group.support(),
            sample_name,
            group.read_ids.iter().join(","),
        )?;
    }
    Ok(())
}

/// Write groups in tabular format
///
/// Groups are expected to already be in sorted output order.
///
pub fn write_groups_tsv(
    output_dir: &Utf8Path,
    chrom_list: &ChromList,
    sample_name: &str,
    groups: &[RearrangementGroup],
) {
    let filename = output_dir.join(GROUPS_TSV_FILENAME);
    info!("Writing rearrangement groups to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create rearrangement groups file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    unwrap!(
        write_groups_tsv_impl(&mut f, chrom_list, sample_name, groups),
        "Unable to write rearrangement groups file: '{filename}'"
    );
}

fn write_merged_calls_tsv_impl(
    f: &mut impl Write,
    chrom_list: &ChromList,
    sample_names: &[&str],
    calls: &[MergedCall],
) -> io::Result<()> {
    write!(
        f,
        "#id\tleft_chrom\tleft_pos\tleft_strand\tright_chrom\tright_pos\tright_strand\tleft_range\tright_range\ttype\ttotal_support"
    )?;
    for sample_name in sample_names {
        write!(f, "\t{sample_name}.support")?;
    }
    write!(f, "\tfragmented")?;
    for sample_name in sample_names {
        write!(f, "\t{sample_name}.read_ids")?;
    }
    writeln!(f)?;

    for call in calls {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            get_call_id(call.call_index),
            get_breakend_fields(chrom_list, &call.breakpoint.left),
            get_breakend_fields(chrom_list, &call.breakpoint.right),
            get_range_field(&call.left_range),
            get_range_field(&call.right_range),
            call.get_type(),
            call.total_support(),
        )?;
        for sample_index in 0..sample_names.len() {
            write!(f, "\t{}", call.sample_support(sample_index))?;
        }
        write!(f, "\t{}", if call.is_fragmented { "yes" } else { "no" })?;
        for read_ids in call.sample_read_ids.iter().take(sample_names.len()) {
            let read_ids = if read_ids.is_empty() {
                ".".to_string()
            } else {
                read_ids.iter().join(",")
            };
            write!(f, "\t{read_ids}")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

/// Write merged calls in tabular format, with one support column and one read id column for each
/// sample in `sample_names`
///
pub fn write_merged_calls_tsv(
    output_dir: &Utf8Path,
    chrom_list: &ChromList,
    sample_names: &[&str],
    calls: &[MergedCall],
) {
    let filename = output_dir.join(MERGED_CALLS_TSV_FILENAME);
    info!("Writing merged calls to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create merged calls file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    unwrap!(
        write_merged_calls_tsv_impl(&mut f, chrom_list, sample_names, calls),
        "Unable to write merged calls file: '{filename}'"
    );
}

struct GroupBedRecord<'a> {
    chrom_index: usize,
    range: &'a IntRange,
    group: &'a RearrangementGroup,
    breakend_id: usize,
    mate: &'a Breakend,
}

fn write_debug_groups_bed_impl(
    f: &mut impl Write,
    chrom_list: &ChromList,
    groups: &[RearrangementGroup],
) -> io::Result<()> {
    let mut brecs = Vec::new();
    for group in groups {
        let bp = &group.breakpoint;
        brecs.push(GroupBedRecord {
            chrom_index: bp.left.chrom_index,
            range: &group.left_range,
            group,
            breakend_id: 1,
            mate: &bp.right,
        });
        brecs.push(GroupBedRecord {
            chrom_index: bp.right.chrom_index,
            range: &group.right_range,
            group,
            breakend_id: 2,
            mate: &bp.left,
        });
    }
    brecs.sort_by_key(|x| (x.chrom_index, x.range.start, x.range.end));

    writeln!(f, "#gffTags")?;
    for brec in brecs {
        writeln!(
            f,
            "{}\t{}\t{}\tName={};BreakendId={};Type={};Support={};Mate={}",
            chrom_list.label(brec.chrom_index),
            brec.range.start,
            brec.range.end,
            brec.group.group_index,
            brec.breakend_id,
            brec.group.get_type(),
            brec.group.support(),
            brec.mate.to_locus_str(chrom_list),
        )?;
    }
    Ok(())
}

/// Produce bed file of group breakends for debugging in IGV, this uses the IGV gffTags format to
/// get a formatted display of multiple key/value pairs in column #4
///
pub fn write_debug_groups_bed(
    output_dir: &Utf8Path,
    chrom_list: &ChromList,
    groups: &[RearrangementGroup],
) {
    let filename = output_dir.join(DEBUG_GROUPS_BED_FILENAME);
    info!("Writing rearrangement group debug bed file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create rearrangement group debug bed file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    unwrap!(
        write_debug_groups_bed_impl(&mut f, chrom_list, groups),
        "Unable to write rearrangement group debug bed file: '{filename}'"
    );
}

fn write_debug_discarded_segments_impl(
    f: &mut impl Write,
    chrom_list: &ChromList,
    segments: &[AlignmentSegment],
) -> io::Result<()> {
    writeln!(
        f,
        "#read_id\tread_start\tread_end\tstrand\tref_name\tref_start\tref_end\tscore"
    )?;
    for segment in segments
        .iter()
        .sorted_by(|a, b| (&a.read_id, &a.read_range).cmp(&(&b.read_id, &b.read_range)))
    {
        writeln!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            segment.read_id,
            segment.read_range.start,
            segment.read_range.end,
            segment.strand_char(),
            chrom_list.label(segment.chrom_index),
            segment.ref_range.start,
            segment.ref_range.end,
            segment.score,
        )?;
    }
    Ok(())
}

/// Write an audit table of alignment segments discarded during read chain construction
///
pub fn write_debug_discarded_segments(
    output_dir: &Utf8Path,
    chrom_list: &ChromList,
    segments: &[AlignmentSegment],
) {
    let filename = output_dir.join(DEBUG_DISCARDED_SEGMENTS_FILENAME);
    info!("Writing discarded alignment segments to debug file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create discarded alignment segments debug file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    unwrap!(
        write_debug_discarded_segments_impl(&mut f, chrom_list, segments),
        "Unable to write discarded alignment segments debug file: '{filename}'"
    );
}

fn write_links_tsv_impl(
    f: &mut impl Write,
    chrom_list: &ChromList,
    paths: &[DerivedPath],
) -> io::Result<()> {
    writeln!(
        f,
        "#derived_id\trank\tgroup_id\torientation\tentry\texit\tnext_segment\tcircular"
    )?;
    for (path_index, path) in paths.iter().enumerate() {
        let derived_id = get_derived_path_id(path_index);
        for (rank, step) in path.steps.iter().enumerate() {
            let next_segment = match &step.next_segment {
                Some(x) => format!(
                    "{}:{}",
                    chrom_list.label(x.chrom_index),
                    get_range_field(&x.range)
                ),
                None => ".".to_string(),
            };
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                derived_id,
                rank,
                step.group_index,
                get_strand_char(step.is_forward),
                step.entry.to_locus_str(chrom_list),
                step.exit.to_locus_str(chrom_list),
                next_segment,
                if path.is_circular { "yes" } else { "no" },
            )?;
        }
    }
    Ok(())
}

/// Write derived chromosome paths in tabular format, with one row per traversed group
///
pub fn write_links_tsv(output_dir: &Utf8Path, chrom_list: &ChromList, paths: &[DerivedPath]) {
    let filename = output_dir.join(LINKS_TSV_FILENAME);
    info!("Writing derived chromosome paths to file: '{filename}'");

    let f = unwrap!(
        File::create(&filename),
        "Unable to create derived chromosome paths file: '{filename}'"
    );
    let mut f = BufWriter::new(f);
    unwrap!(
        write_links_tsv_impl(&mut f, chrom_list, paths),
        "Unable to write derived chromosome paths file: '{filename}'"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::get_test_breakpoint;
    use crate::rearrangement_group::get_test_group;

    fn get_test_chrom_list() -> ChromList {
        let mut chrom_list = ChromList::default();
        chrom_list.add_chrom("chr1", None);
        chrom_list.add_chrom("chr2", None);
        chrom_list
    }

    #[test]
    fn test_write_groups_tsv() {
        let chrom_list = get_test_chrom_list();
        let mut group = get_test_group(
            get_test_breakpoint(0, 1100, true, 1, 500, false),
            &["r1", "r2", "r3"],
        );
        group.left_range = IntRange::from_pair(1100, 1101);
        group.right_range = IntRange::from_pair(480, 501);

        let mut buf = Vec::new();
        write_groups_tsv_impl(&mut buf, &chrom_list, "s1", &[group]).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#id\t"));
        assert_eq!(
            lines[1],
            "0\tchr1\t1100\t+\tchr2\t500\t-\t1100-1101\t480-501\tinter_chromosomal\t3\ts1\tr1,r2,r3"
        );
    }

    #[test]
    fn test_write_merged_calls_tsv() {
        let chrom_list = get_test_chrom_list();
        let call = MergedCall {
            call_index: 0,
            breakpoint: get_test_breakpoint(0, 1100, true, 1, 500, false),
            left_range: IntRange::from_pair(1090, 1111),
            right_range: IntRange::from_pair(500, 501),
            sample_read_ids: vec![vec!["r1".to_string()], Vec::new()],
            control_support: 0,
            is_fragmented: true,
        };

        let mut buf = Vec::new();
        write_merged_calls_tsv_impl(&mut buf, &chrom_list, &["A", "B"], &[call]).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\tA.support\tB.support\tfragmented\tA.read_ids\tB.read_ids"));
        assert_eq!(
            lines[1],
            "chainsplit:call:0\tchr1\t1100\t+\tchr2\t500\t-\t1090-1111\t500-501\tinter_chromosomal\t1\t1\t0\tyes\tr1\t."
        );
    }

    #[test]
    fn test_write_links_tsv() {
        let mut chrom_list = get_test_chrom_list();
        chrom_list.add_chrom("chr3", None);
        let mut groups = vec![
            get_test_group(get_test_breakpoint(0, 1000, true, 1, 2000, true), &["r1"]),
            get_test_group(get_test_breakpoint(1, 3000, true, 2, 5000, true), &["r2"]),
        ];
        groups[1].group_index = 1;
        let (paths, _) = crate::link_groups::link_groups(&groups, 10000);

        let mut buf = Vec::new();
        write_links_tsv_impl(&mut buf, &chrom_list, &paths).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("#derived_id\t"));
        assert_eq!(
            lines[1],
            "chainsplit:derived:0\t0\t0\t+\tchr1:1000+\tchr2:2000+\tchr2:2000-3000\tno"
        );
        assert_eq!(
            lines[2],
            "chainsplit:derived:0\t1\t1\t+\tchr2:3000+\tchr3:5000+\t.\tno"
        );
    }
}
