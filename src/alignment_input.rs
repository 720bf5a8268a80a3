//! Parse alignment records from tabular text files
//!

use std::fs::File;
use std::io::{BufRead, BufReader};

use camino::Utf8Path;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use simple_error::{SimpleError, SimpleResult, bail, try_with};
use unwrap::unwrap;

use crate::alignment_segment::AlignmentSegment;
use crate::chrom_list::ChromList;
use crate::int_range::IntRange;
use crate::run_stats::InputStats;

/// Only this many malformed input lines are logged individually, the rest are only counted
const MAX_REPORTED_MALFORMED_LINES: usize = 10;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize, clap::ValueEnum)]
pub enum AlignmentFormat {
    /// LAST tabular alignment format, as produced by 'lastal -f TAB' or 'maf-convert tab'
    #[default]
    LastTab,

    /// Tab-separated columns: read_id, read_start, read_end, strand, ref_name, ref_start, ref_end, score
    Segments,
}

/// All alignment segments read from the input files of one run
pub struct AlignmentInput {
    pub chrom_list: ChromList,
    pub segments: Vec<AlignmentSegment>,
    pub stats: InputStats,
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], index: usize, label: &str) -> SimpleResult<T> {
    match fields[index].parse::<T>() {
        Ok(x) => Ok(x),
        Err(_) => bail!("Can't parse {} field value '{}'", label, fields[index]),
    }
}

fn parse_strand(field: &str) -> SimpleResult<bool> {
    match field {
        "+" => Ok(true),
        "-" => Ok(false),
        _ => bail!("Unexpected strand field value '{}'", field),
    }
}

/// Get the forward strand range of an alignment given its start and size on the aligned strand
///
fn get_forward_range(start: i64, aln_size: i64, is_fwd: bool, seq_size: u64) -> SimpleResult<IntRange> {
    let end = match start.checked_add(aln_size) {
        Some(x) => x,
        None => bail!("Alignment end overflows for start {} and size {}", start, aln_size),
    };
    let mut range = IntRange::from_pair(start, end);
    if !is_fwd {
        let seq_size = match i64::try_from(seq_size) {
            Ok(x) if start >= 0 && end <= x => x,
            _ => bail!(
                "Alignment range {}-{} is outside of sequence size {}",
                start,
                end,
                seq_size
            ),
        };
        range.reverse(seq_size);
    }
    Ok(range)
}

/// Parse one line of LAST tabular alignment output
///
/// Columns are: score, name1, start1, alnSize1, strand1, seqSize1, name2, start2, alnSize2,
/// strand2, seqSize2, blocks, followed by optional fields. Sequence 1 is the reference and
/// sequence 2 is the read. Start coordinates on a '-' strand are relative to the reverse strand,
/// and are converted to forward strand coordinates here.
///
pub fn parse_last_tab_line(chrom_list: &mut ChromList, line: &str) -> SimpleResult<AlignmentSegment> {
    let fields = line.split('\t').collect::<Vec<_>>();
    if fields.len() < 11 {
        bail!(
            "Expected at least 11 fields in LAST tabular record, found {}",
            fields.len()
        );
    }

    let score = parse_field::<i64>(&fields, 0, "score")?;
    let ref_name = fields[1];
    let ref_start = parse_field::<i64>(&fields, 2, "reference start")?;
    let ref_aln_size = parse_field::<i64>(&fields, 3, "reference alignment size")?;
    let ref_fwd = parse_strand(fields[4])?;
    let ref_size = parse_field::<u64>(&fields, 5, "reference sequence size")?;
    let read_id = fields[6];
    let read_start = parse_field::<i64>(&fields, 7, "read start")?;
    let read_aln_size = parse_field::<i64>(&fields, 8, "read alignment size")?;
    let read_fwd = parse_strand(fields[9])?;
    let read_size = parse_field::<u64>(&fields, 10, "read sequence size")?;

    let ref_range = get_forward_range(ref_start, ref_aln_size, ref_fwd, ref_size)?;
    let read_range = get_forward_range(read_start, read_aln_size, read_fwd, read_size)?;

    let chrom_index = chrom_list.add_chrom(ref_name, Some(ref_size));
    Ok(AlignmentSegment {
        read_id: read_id.to_string(),
        read_range,
        is_fwd_strand: ref_fwd == read_fwd,
        chrom_index,
        ref_range,
        score,
    })
}

/// Parse one line of the simple segment table format
///
pub fn parse_segment_table_line(
    chrom_list: &mut ChromList,
    line: &str,
) -> SimpleResult<AlignmentSegment> {
    let fields = line.split('\t').collect::<Vec<_>>();
    if fields.len() != 8 {
        bail!(
            "Expected 8 fields in alignment segment record, found {}",
            fields.len()
        );
    }

    let read_start = parse_field::<i64>(&fields, 1, "read start")?;
    let read_end = parse_field::<i64>(&fields, 2, "read end")?;
    let is_fwd_strand = parse_strand(fields[3])?;
    let ref_start = parse_field::<i64>(&fields, 5, "reference start")?;
    let ref_end = parse_field::<i64>(&fields, 6, "reference end")?;
    let score = parse_field::<i64>(&fields, 7, "score")?;

    let chrom_index = chrom_list.add_chrom(fields[4], None);
    Ok(AlignmentSegment {
        read_id: fields[0].to_string(),
        read_range: IntRange::from_pair(read_start, read_end),
        is_fwd_strand,
        chrom_index,
        ref_range: IntRange::from_pair(ref_start, ref_end),
        score,
    })
}

/// Open a text file for reading, transparently decompressing gzip input
///
fn open_text_reader(filename: &Utf8Path) -> SimpleResult<Box<dyn BufRead>> {
    let file = try_with!(
        File::open(filename),
        "Unable to open alignment file: '{}'",
        filename
    );
    let reader: Box<dyn BufRead> = if filename.extension() == Some("gz") {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Read alignment records from `reader` into `input`
///
/// Lines which can't be parsed, including lines which are not valid UTF-8, are logged and skipped.
/// Blank lines and lines starting with '#' are ignored.
///
fn read_alignment_records(
    mut reader: impl BufRead,
    source_label: &str,
    format: AlignmentFormat,
    input: &mut AlignmentInput,
) -> SimpleResult<()> {
    let parse_line = match format {
        AlignmentFormat::LastTab => parse_last_tab_line,
        AlignmentFormat::Segments => parse_segment_table_line,
    };

    let mut buf = Vec::new();
    let mut line_index = 0;
    loop {
        buf.clear();
        let read_size = try_with!(
            reader.read_until(b'\n', &mut buf),
            "Failed to read line from alignment file '{}'",
            source_label
        );
        if read_size == 0 {
            break;
        }
        line_index += 1;

        let parse_result = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim_end();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                parse_line(&mut input.chrom_list, line)
            }
            Err(e) => Err(SimpleError::new(format!("Invalid UTF-8 in record: {e}"))),
        };

        input.stats.record_count += 1;
        match parse_result {
            Ok(segment) => {
                input.segments.push(segment);
            }
            Err(msg) => {
                input.stats.unparsable_record_count += 1;
                if input.stats.unparsable_record_count <= MAX_REPORTED_MALFORMED_LINES {
                    warn!(
                        "Skipping malformed alignment record at '{source_label}' line {line_index}: {msg}"
                    );
                }
            }
        }
    }
    Ok(())
}

/// Read all alignment segments from the input files of one run
///
/// The chromosome list of the result is sorted by label, and all segment chrom_index values are
/// updated to match.
///
pub fn read_alignment_files(filenames: &[String], format: AlignmentFormat) -> AlignmentInput {
    let mut input = AlignmentInput {
        chrom_list: ChromList::default(),
        segments: Vec::new(),
        stats: InputStats::default(),
    };

    for filename in filenames {
        let filename = Utf8Path::new(filename);
        info!("Reading alignment records from file: '{filename}'");
        let reader = unwrap!(open_text_reader(filename), "Can't read alignment file");
        unwrap!(
            read_alignment_records(reader, filename.as_str(), format, &mut input),
            "Can't read alignment file"
        );
    }

    if input.stats.unparsable_record_count > MAX_REPORTED_MALFORMED_LINES {
        warn!(
            "Skipped {} malformed alignment records in total",
            input.stats.unparsable_record_count
        );
    }

    let index_map = input.chrom_list.sort_by_label();
    for segment in input.segments.iter_mut() {
        segment.chrom_index = index_map[segment.chrom_index];
    }

    info!(
        "Read {} alignment segments on {} reference sequences",
        input.segments.len(),
        input.chrom_list.data.len()
    );

    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_last_tab_line() {
        let mut chrom_list = ChromList::default();

        let line = "3720\tchr7\t1000\t100\t+\t159345973\tread1\t0\t100\t+\t5000\t100";
        let seg = parse_last_tab_line(&mut chrom_list, line).unwrap();
        assert_eq!(seg.read_id, "read1");
        assert_eq!(seg.read_range, IntRange::from_pair(0, 100));
        assert_eq!(seg.ref_range, IntRange::from_pair(1000, 1100));
        assert!(seg.is_fwd_strand);
        assert_eq!(seg.score, 3720);
        assert_eq!(chrom_list.data[seg.chrom_index].length, Some(159345973));

        // Reverse strand read coordinates are converted to the forward strand:
        let line = "500\tchr7\t2000\t50\t+\t159345973\tread1\t10\t50\t-\t5000\t50\tEG2=0\tE=0";
        let seg = parse_last_tab_line(&mut chrom_list, line).unwrap();
        assert_eq!(seg.read_range, IntRange::from_pair(4940, 4990));
        assert_eq!(seg.ref_range, IntRange::from_pair(2000, 2050));
        assert!(!seg.is_fwd_strand);
        assert_eq!(chrom_list.data.len(), 1);
    }

    #[test]
    fn test_parse_malformed_last_tab_line() {
        let mut chrom_list = ChromList::default();
        assert!(parse_last_tab_line(&mut chrom_list, "3720\tchr7\t1000").is_err());

        let line = "3720\tchr7\tx1000\t100\t+\t159345973\tread1\t0\t100\t+\t5000\t100";
        assert!(parse_last_tab_line(&mut chrom_list, line).is_err());

        let line = "3720\tchr7\t1000\t100\t*\t159345973\tread1\t0\t100\t+\t5000\t100";
        assert!(parse_last_tab_line(&mut chrom_list, line).is_err());
    }

    #[test]
    fn test_parse_segment_table_line() {
        let mut chrom_list = ChromList::default();
        let seg = parse_segment_table_line(&mut chrom_list, "r1\t100\t200\t-\tchr2\t500\t600\t80")
            .unwrap();
        assert_eq!(seg.read_range, IntRange::from_pair(100, 200));
        assert_eq!(seg.ref_range, IntRange::from_pair(500, 600));
        assert!(!seg.is_fwd_strand);
        assert_eq!(chrom_list.label(seg.chrom_index), "chr2");

        assert!(parse_segment_table_line(&mut chrom_list, "r1\t100\t200\t-\tchr2\t500").is_err());
    }

    #[test]
    fn test_read_alignment_records() {
        let text = "# comment\n\
            r1\t0\t100\t+\tchr2\t1000\t1100\t90\n\
            \n\
            r1\t100\t200\t+\tchr1\t5000\t5100\t90\n\
            r2\tbad\t200\t+\tchr1\t5000\t5100\t90\n";
        let mut input = AlignmentInput {
            chrom_list: ChromList::default(),
            segments: Vec::new(),
            stats: InputStats::default(),
        };
        read_alignment_records(
            text.as_bytes(),
            "test",
            AlignmentFormat::Segments,
            &mut input,
        )
        .unwrap();
        assert_eq!(input.stats.record_count, 3);
        assert_eq!(input.stats.unparsable_record_count, 1);
        assert_eq!(input.segments.len(), 2);
    }

    #[test]
    fn test_read_invalid_utf8_record() {
        let mut text = b"r1\t0\t100\t+\tchr1\t1000\t1100\t90\n".to_vec();
        text.extend_from_slice(b"r2\t0\t100\t+\tchr\xff\t1000\t1100\t90\n");
        text.extend_from_slice(b"r3\t0\t100\t+\tchr1\t2000\t2100\t90\n");
        let mut input = AlignmentInput {
            chrom_list: ChromList::default(),
            segments: Vec::new(),
            stats: InputStats::default(),
        };
        read_alignment_records(
            text.as_slice(),
            "test",
            AlignmentFormat::Segments,
            &mut input,
        )
        .unwrap();
        assert_eq!(input.stats.record_count, 3);
        assert_eq!(input.stats.unparsable_record_count, 1);
        assert_eq!(input.segments.len(), 2);
        assert_eq!(input.segments[1].read_id, "r3");
    }

    #[test]
    fn test_parse_last_tab_line_overflow() {
        let mut chrom_list = ChromList::default();

        let line = "3720\tchr7\t9223372036854775807\t100\t+\t159345973\tread1\t0\t100\t+\t5000\t100";
        assert!(parse_last_tab_line(&mut chrom_list, line).is_err());

        let line = "3720\tchr7\t1000\t100\t+\t159345973\tread1\t9223372036854775800\t100\t-\t5000\t100";
        assert!(parse_last_tab_line(&mut chrom_list, line).is_err());

        // Reverse strand alignment extending past the end of the read
        let line = "3720\tchr7\t1000\t100\t+\t159345973\tread1\t4950\t100\t-\t5000\t100";
        assert!(parse_last_tab_line(&mut chrom_list, line).is_err());
        assert!(chrom_list.data.is_empty());
    }
}
