use std::collections::BTreeMap;
use std::io::Write;

use camino::Utf8Path;
use flate2::{Compression, write::GzEncoder};
use log::info;
use unwrap::unwrap;

use super::MergedCall;
use crate::group_output::get_call_id;

pub const SUPPORTING_READS_FILENAME: &str = "supporting_reads.json.gz";

/// Key on sample name
type CallSupportingReadNames = BTreeMap<String, Vec<String>>;

/// Key on the call id
type SupportingReadNames = BTreeMap<String, CallSupportingReadNames>;

fn get_supporting_read_names_from_calls(
    sample_names: &[&str],
    calls: &[MergedCall],
) -> SupportingReadNames {
    let mut supporting_read_names = SupportingReadNames::default();
    for call in calls {
        assert_eq!(call.sample_read_ids.len(), sample_names.len());
        let call_read_names = sample_names
            .iter()
            .zip(call.sample_read_ids.iter())
            .filter(|(_, read_ids)| !read_ids.is_empty())
            .map(|(sample_name, read_ids)| (sample_name.to_string(), read_ids.clone()))
            .collect();
        supporting_read_names.insert(get_call_id(call.call_index), call_read_names);
    }
    supporting_read_names
}

fn write_supporting_read_names_file(
    output_dir: &Utf8Path,
    supporting_read_names: &SupportingReadNames,
) {
    let filename = output_dir.join(SUPPORTING_READS_FILENAME);

    info!("Writing supporting read names to file: '{filename}'");

    let fp = unwrap!(
        std::fs::File::create(&filename),
        "Unable to create supporting read names json file: '{filename}'"
    );

    let srn_string = unwrap!(
        serde_json::to_string_pretty(supporting_read_names),
        "Failed to serialize supporting read names"
    );

    let mut encoder = GzEncoder::new(fp, Compression::default());
    unwrap!(
        encoder.write_all(srn_string.as_bytes()),
        "Unable to write supporting read names json file: '{filename}'"
    );
    unwrap!(
        encoder.finish(),
        "Unable to write supporting read names json file: '{filename}'"
    );
}

/// Write supporting read list for each call
pub fn write_supporting_read_names(
    output_dir: &Utf8Path,
    sample_names: &[&str],
    calls: &[MergedCall],
) {
    let supporting_read_names = get_supporting_read_names_from_calls(sample_names, calls);
    write_supporting_read_names_file(output_dir, &supporting_read_names);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::get_test_breakpoint;
    use crate::int_range::IntRange;

    #[test]
    fn test_get_supporting_read_names_from_calls() {
        let call = MergedCall {
            call_index: 3,
            breakpoint: get_test_breakpoint(0, 1000, true, 1, 500, false),
            left_range: IntRange::from_pair(1000, 1001),
            right_range: IntRange::from_pair(500, 501),
            sample_read_ids: vec![vec!["r1".to_string(), "r2".to_string()], Vec::new()],
            control_support: 0,
            is_fragmented: false,
        };
        let srn = get_supporting_read_names_from_calls(&["A", "B"], &[call]);
        assert_eq!(srn.len(), 1);
        let call_srn = &srn["chainsplit:call:3"];
        assert_eq!(call_srn.len(), 1);
        assert_eq!(call_srn["A"], vec!["r1", "r2"]);
    }
}
