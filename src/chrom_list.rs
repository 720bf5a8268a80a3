//! Reference sequence names observed in the alignment input
//!

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ChromInfo {
    pub label: String,

    /// Sequence length, if the input format provides it
    pub length: Option<u64>,
}

/// Map of reference sequence names to the chrom_index values used throughout the pipeline
///
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ChromList {
    pub data: Vec<ChromInfo>,

    #[serde(skip)]
    pub label_to_index: HashMap<String, usize>,
}

impl ChromList {
    /// Get the index for `label`, adding a new chromosome entry if it hasn't been seen before
    ///
    /// If the entry exists and didn't have a length yet, the length is filled in from this call.
    ///
    pub fn add_chrom(&mut self, label: &str, length: Option<u64>) -> usize {
        if let Some(&chrom_index) = self.label_to_index.get(label) {
            let info = &mut self.data[chrom_index];
            if info.length.is_none() {
                info.length = length;
            }
            chrom_index
        } else {
            let chrom_index = self.data.len();
            self.data.push(ChromInfo {
                label: label.to_string(),
                length,
            });
            self.label_to_index.insert(label.to_string(), chrom_index);
            chrom_index
        }
    }

    pub fn label(&self, chrom_index: usize) -> &str {
        self.data[chrom_index].label.as_str()
    }

    /// Rebuild the label lookup, needed after deserialization
    pub fn rebuild_index(&mut self) {
        self.label_to_index = self
            .data
            .iter()
            .enumerate()
            .map(|(i, x)| (x.label.clone(), i))
            .collect();
    }

    /// Reorder chromosomes by label
    ///
    /// Breakpoint standardization depends on chrom_index order, so sorting by label makes the
    /// standardized form independent of the order in which reference names were encountered.
    ///
    /// Returns a map from each old chrom_index to its new value.
    ///
    pub fn sort_by_label(&mut self) -> Vec<usize> {
        let mut order = (0..self.data.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| self.data[a].label.cmp(&self.data[b].label));

        let mut index_map = vec![0; self.data.len()];
        for (new_index, &old_index) in order.iter().enumerate() {
            index_map[old_index] = new_index;
        }

        self.data = order.into_iter().map(|i| self.data[i].clone()).collect();
        self.rebuild_index();
        index_map
    }
}

/// Combine chromosome lists from several runs into one list sorted by label
///
/// Returns the merged list, and a map from each input list's chrom_index values to the merged
/// list's chrom_index values.
///
pub fn merge_chrom_lists(chrom_lists: &[&ChromList]) -> (ChromList, Vec<Vec<usize>>) {
    let mut merged = ChromList::default();
    for chrom_list in chrom_lists {
        for info in chrom_list.data.iter() {
            merged.add_chrom(&info.label, info.length);
        }
    }
    merged.sort_by_label();

    let index_maps = chrom_lists
        .iter()
        .map(|chrom_list| {
            chrom_list
                .data
                .iter()
                .map(|x| merged.label_to_index[&x.label])
                .collect()
        })
        .collect();
    (merged, index_maps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_label() {
        let mut chrom_list = ChromList::default();
        assert_eq!(chrom_list.add_chrom("chr2", None), 0);
        assert_eq!(chrom_list.add_chrom("chr1", Some(1000)), 1);
        assert_eq!(chrom_list.add_chrom("chr2", Some(500)), 0);
        assert_eq!(chrom_list.data[0].length, Some(500));

        let index_map = chrom_list.sort_by_label();
        assert_eq!(index_map, vec![1, 0]);
        assert_eq!(chrom_list.label(0), "chr1");
        assert_eq!(chrom_list.label_to_index["chr2"], 1);
    }

    #[test]
    fn test_merge_chrom_lists() {
        let mut cl1 = ChromList::default();
        cl1.add_chrom("chr3", None);
        cl1.add_chrom("chr1", None);
        let mut cl2 = ChromList::default();
        cl2.add_chrom("chr2", None);
        cl2.add_chrom("chr1", None);

        let (merged, index_maps) = merge_chrom_lists(&[&cl1, &cl2]);
        assert_eq!(merged.data.len(), 3);
        assert_eq!(index_maps[0], vec![2, 0]);
        assert_eq!(index_maps[1], vec![1, 0]);
    }
}
