//! Concordance filter
//!
//! Only files above the primary threshold get a concordance, and only words
//! reaching the secondary threshold stay in it.

use std::collections::{BTreeMap, HashMap};

/// Keep the frequent words of a large file.
///
/// Returns `None` when `total` is at or below `threshold`, or when no word
/// reaches `secondary_threshold`; never an empty map.
pub fn filter_concordance(
    total: u64,
    frequencies: HashMap<String, u64>,
    threshold: u64,
    secondary_threshold: u64,
) -> Option<BTreeMap<String, u64>> {
    if total <= threshold {
        return None;
    }

    let kept: BTreeMap<String, u64> = frequencies
        .into_iter()
        .filter(|(_, count)| *count >= secondary_threshold)
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}
