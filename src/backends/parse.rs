//! Discovery output parser
//!
//! Normalizes every mode's raw output into [`FileRecord`]s. `-wc` lines carry a
//! leading count; all other modes emit bare paths and the count is left at 0.

use log::warn;

use crate::core::model::{FileRecord, Mode, SkippedEntry};

/// `wc` prints this as the path of its summary line
const WC_TOTAL: &str = "total";

/// Parsed records, in discovery order, plus lines that could not be used
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    pub records: Vec<FileRecord>,
    pub skipped: Vec<SkippedEntry>,
}

/// Parse raw discovery output for `mode`
pub fn parse_output(output: &str, mode: Mode) -> Parsed {
    let mut parsed = Parsed::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if !mode.is_precomputed() {
            if line != WC_TOTAL {
                parsed.records.push(FileRecord::pending(line));
            }
            continue;
        }

        match split_counted(line) {
            Some((_, WC_TOTAL)) => {}
            Some((count, path)) => parsed.records.push(FileRecord::precomputed(path, count)),
            None => {
                warn!("skipping malformed {} line: {:?}", mode, line);
                parsed.skipped.push(SkippedEntry::malformed(line));
            }
        }
    }

    parsed
}

/// Split `<count><whitespace><path>` at the first whitespace run
fn split_counted(line: &str) -> Option<(u64, &str)> {
    let (count, rest) = line.split_once(char::is_whitespace)?;
    let count = count.parse().ok()?;
    let path = rest.trim_start();
    if path.is_empty() {
        None
    } else {
        Some((count, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::SkipReason;

    #[test]
    fn test_bare_paths() {
        let parsed = parse_output("/a/x.txt\n\n  /a/y.txt  \n", Mode::Find);
        assert_eq!(
            parsed.records,
            vec![FileRecord::pending("/a/x.txt"), FileRecord::pending("/a/y.txt")]
        );
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_wc_lines_keep_counts_and_drop_total() {
        let output = "  1200 /a/x.txt\n    10 /a/y.txt\n  1210 total\n";
        let parsed = parse_output(output, Mode::FindWc);
        assert_eq!(
            parsed.records,
            vec![
                FileRecord::precomputed("/a/x.txt", 1200),
                FileRecord::precomputed("/a/y.txt", 10),
            ]
        );
    }

    #[test]
    fn test_wc_path_with_spaces() {
        let parsed = parse_output("7 /a/my notes.txt", Mode::LocateWc);
        assert_eq!(parsed.records[0].path, "/a/my notes.txt");
        assert_eq!(parsed.records[0].total_count, 7);
    }

    #[test]
    fn test_wc_tab_separator() {
        let parsed = parse_output("7\t/a/x.txt", Mode::FindWc);
        assert_eq!(parsed.records, vec![FileRecord::precomputed("/a/x.txt", 7)]);
    }

    #[test]
    fn test_malformed_wc_lines_are_skipped_individually() {
        let output = "12 /a/ok.txt\nwc: /a/gone.txt: No such file\n42\n3 /a/also-ok.txt\n";
        let parsed = parse_output(output, Mode::FindWc);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped.len(), 2);
        assert!(parsed
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::Malformed));
        assert_eq!(parsed.skipped[1].path, "42");
    }

    #[test]
    fn test_awk_output_is_bare_paths() {
        let parsed = parse_output("/a/big.txt\n", Mode::FindAwk);
        assert_eq!(parsed.records, vec![FileRecord::pending("/a/big.txt")]);
    }

    #[test]
    fn test_empty_output() {
        assert_eq!(parse_output("", Mode::Locate), Parsed::default());
        assert_eq!(parse_output("\n\n", Mode::LocateWc), Parsed::default());
    }
}
