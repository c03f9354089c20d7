//! Word counter
//!
//! Streams a reader line by line and tallies words. Lines that are not valid
//! UTF-8 are decoded lossily, so a stray byte splits a word instead of failing
//! the whole file.

use std::collections::HashMap;
use std::io::{self, BufRead};

use crate::core::tokenizer::tokenize;

/// Running word totals for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTally {
    pub total: u64,
    pub frequencies: HashMap<String, u64>,
}

impl WordTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize a line and add its words
    pub fn add_line(&mut self, line: &str) {
        for word in tokenize(line) {
            self.total += 1;
            match self.frequencies.get_mut(word) {
                Some(count) => *count += 1,
                None => {
                    self.frequencies.insert(word.to_string(), 1);
                }
            }
        }
    }
}

/// Count every word readable from `reader`
pub fn count_reader<R: BufRead>(mut reader: R) -> io::Result<WordTally> {
    let mut tally = WordTally::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        tally.add_line(&String::from_utf8_lossy(&buf));
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_counts_total_and_frequencies() {
        let tally = count_reader(Cursor::new("the cat\nthe dog, the end.\n")).unwrap();
        assert_eq!(tally.total, 6);
        assert_eq!(tally.frequencies["the"], 3);
        assert_eq!(tally.frequencies["cat"], 1);
        assert_eq!(tally.frequencies.len(), 4);
    }

    #[test]
    fn test_case_sensitive_keys() {
        let tally = count_reader(Cursor::new("Word word WORD word")).unwrap();
        assert_eq!(tally.total, 4);
        assert_eq!(tally.frequencies["word"], 2);
        assert_eq!(tally.frequencies["Word"], 1);
        assert_eq!(tally.frequencies["WORD"], 1);
    }

    #[test]
    fn test_last_line_without_newline() {
        let tally = count_reader(Cursor::new("alpha\nbeta")).unwrap();
        assert_eq!(tally.total, 2);
    }

    #[test]
    fn test_empty_input() {
        let tally = count_reader(Cursor::new("")).unwrap();
        assert_eq!(tally, WordTally::new());
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let bytes: &[u8] = b"abc\xffdef ghi\n";
        let tally = count_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(tally.total, 3);
        assert!(tally.frequencies.contains_key("abc"));
        assert!(tally.frequencies.contains_key("def"));
    }

    #[test]
    fn test_crlf_lines() {
        let tally = count_reader(Cursor::new("one two\r\nthree\r\n")).unwrap();
        assert_eq!(tally.total, 3);
        assert!(tally.frequencies.contains_key("two"));
    }
}
