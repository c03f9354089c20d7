//! Word tokenizer
//!
//! A word is a maximal run of alphabetic characters. Digits, punctuation and
//! whitespace are boundaries and never part of a token. Tokens keep their exact
//! text: no case folding, no stemming.

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Alphabetic}+").expect("Invalid WORD_RE regex"));

/// Iterate over the words of a line, in order
pub fn tokenize(line: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(line).map(|m| m.as_str())
}
