//! Unified Result Model
//!
//! Every discovery mode, whatever its raw output looks like, maps to these types
//! before counting and rendering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::core::paths::resolve_base;

/// Default primary threshold (word count a file must exceed to get a concordance)
pub const DEFAULT_THRESHOLD: u64 = 1000;

/// Default secondary threshold (occurrences a word needs to stay in a concordance)
pub const DEFAULT_SECONDARY_THRESHOLD: u64 = 50;

/// Errors raised while building a [`Config`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("incorrect mode or mode not found: '{0}'")]
    UnknownMode(String),

    #[error("invalid extension pattern '{0}': must not contain '/' or quotes")]
    InvalidExtension(String),

    #[error("base path must not be empty")]
    EmptyBasePath,
}

/// How candidate files are found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mechanism {
    Locate,
    Find,
    Traversal,
}

/// Discovery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Locate,
    LocateWc,
    LocateAwk,
    Find,
    FindWc,
    FindAwk,
    Traversal,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Locate,
        Mode::LocateWc,
        Mode::LocateAwk,
        Mode::Find,
        Mode::FindWc,
        Mode::FindAwk,
        Mode::Traversal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Locate => "locate",
            Mode::LocateWc => "locate-wc",
            Mode::LocateAwk => "locate-awk",
            Mode::Find => "find",
            Mode::FindWc => "find-wc",
            Mode::FindAwk => "find-awk",
            Mode::Traversal => "traversal",
        }
    }

    pub fn mechanism(&self) -> Mechanism {
        match self {
            Mode::Locate | Mode::LocateWc | Mode::LocateAwk => Mechanism::Locate,
            Mode::Find | Mode::FindWc | Mode::FindAwk => Mechanism::Find,
            Mode::Traversal => Mechanism::Traversal,
        }
    }

    /// Discovery output carries a usable `wc -w` count per path
    pub fn is_precomputed(&self) -> bool {
        matches!(self, Mode::LocateWc | Mode::FindWc)
    }

    /// Discovery already dropped files at or below the primary threshold
    pub fn is_prefiltered(&self) -> bool {
        matches!(self, Mode::LocateAwk | Mode::FindAwk)
    }

    /// One-line description used by `concord modes`
    pub fn describe(&self) -> &'static str {
        match self {
            Mode::Locate => "locate database lookup",
            Mode::LocateWc => "locate database lookup piped through wc -w",
            Mode::LocateAwk => "locate + wc -w, awk keeps paths above the threshold",
            Mode::Find => "live find scan",
            Mode::FindWc => "live find scan piped through wc -w",
            Mode::FindAwk => "find + wc -w, awk keeps paths above the threshold",
            Mode::Traversal => "in-process recursive directory walk",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locate" => Ok(Mode::Locate),
            "locate-wc" => Ok(Mode::LocateWc),
            "locate-awk" => Ok(Mode::LocateAwk),
            "find" => Ok(Mode::Find),
            "find-wc" => Ok(Mode::FindWc),
            "find-awk" => Ok(Mode::FindAwk),
            "traversal" | "php-search" => Ok(Mode::Traversal),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

/// Static facts about a mode, listed by `concord modes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModeInfo {
    pub mode: Mode,
    pub mechanism: Mechanism,
    pub precomputed: bool,
    pub prefiltered: bool,
    pub description: &'static str,
}

impl From<Mode> for ModeInfo {
    fn from(mode: Mode) -> Self {
        Self {
            mode,
            mechanism: mode.mechanism(),
            precomputed: mode.is_precomputed(),
            prefiltered: mode.is_prefiltered(),
            description: mode.describe(),
        }
    }
}

/// Which file extensions are selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionPattern {
    /// Every file, whatever its extension
    All,
    /// Files whose extension equals this string exactly (no leading dot)
    Ext(String),
}

impl ExtensionPattern {
    /// Shell glob for `find -name` / `locate`
    pub fn glob(&self) -> String {
        match self {
            ExtensionPattern::All => "*".to_string(),
            ExtensionPattern::Ext(ext) => format!("*.{}", ext),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            ExtensionPattern::All => true,
            ExtensionPattern::Ext(ext) => path
                .extension()
                .map(|e| e.to_string_lossy() == ext.as_str())
                .unwrap_or(false),
        }
    }
}

impl FromStr for ExtensionPattern {
    type Err = ConfigError;

    /// Accepts `txt`, `.txt`, `*.txt`; `*`, `*.*` and the empty string mean all.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if matches!(trimmed, "" | "*" | "*.*") {
            return Ok(ExtensionPattern::All);
        }

        let ext = trimmed
            .strip_prefix("*.")
            .or_else(|| trimmed.strip_prefix('.'))
            .unwrap_or(trimmed);

        if ext.is_empty() || ext.contains(['/', '\'', '"', '\\']) {
            return Err(ConfigError::InvalidExtension(s.to_string()));
        }

        Ok(ExtensionPattern::Ext(ext.to_string()))
    }
}

impl fmt::Display for ExtensionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob())
    }
}

/// Validated, immutable counting configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    mode: Mode,
    extension: ExtensionPattern,
    base_path: PathBuf,
    threshold: u64,
    secondary_threshold: u64,
    trust_precomputed: bool,
}

impl Config {
    /// Build a configuration, failing before any I/O if the mode or extension is invalid
    pub fn new(
        mode: &str,
        extension: &str,
        base_path: impl Into<PathBuf>,
        threshold: u64,
        secondary_threshold: u64,
    ) -> Result<Self, ConfigError> {
        let mode: Mode = mode.parse()?;
        let extension: ExtensionPattern = extension.parse()?;
        let base_path = base_path.into();
        if base_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBasePath);
        }

        Ok(Self {
            mode,
            extension,
            base_path,
            threshold,
            secondary_threshold,
            trust_precomputed: false,
        })
    }

    /// Keep `-wc` counts at or below the threshold instead of recounting those files
    pub fn with_trust_precomputed(mut self, trust: bool) -> Self {
        self.trust_precomputed = trust;
        self
    }

    /// Resolve a relative base path against the operator root
    pub fn resolve_under(mut self, root: &Path) -> Self {
        self.base_path = resolve_base(root, &self.base_path);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn extension(&self) -> &ExtensionPattern {
        &self.extension
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn secondary_threshold(&self) -> u64 {
        self.secondary_threshold
    }

    pub fn trust_precomputed(&self) -> bool {
        self.trust_precomputed
    }
}

/// Word counts for one discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,

    pub total_count: u64,

    /// Concordance, only present for files above the primary threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<BTreeMap<String, u64>>,
}

impl FileRecord {
    /// A record whose count is still to be computed
    pub fn pending(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            total_count: 0,
            words: None,
        }
    }

    /// A record carrying a count reported by discovery
    pub fn precomputed(path: impl Into<String>, total_count: u64) -> Self {
        Self {
            path: path.into(),
            total_count,
            words: None,
        }
    }
}

/// Ordered records, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    pub items: Vec<FileRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: FileRecord) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[allow(dead_code)]
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.items.iter().find(|r| r.path == path)
    }
}

impl IntoIterator for ResultSet {
    type Item = FileRecord;
    type IntoIter = std::vec::IntoIter<FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<FileRecord> for ResultSet {
    fn from_iter<T: IntoIterator<Item = FileRecord>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// Failure value returned instead of a result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

impl ErrorResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl From<ConfigError> for ErrorResult {
    fn from(err: ConfigError) -> Self {
        ErrorResult::new(err.to_string())
    }
}

/// Either the records or the reason there are none
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CountResult {
    Records(ResultSet),
    Error(ErrorResult),
}

impl CountResult {
    pub fn is_error(&self) -> bool {
        matches!(self, CountResult::Error(_))
    }
}

impl From<Result<ResultSet, ErrorResult>> for CountResult {
    fn from(result: Result<ResultSet, ErrorResult>) -> Self {
        match result {
            Ok(records) => CountResult::Records(records),
            Err(err) => CountResult::Error(err),
        }
    }
}

/// Why a discovered entry is missing from the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    /// The file could not be opened or read
    Unreadable,
    /// A `-wc` line without a leading count or a path
    Malformed,
}

/// An entry dropped during parsing or counting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub path: String,
    pub reason: SkipReason,
    pub detail: String,
}

impl SkippedEntry {
    pub fn unreadable(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self {
            path: path.into(),
            reason: SkipReason::Unreadable,
            detail: err.to_string(),
        }
    }

    pub fn malformed(line: impl Into<String>) -> Self {
        Self {
            path: line.into(),
            reason: SkipReason::Malformed,
            detail: "expected '<count> <path>'".to_string(),
        }
    }
}

/// Phase durations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub discovery_ms: u64,
    pub counting_ms: u64,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct CountReport {
    /// Canonical mode the run used
    pub mode: Mode,
    pub records: ResultSet,
    /// Entries dropped by the parser or the counter
    pub skipped: Vec<SkippedEntry>,
    /// Discovery degradation notes (failed/timed out commands)
    pub warnings: Vec<String>,
    /// Records produced by the parser, before counting
    pub discovered: usize,
    /// Records actually read from disk
    pub counted: usize,
    pub timings: Timings,
}

impl CountReport {
    pub fn into_result(self) -> CountResult {
        CountResult::Records(self.records)
    }
}
