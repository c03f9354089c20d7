//! Path normalization utilities
//!
//! The base path is resolved against the operator root; emitted paths keep the
//! shape discovery produced them in.

use std::path::{Path, PathBuf};

/// Normalize a path to use '/' as separator (for cross-platform consistency)
pub fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Resolve `base` against `root`; absolute bases are kept as given.
///
/// The result is canonicalized when it exists so `locate` patterns match the
/// absolute paths stored in its database.
pub fn resolve_base(root: &Path, base: &Path) -> PathBuf {
    let joined = if base.is_absolute() {
        base.to_path_buf()
    } else {
        root.join(base)
    };
    joined.canonicalize().unwrap_or(joined)
}

/// Base path as a `locate` pattern prefix, without trailing separators.
///
/// The filesystem root becomes the empty string so `{base}/{glob}` stays `/{glob}`.
pub fn pattern_base(base: &Path) -> String {
    normalize_path(base).trim_end_matches('/').to_string()
}
