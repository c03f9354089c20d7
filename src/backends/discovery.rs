//! File discovery
//!
//! Turns a [`Config`] into a raw, newline-separated list of candidate files.
//! The `locate` and `find` families run a shell pipeline; `traversal` walks the
//! tree in-process and emits the same one-path-per-line shape.
//!
//! # Output shapes
//!
//! - `locate`, `find`, `traversal`: `<path>`
//! - `locate-wc`, `find-wc`: `<count> <path>` (plus `wc` summary lines)
//! - `locate-awk`, `find-awk`: `<path>`, only files above the threshold
//!
//! `locate` reads a prebuilt database, so its results may lag the filesystem.

use log::{debug, warn};

use crate::backends::Backends;
use crate::core::model::{Config, Mechanism, Mode};
use crate::core::paths::{normalize_path, pattern_base};
use crate::core::util::shell_quote;

/// Raw discovery output plus any degradation notes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub output: String,
    pub warnings: Vec<String>,
}

/// Build the shell pipeline for an external mode; `None` for `traversal`
pub fn shell_pipeline(config: &Config) -> Option<String> {
    let glob = config.extension().glob();
    let mode = config.mode();

    let source = match mode.mechanism() {
        Mechanism::Locate => {
            let pattern = shell_quote(&format!("{}/{}", pattern_base(config.base_path()), glob));
            if mode == Mode::Locate {
                format!("locate -q {}", pattern)
            } else {
                format!("locate -0 -q {} | xargs -0 -r wc -w", pattern)
            }
        }
        Mechanism::Find => {
            let base = shell_quote(&normalize_path(config.base_path()));
            let glob = shell_quote(&glob);
            if mode == Mode::Find {
                format!("find {} -type f -name {}", base, glob)
            } else {
                format!(
                    "find {} -type f -name {} -print0 | wc -w --files0-from=-",
                    base, glob
                )
            }
        }
        Mechanism::Traversal => return None,
    };

    if mode.is_prefiltered() {
        Some(format!("{} | {}", source, awk_filter(config.threshold())))
    } else {
        Some(source)
    }
}

/// awk program printing the path of every `wc` line whose count exceeds `threshold`
fn awk_filter(threshold: u64) -> String {
    format!(
        r#"awk -v t={} '{{ n = $1; sub(/^[[:space:]]*[0-9]+[[:space:]]+/, ""); if (n + 0 > t + 0 && $0 != "total") print }}'"#,
        threshold
    )
}

/// Run the discovery step for `config`
pub fn discover(config: &Config, backends: &Backends) -> Discovery {
    match shell_pipeline(config) {
        Some(script) => run_pipeline(config.mode(), &script, backends),
        None => traverse(config, backends),
    }
}

fn run_pipeline(mode: Mode, script: &str, backends: &Backends) -> Discovery {
    debug!("{} discovery: sh -c {}", mode, script);

    let args = vec!["-c".to_string(), script.to_string()];
    match backends.executor.execute("sh", &args) {
        Ok(output) => {
            let mut warnings = Vec::new();
            if !output.success {
                let code = output
                    .exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                let stderr = output.stderr.lines().next().unwrap_or("").trim();
                let message = if stderr.is_empty() {
                    format!("{} discovery exited with status {}", mode, code)
                } else {
                    format!("{} discovery exited with status {}: {}", mode, code, stderr)
                };
                warn!("{}", message);
                warnings.push(message);
            }
            Discovery {
                output: output.stdout,
                warnings,
            }
        }
        Err(err) => {
            let message = format!("{} discovery failed: {}", mode, err);
            warn!("{}", message);
            Discovery {
                output: String::new(),
                warnings: vec![message],
            }
        }
    }
}

fn traverse(config: &Config, backends: &Backends) -> Discovery {
    debug!("traversal discovery under {}", config.base_path().display());

    let extension = config.extension();
    let paths: Vec<String> = backends
        .walker
        .walk(config.base_path())
        .filter(|path| extension.matches(path))
        .map(|path| normalize_path(&path))
        .collect();

    Discovery {
        output: paths.join("\n"),
        warnings: Vec::new(),
    }
}
