//! Count flow
//!
//! discovery → parse → per-file count → concordance filter.
//!
//! Every record is recounted from the file contents unless the configuration
//! trusts `-wc` counts, in which case pre-computed records at or below the
//! threshold keep the external count. Records above the threshold are always
//! recounted because their concordance needs the word map. `-awk` output
//! never carries a count and is always recounted.

use anyhow::Result;
use colored::Colorize;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::backends::discovery::discover;
use crate::backends::exec::ProcessExecutor;
use crate::backends::fs::LocalFs;
use crate::backends::parse::parse_output;
use crate::backends::Backends;
use crate::core::concordance::filter_concordance;
use crate::core::counter::count_reader;
use crate::core::model::{
    Config, CountReport, CountResult, ErrorResult, FileRecord, ResultSet, SkippedEntry, Timings,
};
use crate::core::render::{RenderConfig, Renderer};
use crate::core::util::elapsed_ms;

/// Exit status for a rejected request
pub const EXIT_INVALID_REQUEST: u8 = 2;

/// Unvalidated request, as received from the front end
#[derive(Debug, Clone)]
pub struct CountRequest {
    /// Operator root that a relative base path is resolved against
    pub root: PathBuf,
    pub mode: String,
    pub extension: String,
    pub base_path: PathBuf,
    pub threshold: u64,
    pub secondary_threshold: u64,
    pub trust_precomputed: bool,
}

impl CountRequest {
    pub fn into_config(self) -> Result<Config, ErrorResult> {
        Ok(Config::new(
            &self.mode,
            &self.extension,
            self.base_path,
            self.threshold,
            self.secondary_threshold,
        )?
        .with_trust_precomputed(self.trust_precomputed)
        .resolve_under(&self.root))
    }
}

/// Execution knobs that do not change the result
#[derive(Debug, Clone, Copy, Default)]
pub struct CountOptions {
    /// Worker threads for counting (0 = default pool); needs the `parallel` feature
    pub jobs: usize,
}

/// Validate `request` and count; an invalid request touches nothing
pub fn run_request(
    request: CountRequest,
    backends: &Backends,
    options: &CountOptions,
) -> Result<CountReport, ErrorResult> {
    let config = request.into_config()?;
    Ok(count_words(&config, backends, options))
}

/// Discover files for `config`, count them and attach concordances
pub fn count_words(config: &Config, backends: &Backends, options: &CountOptions) -> CountReport {
    let start = Instant::now();
    let discovery = discover(config, backends);
    let parsed = parse_output(&discovery.output, config.mode());
    let discovery_ms = elapsed_ms(start);

    let discovered = parsed.records.len();
    debug!(
        "{} discovered {} files in {}ms",
        config.mode(),
        discovered,
        discovery_ms
    );

    let start = Instant::now();
    let attempted = parsed
        .records
        .iter()
        .filter(|r| needs_count(r, config))
        .count();
    let outcomes = finalize_all(parsed.records, config, backends, options);
    let counting_ms = elapsed_ms(start);

    let mut records = ResultSet::new();
    let mut skipped = parsed.skipped;
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(entry) => {
                failed += 1;
                skipped.push(entry);
            }
        }
    }
    // only reads can fail here
    let counted = attempted - failed;

    CountReport {
        mode: config.mode(),
        records,
        skipped,
        warnings: discovery.warnings,
        discovered,
        counted,
        timings: Timings {
            discovery_ms,
            counting_ms,
        },
    }
}

/// Whether the file behind `record` has to be read
fn needs_count(record: &FileRecord, config: &Config) -> bool {
    if !config.mode().is_precomputed() || !config.trust_precomputed() {
        return true;
    }
    record.total_count > config.threshold()
}

/// Count one record, or explain why it was dropped
fn finalize(
    record: FileRecord,
    config: &Config,
    backends: &Backends,
) -> std::result::Result<FileRecord, SkippedEntry> {
    if !needs_count(&record, config) {
        return Ok(record);
    }

    let path = Path::new(&record.path);
    let tally = backends
        .reader
        .open(path)
        .and_then(count_reader)
        .map_err(|err| {
            warn!("skipping {}: {}", record.path, err);
            SkippedEntry::unreadable(record.path.as_str(), &err)
        })?;

    if config.mode().is_precomputed() && tally.total != record.total_count {
        debug!(
            "{}: wc reported {}, recounted {}",
            record.path, record.total_count, tally.total
        );
    }

    let words = filter_concordance(
        tally.total,
        tally.frequencies,
        config.threshold(),
        config.secondary_threshold(),
    );

    Ok(FileRecord {
        path: record.path,
        total_count: tally.total,
        words,
    })
}

#[cfg(not(feature = "parallel"))]
fn finalize_all(
    records: Vec<FileRecord>,
    config: &Config,
    backends: &Backends,
    options: &CountOptions,
) -> Vec<std::result::Result<FileRecord, SkippedEntry>> {
    if options.jobs > 1 {
        debug!("--jobs {} ignored: built without the parallel feature", options.jobs);
    }
    records
        .into_iter()
        .map(|record| finalize(record, config, backends))
        .collect()
}

/// Counts on a rayon pool; `collect` keeps discovery order
#[cfg(feature = "parallel")]
fn finalize_all(
    records: Vec<FileRecord>,
    config: &Config,
    backends: &Backends,
    options: &CountOptions,
) -> Vec<std::result::Result<FileRecord, SkippedEntry>> {
    use rayon::prelude::*;

    let run = || {
        records
            .into_par_iter()
            .map(|record| finalize(record, config, backends))
            .collect::<Vec<_>>()
    };

    if options.jobs == 0 {
        return run();
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs)
        .build()
    {
        Ok(pool) => pool.install(run),
        Err(err) => {
            warn!("could not build a {}-thread pool: {}", options.jobs, err);
            run()
        }
    }
}

/// Run the count command against the local machine.
///
/// Returns `false` when the request was rejected.
pub fn run_count(
    request: CountRequest,
    timeout: Option<std::time::Duration>,
    options: CountOptions,
    stats: bool,
    config: RenderConfig,
) -> Result<bool> {
    let executor = ProcessExecutor::new().with_timeout(timeout);
    let backends = Backends::new(&executor, &LocalFs, &LocalFs);

    let result = match run_request(request, &backends, &options) {
        Ok(report) => {
            info!(
                "{}: {} files, {} counted, {} skipped",
                report.mode,
                report.records.len(),
                report.counted,
                report.skipped.len()
            );
            if stats {
                eprint!("{}", format_stats(&report));
            }
            report.into_result()
        }
        Err(err) => CountResult::Error(err),
    };

    println!("{}", Renderer::with_config(config).render(&result));
    Ok(!result.is_error())
}

fn format_stats(report: &CountReport) -> String {
    let mut out = format!("{}\n", "Count Statistics:".bold());
    out.push_str(&format!("   Mode: {}\n", report.mode));
    out.push_str(&format!("   Discovered: {}\n", report.discovered));
    out.push_str(&format!("   Counted: {}\n", report.counted));
    out.push_str(&format!("   Returned: {}\n", report.records.len()));
    out.push_str(&format!(
        "   Time: {}ms (search {}ms | process {}ms)\n",
        report.timings.discovery_ms + report.timings.counting_ms,
        report.timings.discovery_ms,
        report.timings.counting_ms
    ));
    for entry in &report.skipped {
        out.push_str(&format!(
            "   {} {} ({:?}: {})\n",
            "skipped".yellow(),
            entry.path,
            entry.reason,
            entry.detail
        ));
    }
    for warning in &report.warnings {
        out.push_str(&format!("   {} {}\n", "warning".yellow(), warning));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::testing::{FakeExecutor, FakeFs};
    use crate::core::model::{Mode, SkipReason};
    use std::fs;
    use tempfile::tempdir;

    /// 1200 words: "the" ×60 plus 30 filler words ×38
    fn big_text() -> String {
        let mut words = vec!["the".to_string(); 60];
        for i in 0..1140 {
            let a = (b'a' + (i % 30 / 26) as u8) as char;
            let b = (b'a' + (i % 30 % 26) as u8) as char;
            words.push(format!("x{}{}", a, b));
        }
        words
            .chunks(12)
            .map(|line| line.join(" "))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn small_text() -> &'static str {
        "one two three four five\nsix seven eight nine ten\n"
    }

    fn request(mode: &str, base: &Path) -> CountRequest {
        CountRequest {
            root: PathBuf::from("/"),
            mode: mode.to_string(),
            extension: "txt".to_string(),
            base_path: base.to_path_buf(),
            threshold: 1000,
            secondary_threshold: 50,
            trust_precomputed: false,
        }
    }

    fn local_backends<'a>(executor: &'a FakeExecutor) -> Backends<'a> {
        Backends::new(executor, &LocalFs, &LocalFs)
    }

    #[test]
    fn test_big_text_fixture() {
        let tally = count_reader(std::io::Cursor::new(big_text())).unwrap();
        assert_eq!(tally.total, 1200);
        assert_eq!(tally.frequencies["the"], 60);
        assert!(tally
            .frequencies
            .iter()
            .all(|(w, c)| w == "the" || *c == 38));
    }

    #[test]
    fn test_traversal_scenario() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), big_text()).unwrap();
        fs::write(temp.path().join("b.txt"), small_text()).unwrap();
        fs::write(temp.path().join("c.md"), big_text()).unwrap();

        let executor = FakeExecutor::returning("");
        let report = run_request(
            request("traversal", temp.path()),
            &local_backends(&executor),
            &CountOptions::default(),
        )
        .unwrap();

        assert_eq!(report.records.len(), 2);
        let a = report
            .records
            .items
            .iter()
            .find(|r| r.path.ends_with("a.txt"))
            .unwrap();
        assert_eq!(a.total_count, 1200);
        let words = a.words.as_ref().unwrap();
        assert_eq!(words.get("the"), Some(&60));
        assert!(words.values().all(|c| *c >= 50));

        let b = report
            .records
            .items
            .iter()
            .find(|r| r.path.ends_with("b.txt"))
            .unwrap();
        assert_eq!(b.total_count, 10);
        assert!(b.words.is_none());
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn test_unknown_mode_touches_nothing() {
        let executor = FakeExecutor::returning("/srv/a.txt\n");
        let fs = FakeFs::with_files(&[("/srv/a.txt", "hello")]);
        let backends = Backends::new(&executor, &fs, &fs);

        let err = run_request(
            request("bogus", Path::new("/srv")),
            &backends,
            &CountOptions::default(),
        )
        .unwrap_err();

        assert!(err.error.contains("bogus"));
        assert!(executor.calls().is_empty());
        assert_eq!(fs.walk_calls(), 0);
        assert_eq!(fs.open_calls(), 0);
    }

    #[test]
    fn test_find_awk_recounts_prefiltered_paths() {
        let big = big_text();
        // awk already dropped the small file; the count it saw is gone
        let executor = FakeExecutor::returning("/srv/a.txt\n");
        let fs = FakeFs::with_files(&[("/srv/a.txt", big.as_str()), ("/srv/b.txt", small_text())]);
        let backends = Backends::new(&executor, &fs, &fs);

        let report = run_request(
            request("find-awk", Path::new("/srv")),
            &backends,
            &CountOptions::default(),
        )
        .unwrap();

        assert_eq!(report.records.len(), 1);
        let a = &report.records.items[0];
        assert_eq!(a.path, "/srv/a.txt");
        assert_eq!(a.total_count, 1200);
        assert_eq!(a.words.as_ref().unwrap()["the"], 60);

        // same answer as a plain find with full counting
        let find_executor = FakeExecutor::returning("/srv/a.txt\n/srv/b.txt\n");
        let find_backends = Backends::new(&find_executor, &fs, &fs);
        let full = run_request(
            request("find", Path::new("/srv")),
            &find_backends,
            &CountOptions::default(),
        )
        .unwrap();
        assert_eq!(full.records.get("/srv/a.txt"), Some(a));
    }

    #[test]
    fn test_find_and_find_wc_agree() {
        let big = big_text();
        let fs = FakeFs::with_files(&[
            ("/srv/a.txt", big.as_str()),
            ("/srv/b.txt", "don't co-ordinate"),
        ]);

        let find = FakeExecutor::returning("/srv/a.txt\n/srv/b.txt\n");
        // wc -w splits on whitespace only, so its counts differ
        let find_wc = FakeExecutor::returning("1200 /srv/a.txt\n2 /srv/b.txt\n1202 total\n");

        let plain = run_request(
            request("find", Path::new("/srv")),
            &Backends::new(&find, &fs, &fs),
            &CountOptions::default(),
        )
        .unwrap();
        let counted = run_request(
            request("find-wc", Path::new("/srv")),
            &Backends::new(&find_wc, &fs, &fs),
            &CountOptions::default(),
        )
        .unwrap();

        assert_eq!(plain.records, counted.records);
        assert_eq!(counted.records.get("/srv/b.txt").unwrap().total_count, 4);
    }

    #[test]
    fn test_trusted_wc_counts_skip_small_files() {
        let big = big_text();
        let fs = FakeFs::with_files(&[("/srv/a.txt", big.as_str()), ("/srv/b.txt", "don't")]);
        let executor = FakeExecutor::returning("1200 /srv/a.txt\n1 /srv/b.txt\n");
        let backends = Backends::new(&executor, &fs, &fs);

        let mut req = request("find-wc", Path::new("/srv"));
        req.trust_precomputed = true;
        let report = run_request(req, &backends, &CountOptions::default()).unwrap();

        assert_eq!(fs.open_calls(), 1);
        assert_eq!(report.counted, 1);
        let b = report.records.get("/srv/b.txt").unwrap();
        assert_eq!(b.total_count, 1);
        assert!(b.words.is_none());
        assert!(report.records.get("/srv/a.txt").unwrap().words.is_some());
    }

    #[test]
    fn test_trust_does_not_apply_to_awk_modes() {
        let fs = FakeFs::with_files(&[("/srv/a.txt", "alpha beta")]);
        let executor = FakeExecutor::returning("/srv/a.txt\n");
        let backends = Backends::new(&executor, &fs, &fs);

        let mut req = request("find-awk", Path::new("/srv"));
        req.trust_precomputed = true;
        let report = run_request(req, &backends, &CountOptions::default()).unwrap();

        assert_eq!(fs.open_calls(), 1);
        assert_eq!(report.records.items[0].total_count, 2);
    }

    #[test]
    fn test_unreadable_files_are_skipped_and_reported() {
        let fs = FakeFs::with_files(&[("/srv/a.txt", "alpha"), ("/srv/c.txt", "gamma delta")]);
        let executor = FakeExecutor::returning("/srv/a.txt\n/srv/gone.txt\n/srv/c.txt\n");
        let backends = Backends::new(&executor, &fs, &fs);

        let report = run_request(
            request("find", Path::new("/srv")),
            &backends,
            &CountOptions::default(),
        )
        .unwrap();

        let paths: Vec<_> = report.records.items.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/srv/a.txt", "/srv/c.txt"]);
        assert_eq!(report.discovered, 3);
        assert_eq!(report.counted, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, "/srv/gone.txt");
        assert_eq!(report.skipped[0].reason, SkipReason::Unreadable);
    }

    #[test]
    fn test_malformed_wc_lines_are_reported() {
        let fs = FakeFs::with_files(&[("/srv/a.txt", "alpha")]);
        let executor = FakeExecutor::returning("1 /srv/a.txt\nnot-a-count /srv/x.txt\n");
        let backends = Backends::new(&executor, &fs, &fs);

        let report = run_request(
            request("locate-wc", Path::new("/srv")),
            &backends,
            &CountOptions::default(),
        )
        .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::Malformed);
    }

    #[test]
    fn test_failed_discovery_is_an_empty_result() {
        let fs = FakeFs::default();
        let executor = FakeExecutor::failing();
        let backends = Backends::new(&executor, &fs, &fs);

        let report = run_request(
            request("locate", Path::new("/srv")),
            &backends,
            &CountOptions::default(),
        )
        .unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.into_result(), CountResult::Records(ResultSet::new()));
    }

    #[test]
    fn test_discovery_order_is_preserved() {
        let fs = FakeFs::with_files(&[
            ("/srv/a.txt", "a"),
            ("/srv/b.txt", "b b"),
            ("/srv/c.txt", "c c c"),
        ]);
        let executor = FakeExecutor::returning("/srv/c.txt\n/srv/a.txt\n/srv/b.txt\n");
        let backends = Backends::new(&executor, &fs, &fs);

        let report = count_words(
            &request("find", Path::new("/srv")).into_config().unwrap(),
            &backends,
            &CountOptions { jobs: 4 },
        );

        let counts: Vec<_> = report
            .records
            .items
            .iter()
            .map(|r| (r.path.as_str(), r.total_count))
            .collect();
        assert_eq!(
            counts,
            vec![("/srv/c.txt", 3), ("/srv/a.txt", 1), ("/srv/b.txt", 2)]
        );
    }

    #[test]
    fn test_stats_show_canonical_mode() {
        let fs = FakeFs::with_files(&[("/srv/a.txt", "alpha")]);
        let executor = FakeExecutor::returning("");
        let backends = Backends::new(&executor, &fs, &fs);

        let report = run_request(
            request("php-search", Path::new("/srv")),
            &backends,
            &CountOptions::default(),
        )
        .unwrap();

        assert_eq!(report.mode, Mode::Traversal);
        let stats = format_stats(&report);
        assert!(stats.contains("Mode: traversal"));
        assert!(!stats.contains("php-search"));
        assert!(stats.contains("Counted: 1"));
    }

    #[test]
    fn test_runs_are_idempotent() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), big_text()).unwrap();
        fs::write(temp.path().join("b.txt"), small_text()).unwrap();

        let executor = FakeExecutor::returning("");
        let run = || {
            let report = run_request(
                request("traversal", temp.path()),
                &local_backends(&executor),
                &CountOptions::default(),
            )
            .unwrap();
            serde_json::to_string(&report.into_result()).unwrap()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_exact_threshold_gets_no_concordance() {
        let fs = FakeFs::with_files(&[("/srv/a.txt", "w w w")]);
        let executor = FakeExecutor::returning("/srv/a.txt\n");
        let backends = Backends::new(&executor, &fs, &fs);

        let mut req = request("find", Path::new("/srv"));
        req.threshold = 3;
        req.secondary_threshold = 1;
        let report = run_request(req, &backends, &CountOptions::default()).unwrap();
        assert!(report.records.items[0].words.is_none());

        let mut req = request("find", Path::new("/srv"));
        req.threshold = 2;
        req.secondary_threshold = 1;
        let report = run_request(req, &backends, &CountOptions::default()).unwrap();
        assert_eq!(report.records.items[0].words.as_ref().unwrap()["w"], 3);
    }
}
