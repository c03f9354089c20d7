//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::core::model::{ModeInfo, DEFAULT_SECONDARY_THRESHOLD, DEFAULT_THRESHOLD};
use crate::core::model::Mode;
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::flows::count::{CountOptions, CountRequest, EXIT_INVALID_REQUEST};

/// concord - count words in discovered files and build concordances for large ones.
#[derive(Parser, Debug)]
#[command(name = "concord")]
#[command(
    author,
    version,
    about,
    long_about = r#"concord finds files of one extension under a base path, counts their words,
and attaches a concordance (word -> occurrences) to files above a threshold.

Files can be discovered with locate, find (optionally piped through wc/awk),
or an in-process directory walk.

Output formats:
- jsonl: one JSON object per file (default)
- json: a single JSON array, or {"error": ...}
- md: human-friendly Markdown

Examples:
    concord count --mode find-wc --ext txt --base-path docs
    concord count --mode traversal --threshold 500 --secondary-threshold 20
    concord modes
    concord doctor
"#
)]
pub struct Cli {
    /// Root directory that relative base paths are resolved against.
    #[arg(
        long,
        global = true,
        default_value = ".",
        value_name = "ROOT",
        env = "CONCORD_ROOT",
        long_help = "Root directory for all operations (defaults to the current directory).\n\n\
A relative --base-path is interpreted relative to this root."
    )]
    pub root: PathBuf,

    /// Output format (jsonl/json/md).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)"
    )]
    pub format: String,

    /// Disable colored output (when applicable).
    #[arg(
        long,
        global = true,
        long_help = "Disable colored output on stderr. This is useful when piping to files or\n\
when your terminal does not support ANSI colors."
    )]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging on stderr).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug logging: discovery pipelines, per-file recount notes.\n\
RUST_LOG overrides the level chosen by -v/-q."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover files and count their words.
    #[command(
        long_about = "Discover files with the selected mode, count the words of each file, and\n\
attach a concordance to files whose count exceeds --threshold. Only words occurring\n\
at least --secondary-threshold times are kept in a concordance.\n\n\
An unknown --mode prints {\"error\": ...} and exits with status 2 without touching\n\
the filesystem.\n\n\
Examples:\n\
  concord count --mode find --ext md\n\
  concord count --mode locate-awk --base-path /srv/texts --threshold 5000\n"
    )]
    Count {
        /// Discovery mode.
        #[arg(
            long,
            default_value = "find-wc",
            value_name = "MODE",
            env = "CONCORD_MODE",
            long_help = "Discovery mode.\n\n\
Supported values:\n\
- locate, locate-wc, locate-awk (locate database; may be stale)\n\
- find, find-wc, find-awk (live scan)\n\
- traversal (in-process walk, no external tools)\n\n\
-wc modes report a word count per file; -awk modes only return files above --threshold.\n\
Run `concord modes` for details."
        )]
        mode: String,

        /// File extension to select ("*" for all).
        #[arg(
            long = "ext",
            default_value = "txt",
            value_name = "EXT",
            env = "CONCORD_EXT",
            long_help = "File extension to select, with or without a leading '*.' or '.'.\n\n\
Use '*' or '*.*' to select every file."
        )]
        extension: String,

        /// Base path to search (relative to ROOT unless absolute).
        #[arg(
            long,
            default_value = ".",
            value_name = "PATH",
            env = "CONCORD_BASE_PATH"
        )]
        base_path: PathBuf,

        /// Word count a file must exceed to get a concordance.
        #[arg(
            long,
            default_value_t = DEFAULT_THRESHOLD,
            value_name = "N",
            env = "CONCORD_THRESHOLD"
        )]
        threshold: u64,

        /// Occurrences a word needs to appear in a concordance.
        #[arg(
            long,
            default_value_t = DEFAULT_SECONDARY_THRESHOLD,
            value_name = "N",
            env = "CONCORD_SECONDARY_THRESHOLD"
        )]
        secondary_threshold: u64,

        /// Keep wc counts at or below the threshold instead of recounting.
        #[arg(
            long = "trust-wc",
            long_help = "For locate-wc/find-wc, keep the wc -w count of files at or below the\n\
threshold and skip reading them. wc splits on whitespace, so these counts can differ\n\
from concord's alphabetic-run counts. Files above the threshold are always recounted."
        )]
        trust_wc: bool,

        /// Kill the discovery command after this many seconds.
        #[arg(
            long,
            value_name = "SECS",
            env = "CONCORD_TIMEOUT",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        timeout: Option<u64>,

        /// Worker threads for counting (0 = one per CPU).
        #[arg(
            long,
            default_value = "0",
            value_name = "N",
            env = "CONCORD_JOBS",
            long_help = "Number of worker threads used to count files. Requires a build with the\n\
'parallel' feature; otherwise files are counted one at a time. Output order is the\n\
discovery order either way."
        )]
        jobs: usize,

        /// Print discovery/counting statistics on stderr.
        #[arg(long)]
        stats: bool,
    },

    /// List the discovery modes.
    #[command(
        long_about = "List every discovery mode with its mechanism and whether it reports\n\
pre-computed counts or pre-filters by threshold.\n\n\
Example:\n\
  concord modes --format md\n"
    )]
    Modes,

    /// Check external dependencies and system status.
    #[command(
        long_about = "Check whether the tools used by the external discovery modes are\n\
installed (sh, find, locate, wc, xargs, awk) and list the modes usable here.\n\n\
Example:\n\
  concord doctor\n"
    )]
    Doctor,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<ExitCode> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli.format.parse().unwrap_or_default();
    let render_config = RenderConfig::with_pretty(format, cli.pretty);

    let root = cli.root.canonicalize().unwrap_or(cli.root);

    match cli.command {
        Commands::Count {
            mode,
            extension,
            base_path,
            threshold,
            secondary_threshold,
            trust_wc,
            timeout,
            jobs,
            stats,
        } => {
            let request = CountRequest {
                root,
                mode,
                extension,
                base_path,
                threshold,
                secondary_threshold,
                trust_precomputed: trust_wc,
            };
            let accepted = crate::flows::count::run_count(
                request,
                timeout.map(Duration::from_secs),
                CountOptions { jobs },
                stats,
                render_config,
            )?;
            if accepted {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_INVALID_REQUEST))
            }
        }

        Commands::Modes => {
            let rows: Vec<ModeInfo> = Mode::ALL.into_iter().map(ModeInfo::from).collect();
            println!("{}", Renderer::with_config(render_config).render_rows(&rows));
            Ok(ExitCode::SUCCESS)
        }

        Commands::Doctor => {
            crate::backends::doctor::run_doctor(render_config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
