//! concord - word counts and concordances for discovered files
//!
//! concord provides:
//! - File discovery through locate, find (with wc/awk pipelines) or a directory walk
//! - Unicode-aware word counting
//! - Concordances for files above a word threshold
//! - Unified output format (jsonl/json/md)

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

mod backends;
mod cli;
mod core;
mod flows;

fn init_logger(cli: &cli::Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };

    let style = if cli.no_color {
        env_logger::WriteStyle::Never
    } else {
        env_logger::WriteStyle::Auto
    };

    // RUST_LOG wins over -v/-q
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .format_module_path(false)
        .write_style(style)
        .init();
}

fn main() -> Result<ExitCode> {
    // Check for unsupported platforms
    #[cfg(windows)]
    {
        eprintln!("Error: Windows is not supported. Please use WSL (not guaranteed to work).");
        std::process::exit(1);
    }

    let cli = cli::Cli::parse();
    init_logger(&cli);
    cli::run(cli)
}
