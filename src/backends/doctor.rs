//! Doctor - Dependency checking
//!
//! Reports which external tools the discovery pipelines need and which modes are
//! usable on this machine.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::core::model::Mode;
use crate::core::render::{MarkdownRow, RenderConfig, Renderer};
use crate::core::util::command_exists;

/// Dependency status
#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: String,
    pub available: bool,
    pub required: bool,
    /// Modes that cannot run without this tool
    pub modes: Vec<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MarkdownRow for DependencyStatus {
    fn markdown_header() -> &'static [&'static str] {
        &["Tool", "Status", "Needed by", "Notes"]
    }

    fn markdown_cells(&self) -> Vec<String> {
        let status = match (self.available, self.required) {
            (true, _) => "✓ found",
            (false, true) => "✗ missing (required)",
            (false, false) => "✗ missing",
        };
        let modes = self
            .modes
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        vec![
            format!("`{}`", self.name),
            status.to_string(),
            modes,
            self.notes.clone().unwrap_or_default(),
        ]
    }
}

fn tool(name: &str, required: bool, modes: &[Mode], notes: Option<&str>) -> DependencyStatus {
    DependencyStatus {
        name: name.to_string(),
        available: command_exists(name),
        required,
        modes: modes.to_vec(),
        notes: notes.map(str::to_string),
    }
}

/// Check all dependencies
pub fn check_dependencies() -> Vec<DependencyStatus> {
    use Mode::*;

    let external = [Locate, LocateWc, LocateAwk, Find, FindWc, FindAwk];

    vec![
        tool("sh", true, &external, Some("runs every external pipeline")),
        tool("find", false, &[Find, FindWc, FindAwk], None),
        tool(
            "locate",
            false,
            &[Locate, LocateWc, LocateAwk],
            Some("results are only as fresh as the last updatedb run"),
        ),
        tool(
            "wc",
            false,
            &[LocateWc, LocateAwk, FindWc, FindAwk],
            Some("find-wc/find-awk need GNU wc (--files0-from)"),
        ),
        tool("xargs", false, &[LocateWc, LocateAwk], None),
        tool("awk", false, &[LocateAwk, FindAwk], None),
    ]
}

/// Modes whose every tool is present; `traversal` is always usable
pub fn usable_modes(deps: &[DependencyStatus]) -> Vec<Mode> {
    Mode::ALL
        .into_iter()
        .filter(|mode| {
            deps.iter()
                .filter(|d| d.modes.contains(mode))
                .all(|d| d.available)
        })
        .collect()
}

/// Run the doctor command
pub fn run_doctor(config: RenderConfig) -> Result<()> {
    let deps = check_dependencies();

    let renderer = Renderer::with_config(config);
    println!("{}", renderer.render_rows(&deps));

    let usable = usable_modes(&deps);
    let names: Vec<_> = usable.iter().map(|m| m.as_str()).collect();
    eprintln!("{} {}", "usable modes:".bold(), names.join(", "));

    if deps.iter().any(|d| d.required && !d.available) {
        eprintln!(
            "\n{}",
            "⚠️  Some required dependencies are missing!".yellow()
        );
    }

    Ok(())
}
