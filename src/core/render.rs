//! Renderer module
//!
//! Renders a CountResult (and the doctor/modes listings) to jsonl, json or md

use serde::Serialize;

use crate::core::model::{CountResult, FileRecord, ModeInfo};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// A value that renders as one Markdown table row
pub trait MarkdownRow {
    fn markdown_header() -> &'static [&'static str];
    fn markdown_cells(&self) -> Vec<String>;
}

/// Renderer for count results and listings
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a count result to a string
    pub fn render(&self, result: &CountResult) -> String {
        match self.config.format {
            OutputFormat::Jsonl => match result {
                CountResult::Records(records) => self.render_jsonl(&records.items),
                CountResult::Error(err) => self.to_json(err),
            },
            OutputFormat::Json => self.to_json(result),
            OutputFormat::Markdown => self.render_count_markdown(result),
        }
    }

    /// Render a flat listing (doctor, modes)
    pub fn render_rows<T: Serialize + MarkdownRow>(&self, rows: &[T]) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(rows),
            OutputFormat::Json => self.to_json(&rows),
            OutputFormat::Markdown => markdown_table(rows),
        }
    }

    /// One JSON object per line
    fn render_jsonl<T: Serialize>(&self, items: &[T]) -> String {
        items
            .iter()
            .map(|item| self.to_json(item))
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        let rendered = if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }

    fn render_count_markdown(&self, result: &CountResult) -> String {
        let records = match result {
            CountResult::Error(err) => return format!("## Error\n\n> {}\n", err.error),
            CountResult::Records(records) => records,
        };

        let mut output = String::from("## Files\n\n");
        output.push_str(&markdown_table(&records.items));

        for record in &records.items {
            let Some(words) = &record.words else {
                continue;
            };

            output.push_str(&format!("\n### `{}`\n\n", record.path));

            let mut entries: Vec<_> = words.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            for (word, count) in entries {
                output.push_str(&format!("- {}: {}\n", word, count));
            }
        }

        output
    }
}

fn markdown_table<T: MarkdownRow>(rows: &[T]) -> String {
    let header = T::markdown_header();
    let mut output = format!("| {} |\n", header.join(" | "));
    output.push_str(&format!("|{}\n", "---|".repeat(header.len())));
    for row in rows {
        output.push_str(&format!("| {} |\n", row.markdown_cells().join(" | ")));
    }
    output
}

impl MarkdownRow for FileRecord {
    fn markdown_header() -> &'static [&'static str] {
        &["Path", "Words", "Concordance"]
    }

    fn markdown_cells(&self) -> Vec<String> {
        vec![
            format!("`{}`", self.path),
            self.total_count.to_string(),
            self.words
                .as_ref()
                .map(|w| format!("{} words", w.len()))
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}

impl MarkdownRow for ModeInfo {
    fn markdown_header() -> &'static [&'static str] {
        &["Mode", "Mechanism", "Pre-computed", "Pre-filtered", "Description"]
    }

    fn markdown_cells(&self) -> Vec<String> {
        let yes_no = |b: bool| String::from(if b { "yes" } else { "no" });
        vec![
            format!("`{}`", self.mode),
            format!("{:?}", self.mechanism).to_lowercase(),
            yes_no(self.precomputed),
            yes_no(self.prefiltered),
            self.description.to_string(),
        ]
    }
}
