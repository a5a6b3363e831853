use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use time::{format_description::well_known, OffsetDateTime};

use crate::types::{ScanResult, ScanResults};

const BANNER_SNIPPET: usize = 60;

/// Final summary of one run.
#[derive(Serialize, Debug, Clone)]
pub struct ScanReport {
    pub started_at: String,
    pub elapsed_ms: u64,
    pub scanned_total: u64,
    pub open_count: u64,
    pub results: Vec<ScanResult>,
}

impl ScanReport {
    pub fn new(results: ScanResults, started_at: OffsetDateTime, elapsed: Duration) -> Self {
        Self {
            started_at: rfc3339(started_at),
            elapsed_ms: elapsed.as_millis() as u64,
            scanned_total: results.scanned_total,
            open_count: results.open_count,
            results: results.results,
        }
    }

    /// Summary counters followed by a table of open ports.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(33);
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(out, "Scan Summary:\n");
        let _ = writeln!(out, "Open ports: {}", self.open_count);
        let _ = writeln!(out, "Total ports scanned: {}", self.scanned_total);
        let _ = writeln!(
            out,
            "Time taken: {:?}",
            Duration::from_millis(self.elapsed_ms)
        );

        if !self.results.is_empty() {
            out.push('\n');
            out.push_str(&render_table(&self.results));
        }
        out.push_str(&rule);
        out
    }

    /// The open results as a pretty JSON array.
    pub fn results_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.results).context("failed to encode results as JSON")
    }

    /// Write the whole report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("failed to write JSON to {}", path.display()))?;
        Ok(())
    }
}

fn render_table(results: &[ScanResult]) -> String {
    let host_w = results.iter().map(|r| r.target.len()).fold("target".len(), usize::max);
    let port_w = 5;
    let banners: Vec<String> = results.iter().map(|r| banner_snippet(&r.banner)).collect();
    let banner_w = banners.iter().map(|b| b.chars().count()).fold("banner".len(), usize::max);

    let mut out = String::new();
    let _ = writeln!(out, "{:<host_w$}  {:>port_w$}  {:<banner_w$}", "target", "port", "banner");
    let _ = writeln!(out, "{:-<host_w$}  {:-<port_w$}  {:-<banner_w$}", "", "", "");
    for (r, b) in results.iter().zip(&banners) {
        let _ = writeln!(out, "{:<host_w$}  {:>port_w$}  {:<banner_w$}", r.target, r.port, b);
    }
    out
}

/// Escape control characters and cut to a fixed number of characters.
fn banner_snippet(banner: &str) -> String {
    banner
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .escape_debug()
        .take(BANNER_SNIPPET)
        .collect()
}

fn rfc3339(t: OffsetDateTime) -> String {
    t.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
