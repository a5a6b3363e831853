use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::PortSpecError;

/// Ports accepted from user input, plus the entries that were skipped.
///
/// Rejected entries are reported as warnings by the caller; they never abort a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPorts {
    pub ports: Vec<u16>,
    pub rejected: Vec<PortSpecError>,
    /// Ports dropped because they were already listed.
    pub duplicates: Vec<u16>,
}

impl ParsedPorts {
    fn push_entry(&mut self, seen: &mut HashSet<u16>, entry: &str) {
        match parse_entry(entry) {
            Ok(range) => {
                for p in range {
                    if seen.insert(p) {
                        self.ports.push(p);
                    } else {
                        self.duplicates.push(p);
                    }
                }
            }
            Err(e) => self.rejected.push(e),
        }
    }
}

/// Parse a comma-separated port list such as `22,80,8000-8010`.
///
/// Whitespace around entries is ignored, empty entries are skipped and
/// duplicates are dropped keeping the first occurrence.
pub fn parse_port_list(s: &str) -> ParsedPorts {
    let mut out = ParsedPorts::default();
    let mut seen = HashSet::new();
    for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        out.push_entry(&mut seen, entry);
    }
    out
}

/// Parse ports file content: each line holds a port list as accepted by
/// [`parse_port_list`], and `#` starts a comment.
pub fn parse_ports_file(s: &str) -> ParsedPorts {
    let mut out = ParsedPorts::default();
    let mut seen = HashSet::new();
    let entries = s
        .lines()
        .filter_map(|line| line.split('#').next())
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|e| !e.is_empty());
    for entry in entries {
        out.push_entry(&mut seen, entry);
    }
    out
}

/// Load and parse a ports file. Only an unreadable file is an error.
pub fn load_ports_from_path(path: impl AsRef<Path>) -> Result<ParsedPorts> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read ports file: {}", path.as_ref().display()))?;
    Ok(parse_ports_file(&content))
}

/// The contiguous range `start..=end`, validated against 1..=65535.
pub fn port_range(start: u32, end: u32) -> Result<Vec<u16>, PortSpecError> {
    let start = check_port(start)?;
    let end = check_port(end)?;
    if start > end {
        return Err(PortSpecError::InvertedRange {
            start: start.into(),
            end: end.into(),
        });
    }
    Ok((start..=end).collect())
}

fn parse_entry(entry: &str) -> Result<std::ops::RangeInclusive<u16>, PortSpecError> {
    if let Some((a, b)) = entry.split_once('-') {
        let start = parse_port_str(a.trim())?;
        let end = parse_port_str(b.trim())?;
        if start > end {
            return Err(PortSpecError::InvertedRange {
                start: start.into(),
                end: end.into(),
            });
        }
        return Ok(start..=end);
    }
    let p = parse_port_str(entry)?;
    Ok(p..=p)
}

fn parse_port_str(s: &str) -> Result<u16, PortSpecError> {
    let val: u32 = s
        .parse()
        .map_err(|_| PortSpecError::InvalidValue(s.to_string()))?;
    check_port(val)
}

fn check_port(val: u32) -> Result<u16, PortSpecError> {
    if val == 0 || val > 65535 {
        return Err(PortSpecError::OutOfRange(val));
    }
    Ok(val as u16)
}
