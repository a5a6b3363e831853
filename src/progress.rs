//! Per-attempt progress notices emitted while targets are resolved.
use std::time::Duration;

use crate::error::DialError;
use crate::types::ScanTarget;

/// One progress notice. Emitted concurrently from every worker.
#[derive(Debug)]
pub enum ScanEvent<'a> {
    /// Attempt `attempt` (1-based) is about to dial `target`.
    Probing {
        target: &'a ScanTarget,
        attempt: u32,
    },
    Open {
        target: &'a ScanTarget,
        banner: &'a str,
    },
    /// `backoff` is `None` after the last attempt.
    AttemptFailed {
        target: &'a ScanTarget,
        attempt: u32,
        error: &'a DialError,
        backoff: Option<Duration>,
    },
    Exhausted {
        target: &'a ScanTarget,
        attempts: u32,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ScanEvent<'_>);
}

/// Human-readable progress lines on stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink {
    range_end: Option<u16>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show probing lines as `port/end` when scanning a contiguous range.
    pub fn with_range_end(end: u16) -> Self {
        Self {
            range_end: Some(end),
        }
    }

    pub fn render(&self, event: &ScanEvent<'_>) -> String {
        match event {
            ScanEvent::Probing { target, .. } => match self.range_end {
                Some(end) => format!("Scanning port {}/{} from {}", target.port, end, target.host),
                None => format!("Scanning port {} from {}", target.port, target.host),
            },
            ScanEvent::Open { target, banner } if banner.is_empty() => {
                format!("Connection to {target} was successful (no banner)")
            }
            ScanEvent::Open { target, banner } => {
                let rule = "-".repeat(58);
                let sep = if banner.ends_with('\n') { "" } else { "\n" };
                format!("{rule}\nConnection to {target} was successful\nBanner: {banner}{sep}{rule}")
            }
            ScanEvent::AttemptFailed {
                target,
                attempt,
                backoff: Some(backoff),
                ..
            } => format!("Attempt {attempt} to {target} failed. Waiting {backoff:?}..."),
            ScanEvent::AttemptFailed {
                target,
                attempt,
                error,
                backoff: None,
            } => format!("Attempt {attempt} to {target} failed: {error}"),
            ScanEvent::Exhausted { target, attempts } => {
                format!("Failed to connect to {target} after {attempts} attempts")
            }
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: &ScanEvent<'_>) {
        println!("{}", self.render(event));
    }
}

/// Forwards notices to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, event: &ScanEvent<'_>) {
        match event {
            ScanEvent::Probing { target, attempt } => {
                tracing::debug!(%target, attempt, "probing");
            }
            ScanEvent::Open { target, banner } => {
                tracing::info!(%target, banner_len = banner.len(), "open");
            }
            ScanEvent::AttemptFailed {
                target,
                attempt,
                error,
                backoff,
            } => {
                tracing::debug!(%target, attempt, %error, ?backoff, "attempt failed");
            }
            ScanEvent::Exhausted { target, attempts } => {
                tracing::debug!(%target, attempts, "giving up");
            }
        }
    }
}
