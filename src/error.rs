use std::time::Duration;

use thiserror::Error;

/// Why a single TCP dial did not produce a connection.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("connect timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// A port entry that could not be turned into one or more ports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortSpecError {
    #[error("invalid port value: `{0}`")]
    InvalidValue(String),
    #[error("port out of range: {0}")]
    OutOfRange(u32),
    #[error("invalid range {start}-{end} (start > end)")]
    InvertedRange { start: u32, end: u32 },
}

/// A target host entry that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("empty host entry")]
    Empty,
    #[error("host `{0}` contains ':' but is not an IPv6 literal (use [addr] for IPv6, and pass ports separately)")]
    AmbiguousColon(String),
    #[error("invalid bracketed IPv6 literal: `{0}`")]
    InvalidBracketed(String),
    #[error("invalid CIDR `{0}`")]
    InvalidCidr(String),
    #[error("IPv6 CIDR `{0}` cannot be expanded")]
    UnsupportedCidr(String),
    #[error("host `{0}` contains whitespace")]
    Whitespace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("worker count {0} exceeds the maximum of {max}", max = crate::config::MAX_WORKERS)]
    TooManyWorkers(usize),
    #[error("connect timeout must be positive")]
    ZeroConnectTimeout,
    #[error("banner timeout must be positive")]
    ZeroBannerTimeout,
}
