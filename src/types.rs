use serde::{Deserialize, Serialize};
use std::fmt;

/// One (host, port) pair to probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanTarget {
    pub host: String,
    pub port: u16,
}

impl ScanTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Renders as `host:port`, bracketing IPv6 literals.
impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// One open (host, port) with whatever the service sent first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub target: String,
    #[serde(with = "port_as_string")]
    pub port: u16,
    pub banner: String,
}

impl ScanResult {
    pub fn open(target: &ScanTarget, banner: String) -> Self {
        Self {
            target: target.host.clone(),
            port: target.port,
            banner,
        }
    }
}

/// Output of one engine run: every target dispatched, and the open ones.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanResults {
    pub scanned_total: u64,
    pub open_count: u64,
    pub results: Vec<ScanResult>,
}

// Ports are written as strings in JSON output.
mod port_as_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(port: &u16, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(port)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u16, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(de::Error::custom)
    }
}
