use ipnet::{IpNet, Ipv4Net};
use std::collections::HashSet;
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

use crate::error::TargetError;
use crate::types::ScanTarget;

/// One accepted `--targets` entry.
///
/// Blocks stay unexpanded until enumeration, so a wide CIDR costs nothing up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostSpec {
    /// A host name or a normalised IP literal.
    Name(String),
    Block(Ipv4Net),
}

impl HostSpec {
    pub fn name(host: impl Into<String>) -> Self {
        HostSpec::Name(host.into())
    }

    /// Number of hosts this entry expands to.
    ///
    /// Blocks shorter than /31 exclude their network and broadcast addresses,
    /// matching [`Ipv4Net::hosts`].
    pub fn host_count(&self) -> u64 {
        match self {
            HostSpec::Name(_) => 1,
            HostSpec::Block(net) => {
                let size = 1u64 << (32 - u32::from(net.prefix_len()));
                if net.prefix_len() < 31 {
                    size - 2
                } else {
                    size
                }
            }
        }
    }

    fn hosts(&self) -> Box<dyn Iterator<Item = String> + '_> {
        match self {
            HostSpec::Name(h) => Box::new(std::iter::once(h.clone())),
            HostSpec::Block(net) => Box::new(net.hosts().map(|ip| ip.to_string())),
        }
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostSpec::Name(h) => f.write_str(h),
            HostSpec::Block(net) => write!(f, "{net}"),
        }
    }
}

/// Hosts accepted from user input, plus the entries that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHosts {
    pub hosts: Vec<HostSpec>,
    pub rejected: Vec<TargetError>,
    /// Entries dropped because an identical one came earlier.
    pub duplicates: Vec<HostSpec>,
}

/// Parse a comma-separated host list.
///
/// Each entry may be a host name, an IP literal, a bracketed IPv6 literal
/// (`[::1]`) or an IPv4 CIDR block. Repeated entries are dropped, first occurrence wins.
pub fn parse_host_list(s: &str) -> ParsedHosts {
    let mut out = ParsedHosts::default();
    let mut seen = HashSet::new();
    for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match parse_host(entry) {
            Ok(host) if seen.insert(host.clone()) => out.hosts.push(host),
            Ok(host) => out.duplicates.push(host),
            Err(e) => out.rejected.push(e),
        }
    }
    out
}

/// Parse one host entry.
///
/// Host and port are never split on ':'. A colon is only accepted as part of
/// an IPv6 literal, bare or bracketed.
pub fn parse_host(entry: &str) -> Result<HostSpec, TargetError> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(TargetError::Empty);
    }
    if entry.chars().any(char::is_whitespace) {
        return Err(TargetError::Whitespace(entry.to_string()));
    }

    if entry.contains('/') {
        let net: IpNet = entry
            .parse()
            .map_err(|_| TargetError::InvalidCidr(entry.to_string()))?;
        return match net {
            IpNet::V4(n4) => Ok(HostSpec::Block(n4.trunc())),
            IpNet::V6(_) => Err(TargetError::UnsupportedCidr(entry.to_string())),
        };
    }

    if let Some(inner) = entry.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| TargetError::InvalidBracketed(entry.to_string()))?;
        let v6: Ipv6Addr = inner
            .parse()
            .map_err(|_| TargetError::InvalidBracketed(entry.to_string()))?;
        return Ok(HostSpec::Name(v6.to_string()));
    }

    if let Ok(ip) = entry.parse::<IpAddr>() {
        return Ok(HostSpec::Name(ip.to_string()));
    }

    if entry.contains(':') {
        return Err(TargetError::AmbiguousColon(entry.to_string()));
    }

    Ok(HostSpec::Name(entry.to_string()))
}

/// Number of targets `enumerate` will produce.
pub fn total_targets(hosts: &[HostSpec], ports: &[u16]) -> u64 {
    hosts.iter().map(HostSpec::host_count).sum::<u64>() * ports.len() as u64
}

/// Lazily expand hosts × ports, host-major. Blocks are walked address by address.
pub fn enumerate<'a>(
    hosts: &'a [HostSpec],
    ports: &'a [u16],
) -> impl Iterator<Item = ScanTarget> + 'a {
    hosts.iter().flat_map(HostSpec::hosts).flat_map(move |h| {
        ports.iter().map(move |&p| ScanTarget::new(h.clone(), p))
    })
}
