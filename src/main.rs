use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use time::OffsetDateTime;

use tcp_scan_rs::config::{ScanConfig, DEFAULT_WORKERS};
use tcp_scan_rs::progress::{ConsoleSink, ProgressSink, TracingSink};
use tcp_scan_rs::report::ScanReport;
use tcp_scan_rs::{logging, ports, scanner, targets};

/// tcp-scan-rs: concurrent TCP connect scanner with retries and banner capture.
#[derive(Debug, Clone, Parser)]
#[command(name = "tcp-scan-rs", version, about, long_about = None)]
struct Cli {
    /// Comma-separated hosts, IPs, [IPv6] literals or IPv4 CIDRs.
    #[arg(long, default_value = "scanme.nmap.org")]
    targets: String,

    /// First port of the range (used when neither --ports nor --ports-file is given).
    #[arg(long = "start-port", default_value_t = 1)]
    start_port: u32,

    /// Last port of the range, inclusive.
    #[arg(long = "end-port", default_value_t = 1024)]
    end_port: u32,

    /// Comma-separated ports or ranges, e.g. 22,80,8000-8010.
    #[arg(long, conflicts_with = "ports_file")]
    ports: Option<String>,

    /// File with one port or range per line; `#` starts a comment.
    #[arg(long = "ports-file")]
    ports_file: Option<PathBuf>,

    /// Number of concurrent workers.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Connect timeout in seconds.
    #[arg(long, default_value_t = 5.0)]
    timeout: f64,

    /// How long to wait for a banner after connecting, in milliseconds.
    #[arg(long = "banner-timeout-ms", default_value_t = 2000)]
    banner_timeout_ms: u64,

    /// Do not read banners.
    #[arg(long = "no-banner", default_value_t = false)]
    no_banner: bool,

    /// Print results as JSON after the summary.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Write the full report as pretty JSON to this path.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Send per-attempt progress to the log instead of stdout.
    #[arg(long, short, default_value_t = false)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let started_at = OffsetDateTime::now_utc();
    let start = Instant::now();

    let parsed_hosts = targets::parse_host_list(&cli.targets);
    for e in &parsed_hosts.rejected {
        eprintln!("Warning: skipping target: {e}");
    }
    for h in &parsed_hosts.duplicates {
        eprintln!("Warning: duplicate target {h} scanned once");
    }

    let (port_list, range_end) = resolve_ports(&cli)?;

    let connect_timeout = Duration::try_from_secs_f64(cli.timeout)
        .with_context(|| format!("invalid --timeout value: {}", cli.timeout))?;
    let config = ScanConfig {
        workers: cli.workers,
        connect_timeout,
        banner_timeout: Duration::from_millis(cli.banner_timeout_ms),
        grab_banner: !cli.no_banner,
        ..ScanConfig::default()
    };

    let sink: Arc<dyn ProgressSink> = match (cli.quiet, range_end) {
        (true, _) => Arc::new(TracingSink),
        (false, Some(end)) => Arc::new(ConsoleSink::with_range_end(end)),
        (false, None) => Arc::new(ConsoleSink::new()),
    };

    let results = scanner::scan_targets(&parsed_hosts.hosts, &port_list, &config, sink)
        .await
        .context("invalid scan configuration")?;

    let report = ScanReport::new(results, started_at, start.elapsed());
    println!("{}", report.render_text());

    if cli.json {
        match report.results_json() {
            Ok(json) => println!("\nScan Results (JSON):\n{json}"),
            Err(e) => eprintln!("Error encoding results to JSON: {e:#}"),
        }
    }

    if let Some(path) = cli.output.as_deref() {
        match report.write_json(path) {
            Ok(()) => println!("Wrote JSON report to {}", path.display()),
            Err(e) => eprintln!("{e:#}"),
        }
    }

    Ok(())
}

/// Ports from --ports, --ports-file or the start/end range, with the range end
/// when the ports came from a contiguous range.
fn resolve_ports(cli: &Cli) -> Result<(Vec<u16>, Option<u16>)> {
    let parsed = if let Some(list) = cli.ports.as_deref() {
        ports::parse_port_list(list)
    } else if let Some(path) = cli.ports_file.as_deref() {
        ports::load_ports_from_path(path)?
    } else {
        return match ports::port_range(cli.start_port, cli.end_port) {
            Ok(range) => {
                let end = range.last().copied();
                Ok((range, end))
            }
            Err(e) => {
                eprintln!("Warning: {e}; no ports to scan");
                Ok((Vec::new(), None))
            }
        };
    };

    for e in &parsed.rejected {
        eprintln!("Invalid port: {e}");
    }
    for p in &parsed.duplicates {
        eprintln!("Warning: duplicate port {p} scanned once");
    }
    Ok((parsed.ports, None))
}
