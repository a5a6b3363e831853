use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time;

use crate::error::DialError;
use crate::types::ScanTarget;

/// Largest banner captured from a single read.
pub const BANNER_BUF_SIZE: usize = 1024;

/// Result of one connection attempt against one target.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// The dial succeeded. `banner` is empty if nothing arrived before the read deadline.
    Open { banner: String },
    Unreachable(DialError),
}

/// A single connection attempt, no retries.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn attempt(&self, target: &ScanTarget) -> ConnectOutcome;
}

/// TCP connect with a dial timeout and an optional passive banner read.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
    banner_timeout: Duration,
    grab_banner: bool,
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration, banner_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            banner_timeout,
            grab_banner: true,
        }
    }

    /// Skip the banner read and close right after a successful dial.
    pub fn without_banner(mut self) -> Self {
        self.grab_banner = false;
        self
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn attempt(&self, target: &ScanTarget) -> ConnectOutcome {
        // The timeout covers name resolution as well as the handshake.
        let connect = TcpStream::connect((target.host.as_str(), target.port));
        let mut stream = match time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return ConnectOutcome::Unreachable(DialError::Io(e)),
            Err(_) => return ConnectOutcome::Unreachable(DialError::TimedOut(self.connect_timeout)),
        };

        let banner = if self.grab_banner {
            read_banner(&mut stream, self.banner_timeout).await
        } else {
            String::new()
        };
        // Closes the socket on every path, read errors included.
        drop(stream);
        ConnectOutcome::Open { banner }
    }
}

/// Single bounded read under a deadline. Timeouts, errors and EOF all give an empty banner.
async fn read_banner(stream: &mut TcpStream, deadline: Duration) -> String {
    let mut buf = vec![0u8; BANNER_BUF_SIZE];
    match time::timeout(deadline, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            buf.truncate(n);
            String::from_utf8_lossy(&buf).into_owned()
        }
        _ => String::new(),
    }
}
