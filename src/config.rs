use std::time::Duration;

use crate::connector::TcpConnector;
use crate::error::ConfigError;
use crate::retry::RetryPolicy;

pub const DEFAULT_WORKERS: usize = 100;
pub const MAX_WORKERS: usize = 5_000;
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_secs(2);

/// Everything the scan engine needs besides the targets themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Number of concurrent workers, and so the bound on in-flight sockets.
    pub workers: usize,
    pub connect_timeout: Duration,
    pub banner_timeout: Duration,
    pub grab_banner: bool,
    /// Work queue capacity; raised to `workers` if smaller.
    pub queue_capacity: usize,
    pub retry: RetryPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            banner_timeout: DEFAULT_BANNER_TIMEOUT,
            grab_banner: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            retry: RetryPolicy::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.workers > MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers(self.workers));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroConnectTimeout);
        }
        if self.grab_banner && self.banner_timeout.is_zero() {
            return Err(ConfigError::ZeroBannerTimeout);
        }
        Ok(())
    }

    pub fn connector(&self) -> TcpConnector {
        let c = TcpConnector::new(self.connect_timeout, self.banner_timeout);
        if self.grab_banner {
            c
        } else {
            c.without_banner()
        }
    }
}
