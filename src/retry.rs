use std::time::Duration;

use crate::connector::{ConnectOutcome, Connector};
use crate::error::DialError;
use crate::progress::{ProgressSink, ScanEvent};
use crate::types::ScanTarget;

/// How a target resolved after all attempts.
#[derive(Debug)]
pub enum Resolution {
    Success { banner: String },
    Exhausted { attempts: u32, last_error: DialError },
}

/// Bounded retries with exponential backoff around a [`Connector`].
///
/// `backoff(i)` is `base_backoff * 2^i` and is slept before attempt `i + 1`.
/// Nothing is slept after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_secs(1);

    /// `max_attempts` is raised to 1 if zero.
    pub fn new(max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after failed attempt `attempt` (0-indexed).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    pub async fn resolve<C>(
        &self,
        connector: &C,
        target: &ScanTarget,
        sink: &dyn ProgressSink,
    ) -> Resolution
    where
        C: Connector + ?Sized,
    {
        let mut attempt = 0;
        loop {
            sink.emit(&ScanEvent::Probing {
                target,
                attempt: attempt + 1,
            });

            let error = match connector.attempt(target).await {
                ConnectOutcome::Open { banner } => {
                    sink.emit(&ScanEvent::Open {
                        target,
                        banner: &banner,
                    });
                    return Resolution::Success { banner };
                }
                ConnectOutcome::Unreachable(e) => e,
            };

            let last = attempt + 1 >= self.max_attempts;
            let backoff = (!last).then(|| self.backoff(attempt));
            sink.emit(&ScanEvent::AttemptFailed {
                target,
                attempt: attempt + 1,
                error: &error,
                backoff,
            });

            match backoff {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    sink.emit(&ScanEvent::Exhausted {
                        target,
                        attempts: attempt + 1,
                    });
                    return Resolution::Exhausted {
                        attempts: attempt + 1,
                        last_error: error,
                    };
                }
            }
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_BASE_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io;
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails `failures` times, then opens with `banner`. Records when each attempt happened.
    struct FlakyConnector {
        failures: u32,
        banner: &'static str,
        calls: Mutex<Vec<Instant>>,
    }

    impl FlakyConnector {
        fn new(failures: u32, banner: &'static str) -> Self {
            Self {
                failures,
                banner,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Connector for FlakyConnector {
        async fn attempt(&self, _target: &ScanTarget) -> ConnectOutcome {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Instant::now());
            if calls.len() as u32 <= self.failures {
                ConnectOutcome::Unreachable(DialError::Io(io::Error::from(
                    io::ErrorKind::ConnectionRefused,
                )))
            } else {
                ConnectOutcome::Open {
                    banner: self.banner.to_string(),
                }
            }
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ProgressSink for Recorder {
        fn emit(&self, event: &ScanEvent<'_>) {
            let line = match event {
                ScanEvent::Probing { attempt, .. } => format!("probe {attempt}"),
                ScanEvent::Open { .. } => "open".to_string(),
                ScanEvent::AttemptFailed {
                    attempt, backoff, ..
                } => format!("failed {attempt} {backoff:?}"),
                ScanEvent::Exhausted { attempts, .. } => format!("exhausted {attempts}"),
            };
            self.0.lock().unwrap().push(line);
        }
    }

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::from_secs(1));
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        assert_eq!(p.backoff(40), Duration::from_secs(1).saturating_mul(u32::MAX));
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_three_attempts_with_backoff() {
        let connector = FlakyConnector::new(u32::MAX, "");
        let sink = Recorder::default();
        let start = Instant::now();

        let res = RetryPolicy::default()
            .resolve(&connector, &ScanTarget::new("localhost", 1), &sink)
            .await;

        assert!(matches!(res, Resolution::Exhausted { attempts: 3, .. }));
        let calls = connector.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
        // No sleep after the final attempt.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec![
                "probe 1",
                "failed 1 Some(1s)",
                "probe 2",
                "failed 2 Some(2s)",
                "probe 3",
                "failed 3 None",
                "exhausted 3",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_open() {
        let connector = FlakyConnector::new(0, "220 ready\r\n");
        let sink = Recorder::default();
        let res = RetryPolicy::default()
            .resolve(&connector, &ScanTarget::new("localhost", 21), &sink)
            .await;

        match res {
            Resolution::Success { banner } => assert_eq!(banner, "220 ready\r\n"),
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(connector.calls().len(), 1);
        assert_eq!(*sink.0.lock().unwrap(), vec!["probe 1", "open"]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_success_is_plain_success() {
        let connector = FlakyConnector::new(2, "");
        let start = Instant::now();
        let res = RetryPolicy::default()
            .resolve(&connector, &ScanTarget::new("localhost", 80), &Recorder::default())
            .await;

        match res {
            Resolution::Success { banner } => assert!(banner.is_empty()),
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(connector.calls().len(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_policy_single_attempt() {
        let connector = FlakyConnector::new(u32::MAX, "");
        let start = Instant::now();
        let res = RetryPolicy::new(1, Duration::from_secs(10))
            .resolve(&connector, &ScanTarget::new("localhost", 80), &Recorder::default())
            .await;
        assert!(matches!(res, Resolution::Exhausted { attempts: 1, .. }));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
