use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::aggregator::ResultAggregator;
use crate::config::{ScanConfig, DEFAULT_QUEUE_CAPACITY, MAX_WORKERS};
use crate::connector::{Connector, TcpConnector};
use crate::error::ConfigError;
use crate::progress::{ProgressSink, TracingSink};
use crate::retry::{Resolution, RetryPolicy};
use crate::targets::{self, HostSpec};
use crate::types::{ScanResult, ScanResults, ScanTarget};

type TargetQueue = Arc<Mutex<mpsc::Receiver<ScanTarget>>>;

/// Scan every host × port with the given configuration.
///
/// Returns an error only for an invalid configuration; unreachable targets are
/// simply absent from the results.
pub async fn scan_targets(
    hosts: &[HostSpec],
    ports: &[u16],
    config: &ScanConfig,
    sink: Arc<dyn ProgressSink>,
) -> Result<ScanResults, ConfigError> {
    config.validate()?;
    let engine = ScanEngine::from_config(config).with_sink(sink);
    Ok(engine.run(targets::enumerate(hosts, ports)).await)
}

/// Bounded worker pool fed from a bounded queue.
///
/// - Spawns a fixed number of workers, each resolving one target at a time
///   through the [`RetryPolicy`], so in-flight sockets never exceed the worker count.
/// - The dispatcher blocks when the queue is full; no target is dropped.
/// - `run` returns only after every worker has drained the queue and exited.
pub struct ScanEngine<C: ?Sized = TcpConnector> {
    connector: Arc<C>,
    policy: RetryPolicy,
    workers: usize,
    queue_capacity: usize,
    sink: Arc<dyn ProgressSink>,
}

impl ScanEngine<TcpConnector> {
    pub fn from_config(config: &ScanConfig) -> Self {
        ScanEngine::new(config.connector(), config.workers)
            .with_policy(config.retry)
            .with_queue_capacity(config.queue_capacity)
    }
}

impl<C: Connector + 'static> ScanEngine<C> {
    pub fn new(connector: C, workers: usize) -> Self {
        Self::from_arc(Arc::new(connector), workers)
    }
}

impl<C: Connector + ?Sized + 'static> ScanEngine<C> {
    /// Build around a connector the caller keeps a handle to.
    pub fn from_arc(connector: Arc<C>, workers: usize) -> Self {
        Self {
            connector,
            policy: RetryPolicy::default(),
            workers: workers.clamp(1, MAX_WORKERS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub async fn run<I>(&self, targets: I) -> ScanResults
    where
        I: IntoIterator<Item = ScanTarget>,
    {
        let capacity = self.queue_capacity.max(self.workers);
        let (tx, rx) = mpsc::channel(capacity);
        let queue: TargetQueue = Arc::new(Mutex::new(rx));
        let aggregator = ResultAggregator::new();

        let mut set = JoinSet::new();
        for id in 0..self.workers {
            set.spawn(worker(
                id,
                queue.clone(),
                self.connector.clone(),
                self.policy,
                self.sink.clone(),
                aggregator.clone(),
            ));
        }
        drop(queue);

        let mut dispatched = 0u64;
        for target in targets {
            if tx.send(target).await.is_err() {
                error!("all scan workers exited before the queue was drained");
                break;
            }
            dispatched += 1;
        }
        // Closing the sender lets workers drain and exit.
        drop(tx);
        info!(targets = dispatched, workers = self.workers, "all targets dispatched");

        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "scan worker failed");
            }
        }

        let results = aggregator.into_results().await;
        ScanResults {
            scanned_total: dispatched,
            open_count: results.len() as u64,
            results,
        }
    }
}

async fn worker<C: Connector + ?Sized>(
    id: usize,
    queue: TargetQueue,
    connector: Arc<C>,
    policy: RetryPolicy,
    sink: Arc<dyn ProgressSink>,
    results: ResultAggregator,
) {
    debug!(worker = id, "scan worker started");
    loop {
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(target) = next else { break };

        if let Resolution::Success { banner } =
            policy.resolve(connector.as_ref(), &target, sink.as_ref()).await
        {
            results.record(ScanResult::open(&target, banner)).await;
        }
    }
    debug!(worker = id, "scan worker finished");
}
