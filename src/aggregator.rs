use std::sync::Arc;
use tokio::sync::Mutex;

use crate::types::ScanResult;

/// Shared, append-only collection of open results.
///
/// Clones share the same storage. The lock is only held for the append or copy,
/// never across network I/O.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    entries: Arc<Mutex<Vec<ScanResult>>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, result: ScanResult) {
        self.entries.lock().await.push(result);
    }

    /// Copy of the current contents, in completion order.
    ///
    /// Only meaningful once every writer has finished.
    pub async fn snapshot(&self) -> Vec<ScanResult> {
        self.entries.lock().await.clone()
    }

    /// Take the results out, copying only if another handle is still alive.
    pub async fn into_results(self) -> Vec<ScanResult> {
        match Arc::try_unwrap(self.entries) {
            Ok(m) => m.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScanTarget;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_are_not_lost() {
        let agg = ResultAggregator::new();
        let mut set = tokio::task::JoinSet::new();
        for port in 1..=500u16 {
            let agg = agg.clone();
            set.spawn(async move {
                agg.record(ScanResult::open(&ScanTarget::new("h", port), String::new()))
                    .await;
            });
        }
        while set.join_next().await.is_some() {}

        let mut ports: Vec<u16> = agg.snapshot().await.iter().map(|r| r.port).collect();
        ports.sort_unstable();
        assert_eq!(ports, (1..=500).collect::<Vec<_>>());
        assert_eq!(agg.into_results().await.len(), 500);
    }

    #[tokio::test]
    async fn empty_by_default() {
        let agg = ResultAggregator::new();
        assert!(agg.snapshot().await.is_empty());
        assert!(agg.into_results().await.is_empty());
    }
}
