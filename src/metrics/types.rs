// Standard library
use std::sync::Arc;
use std::time::Instant;

// 3rd party crates
use tokio::sync::RwLock;

// Project imports
use crate::api::errors::{DispatchError, TransportError};

/// Metrics for document submissions
#[derive(Debug, Default, Clone)]
pub struct DispatchMetrics {
    /// Total number of dispatch attempts
    pub attempts: u64,
    /// Number of submissions answered with the success status
    pub successes: u64,
    /// Number of responses with any other status
    pub non_success_statuses: u64,
    /// Number of sends that never got a response
    pub transport_failures: u64,
    /// Number of transport failures caused by a timeout
    pub timeouts: u64,
    /// Number of payloads that could not be encoded
    pub encoding_failures: u64,
    /// Status code of the most recent response
    pub last_status: Option<u16>,
    /// Last successful submission time
    pub last_success: Option<Instant>,
    /// Last failure time
    pub last_failure: Option<Instant>,
}

/// Thread-safe metrics manager
#[derive(Debug, Default)]
pub struct MetricsManager {
    metrics: Arc<RwLock<DispatchMetrics>>,
}

impl MetricsManager {
    /// Creates a new MetricsManager
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(DispatchMetrics::default())),
        }
    }

    /// Records a successful submission
    pub async fn record_success(&self, status: u16) {
        let mut metrics = self.metrics.write().await;
        metrics.attempts += 1;
        metrics.successes += 1;
        metrics.last_status = Some(status);
        metrics.last_success = Some(Instant::now());
    }

    /// Records a failed submission
    pub async fn record_failure(&self, error: &DispatchError) {
        let mut metrics = self.metrics.write().await;
        metrics.attempts += 1;
        metrics.last_failure = Some(Instant::now());

        match error {
            DispatchError::Encoding(_) => metrics.encoding_failures += 1,
            DispatchError::Transport(e) => {
                metrics.transport_failures += 1;
                if matches!(e, TransportError::Timeout(_)) {
                    metrics.timeouts += 1;
                }
            }
            DispatchError::NonSuccessStatus { status, .. } => {
                metrics.non_success_statuses += 1;
                metrics.last_status = Some(*status);
            }
        }
    }

    /// Gets a snapshot of the current metrics
    pub async fn get_snapshot(&self) -> DispatchMetrics {
        (*self.metrics.read().await).clone()
    }
}
