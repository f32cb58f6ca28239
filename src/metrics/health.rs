// Standard library
use std::sync::Arc;

// 3rd party crates
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

// Project imports
use crate::api::errors::DispatchError;

/// Snapshot of how the remote document API has been answering
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the API is considered healthy at the time of the snapshot
    pub healthy: bool,
    /// Last accepted document
    pub last_success: Option<Instant>,
    /// Last transport failure or non-success status
    pub last_failure: Option<Instant>,
    /// Most recent API failure, cleared on success
    pub error: Option<String>,
    /// Number of API failures since the last success
    pub consecutive_failures: u32,
}

/// Thresholds after which the API is reported unhealthy
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Maximum allowed consecutive failures
    pub max_consecutive_failures: u32,
    /// How long the API may keep failing without a single success
    pub max_time_without_success: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 3,
            max_time_without_success: Duration::from_secs(900), // 15 minutes
        }
    }
}

#[derive(Debug)]
struct HealthState {
    /// Last success, or the moment tracking started.
    healthy_since: Instant,
    last_success: Option<Instant>,
    last_failure: Option<Instant>,
    error: Option<String>,
    consecutive_failures: u32,
}

/// Tracks whether the document API keeps rejecting submissions.
///
/// Only failures the API is responsible for count: transport errors and
/// non-success statuses. A payload that cannot be encoded never reaches the
/// network and leaves the health untouched.
#[derive(Debug)]
pub struct HealthChecker {
    state: Arc<RwLock<HealthState>>,
    config: HealthConfig,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::with_config(HealthConfig::default())
    }

    pub fn with_config(config: HealthConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(HealthState {
                healthy_since: Instant::now(),
                last_success: None,
                last_failure: None,
                error: None,
                consecutive_failures: 0,
            })),
            config,
        }
    }

    pub async fn record_success(&self) {
        let now = Instant::now();
        let mut state = self.state.write().await;
        state.healthy_since = now;
        state.last_success = Some(now);
        state.consecutive_failures = 0;
        state.error = None;
    }

    /// Records a failed dispatch.
    ///
    /// Returns `true` when this failure turned a healthy API unhealthy.
    pub async fn record_failure(&self, error: &DispatchError) -> bool {
        if matches!(error, DispatchError::Encoding(_)) {
            return false;
        }

        let now = Instant::now();
        let mut state = self.state.write().await;
        let was_healthy = self.evaluate(&state, now);

        state.last_failure = Some(now);
        state.consecutive_failures += 1;
        state.error = Some(error.to_string());

        was_healthy && !self.evaluate(&state, now)
    }

    pub async fn get_status(&self) -> HealthStatus {
        let state = self.state.read().await;
        HealthStatus {
            healthy: self.evaluate(&state, Instant::now()),
            last_success: state.last_success,
            last_failure: state.last_failure,
            error: state.error.clone(),
            consecutive_failures: state.consecutive_failures,
        }
    }

    pub async fn is_healthy(&self) -> bool {
        let state = self.state.read().await;
        self.evaluate(&state, Instant::now())
    }

    fn evaluate(&self, state: &HealthState, now: Instant) -> bool {
        if state.consecutive_failures == 0 {
            return true;
        }
        if state.consecutive_failures >= self.config.max_consecutive_failures {
            return false;
        }
        now.duration_since(state.healthy_since) <= self.config.max_time_without_success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::errors::{EncodingError, TransportError};

    fn server_error() -> DispatchError {
        DispatchError::NonSuccessStatus {
            status: 500,
            body: "internal error".into(),
        }
    }

    fn encoding_error() -> DispatchError {
        DispatchError::Encoding(EncodingError::Json(serde::ser::Error::custom("bad payload")))
    }

    #[tokio::test]
    async fn unhealthy_after_threshold_and_recovers_on_success() {
        let checker = HealthChecker::with_config(HealthConfig {
            max_consecutive_failures: 2,
            ..HealthConfig::default()
        });

        assert!(!checker.record_failure(&server_error()).await);
        assert!(checker.is_healthy().await);

        assert!(checker.record_failure(&server_error()).await);
        let status = checker.get_status().await;
        assert!(!status.healthy);
        assert_eq!(status.consecutive_failures, 2);
        assert!(status.error.is_some_and(|e| e.contains("500")));

        // Already unhealthy, so no second transition.
        assert!(!checker.record_failure(&server_error()).await);

        checker.record_success().await;
        let status = checker.get_status().await;
        assert!(status.healthy);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn encoding_failures_leave_health_unchanged() {
        let checker = HealthChecker::new();

        for _ in 0..5 {
            assert!(!checker.record_failure(&encoding_error()).await);
        }

        let status = checker.get_status().await;
        assert!(status.healthy);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_failure.is_none());
        assert!(status.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_for_too_long_is_unhealthy_on_read() {
        let checker = HealthChecker::new();
        checker.record_success().await;

        tokio::time::advance(Duration::from_secs(60)).await;
        let timeout = DispatchError::Transport(TransportError::Timeout(Duration::from_secs(30)));
        assert!(!checker.record_failure(&timeout).await);
        assert!(checker.is_healthy().await);

        // No further traffic: the verdict changes with time alone.
        tokio::time::advance(Duration::from_secs(900)).await;
        assert!(!checker.is_healthy().await);
        assert!(!checker.get_status().await.healthy);

        checker.record_success().await;
        assert!(checker.is_healthy().await);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_api_without_failures_stays_healthy() {
        let checker = HealthChecker::new();
        checker.record_success().await;

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert!(checker.is_healthy().await);
    }
}
