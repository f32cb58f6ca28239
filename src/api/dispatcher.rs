// Standard library
use std::sync::Arc;

// 3rd party crates
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

// Project imports
use crate::metrics::{HealthChecker, MetricsManager};
use crate::utility::rate_limiter::AdmissionHandler;

// Current module imports
use super::constants::SUCCESS_STATUS;
use super::errors::DispatchError;
use super::traits::{Encoder, Sender};
use super::types::{DispatchReport, Dispatcher, OutboundRequest, Outcome, Submission};

impl<S, E> Dispatcher<S, E>
where
    S: Sender,
{
    pub fn new(endpoint: impl Into<String>, sender: S, encoder: E) -> Self {
        Self {
            endpoint: endpoint.into(),
            sender,
            encoder,
            metrics: Arc::new(MetricsManager::new()),
            health: Arc::new(HealthChecker::new()),
            reports: None,
        }
    }

    /// Records outcomes into the given metrics and health trackers.
    pub fn with_metrics(mut self, metrics: Arc<MetricsManager>, health: Arc<HealthChecker>) -> Self {
        self.metrics = metrics;
        self.health = health;
        self
    }

    /// Forwards every outcome handled through the rate limiter to `reports`.
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<DispatchReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Performs exactly one send attempt for `submission`.
    pub async fn dispatch<R>(&self, submission: Submission<R>) -> Outcome
    where
        E: Encoder<R>,
    {
        let body = match self.encoder.encode(&submission.payload) {
            Ok(body) => body,
            Err(e) => return Outcome::SendFailed(e.into()),
        };

        let request = OutboundRequest {
            url: self.endpoint.clone(),
            content_type: self.encoder.content_type(),
            signature: submission.signature,
            body,
        };

        match self.sender.send(request).await {
            Ok(response) if response.status == SUCCESS_STATUS => Outcome::Sent {
                status: response.status,
                body: response.body,
            },
            Ok(response) => Outcome::SendFailed(DispatchError::NonSuccessStatus {
                status: response.status,
                body: response.body,
            }),
            Err(e) => Outcome::SendFailed(e.into()),
        }
    }

    async fn record(&self, ticket: u64, outcome: &Outcome) {
        match outcome {
            Outcome::Sent { status, .. } => {
                info!(ticket, status, "Document successfully created");
                self.metrics.record_success(*status).await;
                self.health.record_success().await;
            }
            Outcome::SendFailed(e) => {
                error!(ticket, error = %e, "Document submission failed");
                self.metrics.record_failure(e).await;

                if self.health.record_failure(e).await {
                    let status = self.health.get_status().await;
                    warn!(
                        consecutive_failures = status.consecutive_failures,
                        "Document API is considered unhealthy"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl<R, S, E> AdmissionHandler<Submission<R>> for Dispatcher<S, E>
where
    R: Send + 'static,
    S: Sender + 'static,
    E: Encoder<R> + 'static,
{
    async fn admit(&self, ticket: u64, submission: Submission<R>) {
        let outcome = self.dispatch(submission).await;
        self.record(ticket, &outcome).await;

        if let Some(reports) = &self.reports {
            if reports.send(DispatchReport { ticket, outcome }).is_err() {
                debug!(ticket, "Report receiver dropped, outcome discarded");
            }
        }
    }
}
