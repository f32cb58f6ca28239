// Standard library
use std::sync::Arc;
use std::time::Duration;

// 3rd party crates
use reqwest::Client;
use tokio::sync::mpsc;

// Project imports
use crate::metrics::{HealthChecker, MetricsManager};
use crate::models::Document;
use crate::utility::rate_limiter::RateLimiter;

// Current module imports
use super::errors::DispatchError;

/// A unit of work for the dispatcher: one payload plus the signature that
/// accompanies it.
#[derive(Debug, Clone)]
pub struct Submission<R> {
    pub payload: R,
    pub signature: String,
}

/// A fully encoded request, ready for a [`Sender`](super::Sender).
///
/// Always sent as `POST` to `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub url: String,
    pub content_type: &'static str,
    pub signature: String,
    pub body: Vec<u8>,
}

/// Status code and body of a response, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderResponse {
    pub status: u16,
    pub body: String,
}

/// Terminal result of one dispatch attempt.
#[derive(Debug)]
pub enum Outcome {
    Sent { status: u16, body: String },
    SendFailed(DispatchError),
}

/// Outcome of a queued request, tagged with the ticket `submit` returned.
#[derive(Debug)]
pub struct DispatchReport {
    pub ticket: u64,
    pub outcome: Outcome,
}

/// Sends admitted submissions to a single endpoint, one attempt each.
pub struct Dispatcher<S, E> {
    pub(super) endpoint: String,
    pub(super) sender: S,
    pub(super) encoder: E,
    pub(super) metrics: Arc<MetricsManager>,
    pub(super) health: Arc<HealthChecker>,
    pub(super) reports: Option<mpsc::UnboundedSender<DispatchReport>>,
}

/// [`Sender`](super::Sender) backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpSender {
    pub(super) client: Client,
    pub(super) timeout: Duration,
}

/// Encodes any serde-serializable payload as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

/// Rate-limited client for the "create document" API.
pub struct CrptApi {
    pub(super) limiter: RateLimiter<Submission<Document>>,
    pub(super) metrics: Arc<MetricsManager>,
    pub(super) health: Arc<HealthChecker>,
}
