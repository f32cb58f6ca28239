// Standard library
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

// 3rd party crates
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// Rate limiting configuration for outbound requests
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of requests per time window
    pub max_requests: u32,
    /// Time window in milliseconds
    pub window_millis: u64,
}

/// A request sitting in the admission queue.
#[derive(Debug)]
pub struct Queued<R> {
    pub ticket: u64,
    pub request: R,
}

/// Trailing log of admission instants.
///
/// Holds at most `max_requests` instants, none older than `window`.
#[derive(Debug)]
pub struct AdmissionWindow {
    pub(super) window: Duration,
    pub(super) max_requests: usize,
    pub(super) admitted: VecDeque<Instant>,
}

/// Producer half of the queue. Tickets are handed out under the same lock as
/// the enqueue so ticket order is queue order.
pub(super) struct SubmitSide<R> {
    pub next_ticket: u64,
    pub queue: mpsc::UnboundedSender<Queued<R>>,
}

/// Rate limiter owning the admission queue and its background admission task.
pub struct RateLimiter<R> {
    pub(super) submit_side: Mutex<SubmitSide<R>>,
    pub(super) pending: Arc<AtomicUsize>,
    pub(super) shutdown_tx: broadcast::Sender<()>,
    pub(super) worker: JoinHandle<()>,
}
