// Standard library
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

// 3rd party crates
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, error, info, trace, warn};

use super::errors::RateLimitError;
use super::traits::AdmissionHandler;
use super::types::{AdmissionWindow, Queued, RateLimitConfig, RateLimiter, SubmitSide};

impl RateLimitConfig {
    /// Sub-millisecond windows are rounded up to the next whole millisecond.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let window_millis = window.as_nanos().div_ceil(1_000_000);
        Self {
            max_requests,
            window_millis: u64::try_from(window_millis).unwrap_or(u64::MAX),
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_millis)
    }

    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.max_requests == 0 {
            return Err(RateLimitError::InvalidConfig(
                "max_requests must be greater than 0".into(),
            ));
        }

        if self.window_millis == 0 {
            return Err(RateLimitError::InvalidConfig(
                "window_millis must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl AdmissionWindow {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests: max_requests as usize,
            admitted: VecDeque::with_capacity(max_requests as usize),
        }
    }

    /// Records an admission at `now` if the trailing window has room.
    ///
    /// On refusal returns the instant at which the oldest admission leaves the
    /// window, which is the earliest moment a retry can succeed.
    pub fn try_admit(&mut self, now: Instant) -> Result<(), Instant> {
        while let Some(&oldest) = self.admitted.front() {
            if now.duration_since(oldest) >= self.window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }

        match self.admitted.front() {
            Some(&oldest) if self.admitted.len() >= self.max_requests => Err(oldest + self.window),
            _ => {
                self.admitted.push_back(now);
                Ok(())
            }
        }
    }

    /// Number of admissions still counted against the quota at `now`.
    pub fn in_window(&self, now: Instant) -> usize {
        self.admitted
            .iter()
            .filter(|admitted| now.duration_since(**admitted) < self.window)
            .count()
    }
}

impl<R: Send + 'static> RateLimiter<R> {
    /// Create a rate limiter and start its admission task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<H>(config: RateLimitConfig, handler: H) -> Result<Self, RateLimitError>
    where
        H: AdmissionHandler<R>,
    {
        config.validate()?;

        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let pending = Arc::new(AtomicUsize::new(0));
        let window = AdmissionWindow::new(config.window(), config.max_requests);

        info!(
            max_requests = config.max_requests,
            window_ms = config.window_millis,
            "Starting admission loop"
        );

        let worker = tokio::spawn(admission_loop(
            queue_rx,
            shutdown_rx,
            window,
            handler,
            Arc::clone(&pending),
        ));

        Ok(Self {
            submit_side: Mutex::new(SubmitSide {
                next_ticket: 0,
                queue: queue_tx,
            }),
            pending,
            shutdown_tx,
            worker,
        })
    }

    /// Append a request to the tail of the admission queue and return its ticket.
    ///
    /// Never blocks on admission or I/O. If the admission loop has already
    /// stopped the request is dropped and a warning is logged.
    pub fn submit(&self, request: R) -> u64 {
        let mut side = self
            .submit_side
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let ticket = side.next_ticket;
        side.next_ticket += 1;

        self.pending.fetch_add(1, Ordering::SeqCst);
        if side.queue.send(Queued { ticket, request }).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(ticket, "Admission loop is not running, dropping request");
        } else {
            trace!(ticket, "Request queued");
        }

        ticket
    }

    /// Number of requests waiting for admission.
    pub fn queued(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting requests and wait until everything queued has been handled.
    pub async fn finish(self) {
        let Self {
            submit_side,
            shutdown_tx,
            worker,
            ..
        } = self;

        // Dropping the producer half lets the loop drain the queue and exit.
        drop(submit_side);

        if let Err(e) = worker.await {
            error!("Admission loop terminated abnormally: {}", e);
        }
        drop(shutdown_tx);
    }

    /// Stop the admission loop after the in-flight request, discarding the rest.
    pub async fn shutdown(self) {
        // No receiver means the loop is already gone.
        let _ = self.shutdown_tx.send(());

        if let Err(e) = self.worker.await {
            error!("Admission loop terminated abnormally: {}", e);
        }
    }
}

/// Pops requests in FIFO order and releases each one to `handler` as soon as
/// the window has room for it.
async fn admission_loop<R, H>(
    mut queue: mpsc::UnboundedReceiver<Queued<R>>,
    mut shutdown_rx: broadcast::Receiver<()>,
    mut window: AdmissionWindow,
    handler: H,
    pending: Arc<AtomicUsize>,
) where
    R: Send + 'static,
    H: AdmissionHandler<R>,
{
    loop {
        let queued: Queued<R> = tokio::select! {
            biased;

            Ok(_) = shutdown_rx.recv() => {
                abandon_queue(&mut queue, 0, &pending);
                return;
            }

            next = queue.recv() => match next {
                Some(queued) => queued,
                None => {
                    debug!("Admission queue closed and drained");
                    return;
                }
            },
        };

        while let Err(ready_at) = window.try_admit(Instant::now()) {
            debug!(
                ticket = queued.ticket,
                wait_ms = ready_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                "Quota exhausted, waiting for the window to move"
            );

            tokio::select! {
                biased;

                Ok(_) = shutdown_rx.recv() => {
                    abandon_queue(&mut queue, 1, &pending);
                    return;
                }

                _ = sleep_until(ready_at) => {}
            }
        }

        // Only now does the request stop waiting for admission.
        pending.fetch_sub(1, Ordering::SeqCst);
        trace!(
            ticket = queued.ticket,
            in_window = window.in_window(Instant::now()),
            "Request admitted"
        );
        handler.admit(queued.ticket, queued.request).await;
    }
}

/// Closes the queue and discards whatever is left in it.
fn abandon_queue<R>(
    queue: &mut mpsc::UnboundedReceiver<Queued<R>>,
    in_hand: usize,
    pending: &AtomicUsize,
) {
    queue.close();

    pending.fetch_sub(in_hand, Ordering::SeqCst);
    let mut abandoned = in_hand;
    while queue.try_recv().is_ok() {
        pending.fetch_sub(1, Ordering::SeqCst);
        abandoned += 1;
    }

    if abandoned > 0 {
        warn!(abandoned, "Admission loop stopped with requests still queued");
    } else {
        info!("Admission loop stopped");
    }
}
