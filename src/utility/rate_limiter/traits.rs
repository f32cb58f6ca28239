// 3rd party crates
use async_trait::async_trait;

/// Receives requests once the rate limiter has admitted them.
///
/// The admission loop awaits `admit` before releasing the next request, so a
/// slow handler delays later admissions but never blocks `submit`.
#[async_trait]
pub trait AdmissionHandler<R: Send + 'static>: Send + Sync + 'static {
    /// Handle one admitted request identified by its queue ticket.
    async fn admit(&self, ticket: u64, request: R);
}
