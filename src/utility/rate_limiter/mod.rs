//! FIFO admission queue with a per-window quota.
//!
//! Callers hand requests to [`RateLimiter::submit`], which only appends to an
//! unbounded queue and returns a ticket. A single admission task, spawned when
//! the limiter is built, pops requests in ticket order and releases each one to
//! an [`AdmissionHandler`] once fewer than `max_requests` admissions happened
//! in the trailing window. The handler is awaited before the next admission,
//! so at most one request is ever in flight.

pub mod errors;
pub mod impls;
pub mod traits;
pub mod types;

pub use errors::RateLimitError;
pub use traits::AdmissionHandler;
pub use types::{AdmissionWindow, RateLimitConfig, RateLimiter};
