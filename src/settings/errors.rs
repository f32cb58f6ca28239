// 3rd party crates
use thiserror::Error;

// Project imports
use crate::utility::rate_limiter::RateLimitError;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid log level: {0}. Must be one of: error, warn, info, debug, trace")]
    InvalidLogLevel(String),
    #[error("Invalid API url '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },
    #[error("API timeout must be greater than 0, got {0}")]
    InvalidTimeout(u64),
    #[error("Rate limit configuration error: {0}")]
    RateLimit(#[from] RateLimitError),
}
