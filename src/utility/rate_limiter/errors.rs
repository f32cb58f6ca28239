// 3rd party crates
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),
}
