// Standard library
use std::time::Duration;

// 3rd party crates
use thiserror::Error;

// Project imports
use crate::utility::rate_limiter::RateLimitError;

/// The payload could not be turned into a request body.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Failed to serialize payload as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The request could not be sent or its response could not be read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

/// Why a single dispatch attempt failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("API responded with HTTP {status}: {body}")]
    NonSuccessStatus { status: u16, body: String },
}

/// Errors raised while building the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to build HTTP sender: {0}")]
    Sender(#[from] TransportError),

    #[error("Failed to start rate limiter: {0}")]
    RateLimit(#[from] RateLimitError),
}
