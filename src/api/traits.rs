// 3rd party crates
use async_trait::async_trait;

// Current module imports
use super::errors::{EncodingError, TransportError};
use super::types::{OutboundRequest, SenderResponse};

/// Transport used to deliver a single request.
///
/// Implementations perform exactly one attempt per call. Any response that
/// arrives, whatever its status, is returned as `Ok`; only failures to obtain
/// a response are errors.
///
/// # Example Implementation
///
/// ```rust
/// # use async_trait::async_trait;
/// # use crpt_api::api::{OutboundRequest, Sender, SenderResponse, TransportError};
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl Sender for AlwaysOk {
///     async fn send(&self, _request: OutboundRequest) -> Result<SenderResponse, TransportError> {
///         Ok(SenderResponse {
///             status: 200,
///             body: "{}".to_string(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Sender: Send + Sync {
    /// Sends `request` and returns the status code and body of the response.
    async fn send(&self, request: OutboundRequest) -> Result<SenderResponse, TransportError>;
}

/// Serializes a payload into a request body.
pub trait Encoder<R>: Send + Sync {
    /// Value of the `Content-Type` header for bodies produced by this encoder.
    fn content_type(&self) -> &'static str;

    /// Encodes `payload` into the wire format.
    fn encode(&self, payload: &R) -> Result<Vec<u8>, EncodingError>;
}
