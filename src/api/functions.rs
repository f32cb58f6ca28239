// Standard library
use std::time::Duration;

// 3rd party crates
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tracing::error;

// Current module imports
use super::constants::SIGNATURE_HEADER;
use super::errors::TransportError;
use super::types::OutboundRequest;

/// Creates the reqwest client used for document submissions.
pub(super) fn create_reqwest_client(timeout: Duration) -> Result<Client, TransportError> {
    let client: Client = Client::builder()
        .http1_only()
        .timeout(timeout)
        .build()
        .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            TransportError::Http(e)
        })?;

    Ok(client)
}

/// Builds the headers of a submission request.
pub(super) fn build_headers(request: &OutboundRequest) -> Result<HeaderMap, TransportError> {
    let mut headers: HeaderMap = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(request.content_type),
    );

    // Mark security-sensitive headers with `set_sensitive`.
    let mut signature: HeaderValue = HeaderValue::from_str(&request.signature).map_err(|e| {
        error!("Invalid signature format: {}", e);
        TransportError::InvalidHeaderValue(e)
    })?;
    signature.set_sensitive(true);
    headers.insert(HeaderName::from_static(SIGNATURE_HEADER), signature);

    Ok(headers)
}
