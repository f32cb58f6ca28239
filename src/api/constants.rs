/// Endpoint of the "create document" API
pub const DEFAULT_API_URL: &str = "https://ismp.crpt.ru/api/v3/lk/documents/create";

/// Header carrying the caller-supplied document signature
pub const SIGNATURE_HEADER: &str = "signature";

/// The only status code treated as a successful submission
pub const SUCCESS_STATUS: u16 = 200;

/// HTTP client settings
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

pub fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
