/// Example configuration
pub const DEFAULT_CONFIG: &str = r#"
# Logging configuration
[log]
# Level can be "error", "warn", "info", "debug", or "trace"
level = "info"

# Document API configuration
[api]
url = "https://ismp.crpt.ru/api/v3/lk/documents/create"
# Signature sent with every document submitted by the demo
signature = "your_signature"
# HTTP request timeout in seconds
timeout_secs = 30

# Rate limiting: at most `max_requests` submissions per `window_millis`
[rate_limit]
max_requests = 5
window_millis = 1000
"#;

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "CRPT_CONFIG_PATH";

/// Prefix of environment variables overriding individual settings
pub const ENV_PREFIX: &str = "CRPT";

pub const DEFAULT_LOG_LEVEL: &str = "info";
