pub mod health;
pub mod types;

pub use health::{HealthChecker, HealthConfig, HealthStatus};
pub use types::{DispatchMetrics, MetricsManager};
