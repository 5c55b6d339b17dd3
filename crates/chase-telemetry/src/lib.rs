//! Prometheus metrics and structured logging for the chaser.
//!
//! - Prometheus counters and gauges for placements, cancels and reprices
//! - Structured logging with tracing (pretty or JSON)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
