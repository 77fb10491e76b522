//! HTTP middleware.

pub mod logging;
mod metrics;
mod trace_id;

pub use metrics::metrics_middleware;
pub use trace_id::trace_id;
