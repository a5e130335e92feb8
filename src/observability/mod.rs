//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, queue, router and auth produce:
//!     → logging.rs (structured log events, request ID in every span)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout log stream
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
