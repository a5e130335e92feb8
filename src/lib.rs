//! Device relay library.
//!
//! HTTP front end that serves device documents from a root directory and
//! relays action requests/responses to a controller through a shared queue
//! directory.

pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod queue;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::StaticAllowList;
