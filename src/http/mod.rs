//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, body collection)
//!     → request.rs (request ID, ordered field bag)
//!     → dispatch.rs (method → action, selector → auth → router/queue)
//!     → response.rs (content type, streamed consume-after-delivery)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{Action, Dispatcher, Reply, Selector};
pub use request::{MakeRequestUuid, RequestFields, X_REQUEST_ID};
pub use server::HttpServer;
