//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming lookup:
//!     → auth.rs (shared-secret key against the allow-list)
//!     → paths.rs (caller-supplied identifiers stay inside the root)
//!     → Pass to routing / queue
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Checks run before any filesystem access
//! - No trust in client input

pub mod auth;
pub mod paths;

pub use auth::{AuthGate, KeyAllowList, ReloadableAllowList, StaticAllowList};
