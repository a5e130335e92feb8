//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Queue or router touches the filesystem:
//!     → timeouts.rs (enforce per-operation deadline)
//!     → On expiry: surfaced as a FileError for the current request
//! ```
//!
//! # Design Decisions
//! - Reads, probes and staging writes have a deadline
//! - Steps that publish or remove a file run to completion, since a blocking
//!   rename or unlink keeps going after its future is dropped
//! - No retries: re-polling is the caller's job

pub mod timeouts;
