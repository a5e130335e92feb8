//! Document routing subsystem.
//!
//! # Data Flow
//! ```text
//! Lookup (list | info | catalog=<deviceID>)
//!     → router.rs (build "<prefix>*.xml", enumerate root)
//!     → matcher.rs (evaluate name conditions)
//!     → Return: one matched file or NoMatch
//! ```
//!
//! # Design Decisions
//! - Read-only: routing never creates, moves or deletes files
//! - Literal matching only (caller data never becomes a glob)
//! - Deterministic: same directory contents always pick the same file

pub mod matcher;
pub mod router;

pub use router::{Document, DocumentKind, FileRouter};
