//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → handed to the Dispatcher at construction
//!
//! On keys file change:
//!     watcher.rs detects change
//!     → security::auth re-reads the allow-list
//!     → server swaps the list atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the allow-list reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::RelayConfig;
pub use schema::{
    AuthConfig, ListenerConfig, ObservabilityConfig, QueueConfig, QueueMode, SecurityConfig,
    StorageConfig, TimeoutConfig,
};
