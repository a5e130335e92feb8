//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the device relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Filesystem layout of documents and the action queue.
    pub storage: StorageConfig,

    /// Action queue behaviour.
    pub queue: QueueConfig,

    /// Shared-secret key sources.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Storage layout.
///
/// List, info and catalog documents live directly under `root_dir`; request
/// and response envelopes live under `root_dir/queries_dir`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding list/info/catalog documents.
    pub root_dir: PathBuf,

    /// Name of the queue subdirectory inside the root.
    pub queries_dir: String,

    /// Name of the debug sentinel file inside the queue subdirectory.
    pub debug_sentinel: String,

    /// Create missing directories at startup instead of refusing to start.
    pub create_dirs: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::new(),
            queries_dir: "queries".to_string(),
            debug_sentinel: "DEBUG.flg".to_string(),
            create_dirs: false,
        }
    }
}

impl StorageConfig {
    /// Absolute (or root-relative) path of the queue directory.
    pub fn queries_path(&self) -> PathBuf {
        self.root_dir.join(&self.queries_dir)
    }
}

/// How request files are published and response files consumed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// Last writer wins; responses are deleted after delivery.
    #[default]
    Legacy,
    /// Exclusive create for requests; responses are claimed before reading.
    Hardened,
}

/// Action queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct QueueConfig {
    /// Publication and consumption mode.
    pub mode: QueueMode,
}

/// Allow-list configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Keys accepted in addition to those read from `keys_file`.
    pub keys: Vec<String>,

    /// Optional file holding one key per line.
    pub keys_file: Option<PathBuf>,

    /// Reload `keys_file` when it changes on disk.
    pub watch_keys_file: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            keys_file: None,
            watch_keys_file: true,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Deadline for each individual filesystem operation in milliseconds.
    pub io_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            io_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024, // 64KB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [storage]
            root_dir = "/srv/relay"

            [auth]
            keys = ["abc"]
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.queries_dir, "queries");
        assert_eq!(config.storage.debug_sentinel, "DEBUG.flg");
        assert_eq!(config.queue.mode, QueueMode::Legacy);
        assert_eq!(config.timeouts.io_ms, 5_000);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(
            config.storage.queries_path(),
            PathBuf::from("/srv/relay/queries")
        );
    }

    #[test]
    fn test_queue_mode_parses_lowercase() {
        let config: RelayConfig = toml::from_str(
            r#"
            [queue]
            mode = "hardened"
            "#,
        )
        .unwrap();
        assert_eq!(config.queue.mode, QueueMode::Hardened);
    }
}
