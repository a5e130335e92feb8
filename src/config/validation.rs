//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that queue names stay inside the root directory
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::{Component, Path};

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.storage.root_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("storage.root_dir", "must be set"));
    }
    if !is_plain_name(&config.storage.queries_dir) {
        errors.push(ValidationError::new(
            "storage.queries_dir",
            "must be a single directory name",
        ));
    }
    if !is_plain_name(&config.storage.debug_sentinel) {
        errors.push(ValidationError::new(
            "storage.debug_sentinel",
            "must be a single file name",
        ));
    }

    if config.auth.keys.is_empty() && config.auth.keys_file.is_none() {
        errors.push(ValidationError::new(
            "auth",
            "either auth.keys or auth.keys_file must be configured",
        ));
    }
    if config.auth.keys.iter().any(|k| k.trim().is_empty()) {
        errors.push(ValidationError::new("auth.keys", "keys must not be blank"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.timeouts.io_ms == 0 {
        errors.push(ValidationError::new("timeouts.io_ms", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// True when `name` is exactly one normal path component.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> RelayConfig {
        let mut config = RelayConfig::default();
        config.storage.root_dir = "/srv/relay".into();
        config.auth.keys = vec!["secret".into()];
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = valid_config();
        config.storage.root_dir = "".into();
        config.storage.queries_dir = "../outside".into();
        config.timeouts.io_ms = 0;
        config.auth.keys.clear();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["storage.root_dir", "storage.queries_dir", "auth", "timeouts.io_ms"]
        );
    }

    #[test]
    fn test_sentinel_must_be_plain_name() {
        let mut config = valid_config();
        config.storage.debug_sentinel = "sub/DEBUG.flg".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "storage.debug_sentinel");
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
