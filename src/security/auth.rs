//! Shared-secret key validation.
//!
//! Every lookup presents a key; the gate checks it against an allow-list
//! before the request is allowed to touch the filesystem.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::AuthConfig;
use crate::observability::metrics;

/// Source of accepted keys.
pub trait KeyAllowList: Send + Sync {
    /// Returns true if `key` is an accepted key.
    fn contains(&self, key: &str) -> bool;
}

/// Fixed set of keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAllowList {
    keys: HashSet<String>,
}

impl StaticAllowList {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
        }
    }

    /// Build the list from inline keys plus the optional keys file.
    pub fn from_config(config: &AuthConfig) -> io::Result<Self> {
        let mut list = Self::new(config.keys.iter().cloned());
        if let Some(path) = &config.keys_file {
            list.keys.extend(read_keys_file(path)?);
        }
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyAllowList for StaticAllowList {
    fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

/// Parse a keys file: one key per line, `#` starts a comment line.
pub fn parse_keys(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn read_keys_file(path: &Path) -> io::Result<Vec<String>> {
    Ok(parse_keys(&fs::read_to_string(path)?))
}

/// Allow-list that can be replaced while requests are in flight.
#[derive(Default)]
pub struct ReloadableAllowList {
    current: ArcSwap<StaticAllowList>,
}

impl ReloadableAllowList {
    pub fn new(initial: StaticAllowList) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Atomically install a new list.
    pub fn replace(&self, list: StaticAllowList) {
        tracing::info!(keys = list.len(), "Allow-list replaced");
        metrics::record_allow_list_reload();
        self.current.store(Arc::new(list));
    }
}

impl KeyAllowList for ReloadableAllowList {
    fn contains(&self, key: &str) -> bool {
        self.current.load().contains(key)
    }
}

/// Gate in front of every lookup.
#[derive(Clone)]
pub struct AuthGate {
    allow_list: Arc<dyn KeyAllowList>,
}

impl AuthGate {
    pub fn new(allow_list: Arc<dyn KeyAllowList>) -> Self {
        Self { allow_list }
    }

    /// Returns true only for a non-empty key present in the allow-list.
    pub fn validate(&self, key: &str) -> bool {
        !key.is_empty() && self.allow_list.contains(key)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate").finish_non_exhaustive()
    }
}
