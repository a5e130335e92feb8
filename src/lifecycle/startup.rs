//! Startup orchestration.
//!
//! # Responsibilities
//! - Make sure the root and queue directories exist
//! - Build the initial allow-list
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Directories are only created when `storage.create_dirs` asks for it

use std::io;
use std::path::{Path, PathBuf};

use crate::config::{AuthConfig, StorageConfig};
use crate::security::StaticAllowList;

/// Error type for startup checks.
#[derive(Debug)]
pub enum StartupError {
    /// A required directory does not exist.
    MissingDirectory(PathBuf),
    /// A directory could not be created.
    CreateDirectory(PathBuf, io::Error),
    /// The allow-list could not be read.
    AllowList(io::Error),
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::MissingDirectory(p) => {
                write!(f, "required directory NOT found [{}]", p.display())
            }
            StartupError::CreateDirectory(p, e) => {
                write!(f, "Failed to create directory [{}]: {}", p.display(), e)
            }
            StartupError::AllowList(e) => write!(f, "Failed to read allow-list: {}", e),
        }
    }
}

impl std::error::Error for StartupError {}

/// Check (or create) the root directory and its queue subdirectory.
pub fn prepare_storage(config: &StorageConfig) -> Result<(), StartupError> {
    for dir in [config.root_dir.clone(), config.queries_path()] {
        ensure_directory(&dir, config.create_dirs)?;
    }
    tracing::info!(
        root = %config.root_dir.display(),
        queries = %config.queries_path().display(),
        "Storage ready"
    );
    Ok(())
}

fn ensure_directory(dir: &Path, create: bool) -> Result<(), StartupError> {
    if dir.is_dir() {
        return Ok(());
    }
    if !create {
        return Err(StartupError::MissingDirectory(dir.to_path_buf()));
    }
    std::fs::create_dir_all(dir).map_err(|e| StartupError::CreateDirectory(dir.to_path_buf(), e))?;
    tracing::info!(path = %dir.display(), "Created directory");
    Ok(())
}

/// Build the initial allow-list from inline keys and the keys file.
pub fn load_allow_list(config: &AuthConfig) -> Result<StaticAllowList, StartupError> {
    let list = StaticAllowList::from_config(config).map_err(StartupError::AllowList)?;
    if list.is_empty() {
        tracing::warn!("Allow-list is empty; every lookup will be rejected");
    } else {
        tracing::info!(keys = list.len(), "Allow-list loaded");
    }
    Ok(list)
}
