//! File-backed action queue.
//!
//! # Data Flow
//! ```text
//! "set":  parameters → envelope → staging file → publish → actionRequest_*.xml
//!                                                          (external consumer)
//! "resp": actionResponse_*.xml → read → body handed to transport → delete
//!                                        (kept while queries/DEBUG.flg exists)
//! ```
//!
//! # Design Decisions
//! - Requests are staged under a hidden name and published in one step, so
//!   an observer never sees a partial envelope
//! - Responses are deleted only after delivery; a failed delete is reported
//!   on its own and never turns a successful read into a failure
//! - `QueueMode::Hardened` publishes with exclusive create and claims
//!   responses by rename so one reader wins

pub mod naming;
pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{QueueMode, RelayConfig, StorageConfig};
use crate::resilience::timeouts::with_deadline;

pub use naming::ActionKey;
pub use reader::{Disposition, PendingConsume, ResponseDelivery};

/// Writer of request envelopes and consumer of response envelopes.
#[derive(Debug, Clone)]
pub struct ActionQueue {
    queries_path: PathBuf,
    queries_dir: String,
    sentinel_path: PathBuf,
    mode: QueueMode,
    io_timeout: Duration,
}

impl ActionQueue {
    pub fn new(storage: &StorageConfig, mode: QueueMode, io_timeout: Duration) -> Self {
        let queries_path = storage.queries_path();
        Self {
            sentinel_path: queries_path.join(&storage.debug_sentinel),
            queries_path,
            queries_dir: storage.queries_dir.clone(),
            mode,
            io_timeout,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            &config.storage,
            config.queue.mode,
            Duration::from_millis(config.timeouts.io_ms),
        )
    }

    pub fn queries_path(&self) -> &Path {
        &self.queries_path
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.queries_path.join(name)
    }

    /// Root-relative form used in diagnostics.
    fn display_of(&self, name: &str) -> String {
        format!("{}/{}", self.queries_dir, name)
    }
}

/// True if `path` is a regular file; a timed-out probe counts as absent.
async fn is_file(path: &Path, deadline: Duration) -> bool {
    with_deadline(deadline, tokio::fs::metadata(path))
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
