//! Response envelope consumption ("resp").

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs;

use crate::config::QueueMode;
use crate::error::{FileOp, RelayError, RelayResult};
use crate::observability::metrics;
use crate::queue::naming::{claim_name, ActionKey};
use crate::queue::{is_file, ActionQueue};
use crate::resilience::timeouts::with_deadline;

/// What happened to a response file after delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Removed; later reads see NotFound.
    Deleted,
    /// Left in place because the debug sentinel exists.
    Retained,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Deleted => "deleted",
            Disposition::Retained => "retained",
        }
    }
}

/// A response read from the queue, not yet consumed.
#[derive(Debug)]
pub struct ResponseDelivery {
    body: Vec<u8>,
    pending: PendingConsume,
}

impl ResponseDelivery {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Split into the bytes to send and the step to run once they are sent.
    pub fn into_parts(self) -> (Vec<u8>, PendingConsume) {
        (self.body, self.pending)
    }

    /// Consume immediately, for callers that already delivered the body.
    pub async fn finish(self) -> RelayResult<Disposition> {
        self.pending.complete().await
    }
}

/// Deletion (or retention) of a delivered response.
///
/// Dropping it without calling [`PendingConsume::complete`] leaves the
/// response retrievable.
#[derive(Debug)]
pub struct PendingConsume {
    original: PathBuf,
    display: String,
    sentinel: PathBuf,
    io_timeout: Duration,
    claim: Option<ClaimGuard>,
}

impl PendingConsume {
    /// Delete the response unless the debug sentinel is present.
    ///
    /// Only the sentinel probe is bounded by the deadline; the final delete or
    /// restore runs to completion.
    pub async fn complete(mut self) -> RelayResult<Disposition> {
        let retain = is_file(&self.sentinel, self.io_timeout).await;

        let disposition = match self.claim.take() {
            None if retain => Disposition::Retained,
            None => match fs::remove_file(&self.original).await {
                // another reader got there first; the file is gone either way
                Ok(()) => Disposition::Deleted,
                Err(e) if e.kind() == io::ErrorKind::NotFound => Disposition::Deleted,
                Err(source) => return Err(self.remove_failed(source)),
            },
            Some(guard) => {
                let claim = guard.disarm();
                if retain {
                    fs::rename(&claim, &self.original)
                        .await
                        .map_err(|e| RelayError::file(FileOp::Restore, self.display.clone(), e))?;
                    Disposition::Retained
                } else {
                    fs::remove_file(&claim)
                        .await
                        .map_err(|e| self.remove_failed(e))?;
                    Disposition::Deleted
                }
            }
        };

        metrics::record_response_consumed(disposition.as_str());
        tracing::info!(
            path = %self.display,
            disposition = disposition.as_str(),
            "Action response consumed"
        );
        Ok(disposition)
    }

    fn remove_failed(&self, source: io::Error) -> RelayError {
        tracing::error!(path = %self.display, error = %source, "Delivered response could not be removed");
        RelayError::RemoveFailed {
            path: self.display.clone(),
            source,
        }
    }
}

/// Ownership of a response moved aside under a hidden claim name.
///
/// Restores the original name on drop unless disarmed.
#[derive(Debug)]
struct ClaimGuard {
    claim: PathBuf,
    original: PathBuf,
    armed: bool,
}

impl ClaimGuard {
    fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.claim)
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // Drop cannot await; a single blocking rename on the worker is accepted.
        match std::fs::rename(&self.claim, &self.original) {
            Ok(()) => tracing::debug!(path = %self.original.display(), "Abandoned claim restored"),
            Err(e) => tracing::warn!(
                claim = %self.claim.display(),
                error = %e,
                "Failed to restore abandoned claim"
            ),
        }
    }
}

impl ActionQueue {
    /// Read the response envelope for `key`.
    ///
    /// The file stays in place until the returned delivery is completed.
    pub async fn read_response(&self, key: ActionKey) -> RelayResult<ResponseDelivery> {
        let name = key.response_file_name();
        let original = self.path_of(&name);
        let shown = self.display_of(&name);
        let deadline = self.io_timeout;

        let not_ready = |path: &str| RelayError::ResponseNotReady {
            path: path.to_string(),
        };

        let (body, claim) = match self.mode {
            QueueMode::Legacy => {
                let body = match with_deadline(deadline, fs::read(&original)).await {
                    Ok(body) => body,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_ready(&shown)),
                    Err(e) => return Err(RelayError::file(FileOp::Read, shown, e)),
                };
                (body, None)
            }
            QueueMode::Hardened => {
                let claim_path = self.path_of(&claim_name(&name));
                // unbounded: a timed-out rename could still land and strand the claim
                match fs::rename(&original, &claim_path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_ready(&shown)),
                    Err(e) => return Err(RelayError::file(FileOp::Claim, shown, e)),
                }
                let guard = ClaimGuard {
                    claim: claim_path,
                    original: original.clone(),
                    armed: true,
                };
                // on failure the guard puts the response back
                let body = with_deadline(deadline, fs::read(&guard.claim))
                    .await
                    .map_err(|e| RelayError::file(FileOp::Read, shown.clone(), e))?;
                (body, Some(guard))
            }
        };

        tracing::debug!(action = %key, path = %shown, bytes = body.len(), "Action response read");
        Ok(ResponseDelivery {
            body,
            pending: PendingConsume {
                original,
                display: shown,
                sentinel: self.sentinel_path.clone(),
                io_timeout: deadline,
                claim,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::error::ErrorKind;
    use std::path::Path;

    const BODY: &[u8] = b"<?xml version=\"1.0\"?>\n<actionResponse actionId=\"00007\"/>\n";

    fn queue_in(dir: &Path, mode: QueueMode) -> ActionQueue {
        let storage = StorageConfig {
            root_dir: dir.to_path_buf(),
            ..StorageConfig::default()
        };
        std::fs::create_dir_all(storage.queries_path()).unwrap();
        ActionQueue::new(&storage, mode, Duration::from_secs(5))
    }

    fn place_response(queue: &ActionQueue, key: ActionKey) -> PathBuf {
        let path = queue.queries_path().join(key.response_file_name());
        std::fs::write(&path, BODY).unwrap();
        path
    }

    fn set_debug(queue: &ActionQueue) {
        std::fs::write(queue.queries_path().join("DEBUG.flg"), b"").unwrap();
    }

    fn entry_count(queue: &ActionQueue) -> usize {
        std::fs::read_dir(queue.queries_path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_missing_response_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        for mode in [QueueMode::Legacy, QueueMode::Hardened] {
            let queue = queue_in(dir.path(), mode);
            let err = queue.read_response(ActionKey::new(7, 42)).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(
                err.diagnostic(),
                "ERROR- File NOT found! desiredFileSpec=[queries/actionResponse_00007_00000042.xml]\n"
            );
        }
    }

    #[tokio::test]
    async fn test_read_once_then_not_found() {
        for mode in [QueueMode::Legacy, QueueMode::Hardened] {
            let dir = tempfile::tempdir().unwrap();
            let queue = queue_in(dir.path(), mode);
            let key = ActionKey::new(7, 42);
            let path = place_response(&queue, key);

            let delivery = queue.read_response(key).await.unwrap();
            assert_eq!(delivery.body(), BODY);
            assert_eq!(delivery.finish().await.unwrap(), Disposition::Deleted);
            assert!(!path.exists());

            let err = queue.read_response(key).await.unwrap_err();
            assert!(matches!(err, RelayError::ResponseNotReady { .. }), "{mode:?}");
            assert_eq!(entry_count(&queue), 0);
        }
    }

    #[tokio::test]
    async fn test_debug_sentinel_retains_response() {
        for mode in [QueueMode::Legacy, QueueMode::Hardened] {
            let dir = tempfile::tempdir().unwrap();
            let queue = queue_in(dir.path(), mode);
            let key = ActionKey::new(3, 1);
            let path = place_response(&queue, key);
            set_debug(&queue);

            let first = queue.read_response(key).await.unwrap();
            let first_body = first.body().to_vec();
            assert_eq!(first.finish().await.unwrap(), Disposition::Retained);

            let second = queue.read_response(key).await.unwrap();
            assert_eq!(second.body(), first_body.as_slice());
            assert_eq!(second.finish().await.unwrap(), Disposition::Retained);
            assert!(path.exists());
        }
    }

    #[tokio::test]
    async fn test_file_stays_until_completed() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(dir.path(), QueueMode::Legacy);
        let key = ActionKey::new(4, 4);
        let path = place_response(&queue, key);

        let (body, pending) = queue.read_response(key).await.unwrap().into_parts();
        assert_eq!(body, BODY);
        assert!(path.exists());
        assert_eq!(pending.complete().await.unwrap(), Disposition::Deleted);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_hardened_claim_excludes_second_reader() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(dir.path(), QueueMode::Hardened);
        let key = ActionKey::new(5, 6);
        place_response(&queue, key);

        let winner = queue.read_response(key).await.unwrap();
        let loser = queue.read_response(key).await.unwrap_err();
        assert_eq!(loser.kind(), ErrorKind::NotFound);

        assert_eq!(winner.finish().await.unwrap(), Disposition::Deleted);
        assert_eq!(entry_count(&queue), 0);
    }

    #[tokio::test]
    async fn test_hardened_abandoned_delivery_is_restored() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(dir.path(), QueueMode::Hardened);
        let key = ActionKey::new(8, 8);
        let path = place_response(&queue, key);

        let delivery = queue.read_response(key).await.unwrap();
        assert!(!path.exists());
        drop(delivery);

        assert!(path.exists());
        let again = queue.read_response(key).await.unwrap();
        assert_eq!(again.body(), BODY);
    }

    /// Put a non-empty directory where a file is expected, so unlinking it fails.
    fn block_removal(path: &Path) {
        let _ = std::fs::remove_file(path);
        std::fs::create_dir(path).unwrap();
        std::fs::write(path.join("occupant"), b"x").unwrap();
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported_separately() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(dir.path(), QueueMode::Legacy);
        let key = ActionKey::new(9, 10);
        let path = place_response(&queue, key);

        let delivery = queue.read_response(key).await.unwrap();
        assert_eq!(delivery.body(), BODY);
        block_removal(&path);

        let err = delivery.finish().await.unwrap_err();
        assert!(matches!(err, RelayError::RemoveFailed { .. }));
        assert_eq!(err.kind(), ErrorKind::File);
        assert_eq!(
            err.diagnostic(),
            "ERROR- Failed to remove file! desiredFileSpec=[queries/actionResponse_00009_00000010.xml]\n"
        );
    }

    #[tokio::test]
    async fn test_hardened_claim_removal_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(dir.path(), QueueMode::Hardened);
        let key = ActionKey::new(9, 11);
        place_response(&queue, key);

        let delivery = queue.read_response(key).await.unwrap();
        let claim = delivery.pending.claim.as_ref().unwrap().claim.clone();
        block_removal(&claim);

        let err = delivery.finish().await.unwrap_err();
        assert!(matches!(err, RelayError::RemoveFailed { .. }));
        assert!(err
            .diagnostic()
            .starts_with("ERROR- Failed to remove file! desiredFileSpec=[queries/actionResponse_00009_00000011.xml]"));
    }

    #[tokio::test]
    async fn test_final_delete_ignores_io_deadline() {
        let dir = tempfile::tempdir().unwrap();
        for mode in [QueueMode::Legacy, QueueMode::Hardened] {
            let queue = queue_in(dir.path(), mode);
            let key = ActionKey::new(12, 1);
            let path = place_response(&queue, key);

            let mut delivery = queue.read_response(key).await.unwrap();
            // only the sentinel probe may time out; it then counts as absent
            delivery.pending.io_timeout = Duration::ZERO;

            assert_eq!(delivery.finish().await.unwrap(), Disposition::Deleted, "{mode:?}");
            assert!(!path.exists());
            assert_eq!(entry_count(&queue), 0);
        }
    }
}
