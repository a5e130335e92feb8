//! Request envelope publication ("set").

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::config::QueueMode;
use crate::envelope::{EnvelopeWriter, Parameter};
use crate::error::{FileOp, RelayError, RelayResult};
use crate::observability::metrics;
use crate::queue::naming::{staging_name, ActionKey, REQUEST_PREFIX};
use crate::queue::ActionQueue;
use crate::resilience::timeouts::with_deadline;

/// Format of the `timeRequested` attribute.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in [`TIME_FORMAT`].
pub fn time_requested_now() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

impl ActionQueue {
    /// Write the request envelope for `key`, stamped with the current time.
    pub async fn write_request(
        &self,
        key: ActionKey,
        parameters: &[Parameter],
    ) -> RelayResult<PathBuf> {
        self.write_request_at(key, parameters, &time_requested_now())
            .await
    }

    /// Write the request envelope for `key` with an explicit timestamp.
    pub async fn write_request_at(
        &self,
        key: ActionKey,
        parameters: &[Parameter],
        time_requested: &str,
    ) -> RelayResult<PathBuf> {
        let name = key.request_file_name();
        let target = self.path_of(&name);
        let staging = self.path_of(&staging_name(&name));
        let shown = self.display_of(&name);

        let bytes = EnvelopeWriter::new(REQUEST_PREFIX)
            .attribute("actionId", key.padded_action_id())
            .attribute("timeRequested", time_requested)
            .parameters(parameters)
            .render();

        let result = match self.stage(&staging, &bytes).await {
            Ok(()) => self.publish(&staging, &target).await,
            Err(e) => Err(e),
        };

        if let Err((op, source)) = result {
            if let Err(e) = fs::remove_file(&staging).await {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %staging.display(), error = %e, "Failed to clean up staging file");
                }
            }
            tracing::error!(path = %shown, op = %op, error = %source, "Request write failed");
            return Err(RelayError::file(op, shown, source));
        }

        metrics::record_request_written();
        tracing::info!(
            action = %key,
            parameters = parameters.len(),
            path = %shown,
            mode = ?self.mode,
            "Action request written"
        );
        Ok(target)
    }

    /// Write, flush and sync the full envelope under its hidden staging name.
    async fn stage(&self, staging: &Path, bytes: &[u8]) -> Result<(), (FileOp, io::Error)> {
        let deadline = self.io_timeout;
        let mut file = with_deadline(
            deadline,
            OpenOptions::new().write(true).create_new(true).open(staging),
        )
        .await
        .map_err(|e| (FileOp::Open, e))?;

        with_deadline(deadline, file.write_all(bytes))
            .await
            .map_err(|e| (FileOp::Write, e))?;
        with_deadline(deadline, file.flush())
            .await
            .map_err(|e| (FileOp::Flush, e))?;
        with_deadline(deadline, file.sync_all())
            .await
            .map_err(|e| (FileOp::Flush, e))?;
        Ok(())
    }

    /// Make the staged envelope visible under its canonical name.
    ///
    /// No deadline here: a blocking rename or link cannot be cancelled, so a
    /// timeout would report a failure for an envelope that still appears.
    async fn publish(&self, staging: &Path, target: &Path) -> Result<(), (FileOp, io::Error)> {
        match self.mode {
            QueueMode::Legacy => fs::rename(staging, target)
                .await
                .map_err(|e| (FileOp::Publish, e)),
            QueueMode::Hardened => {
                fs::hard_link(staging, target)
                    .await
                    .map_err(|e| (FileOp::Publish, e))?;
                if let Err(e) = fs::remove_file(staging).await {
                    tracing::warn!(path = %staging.display(), error = %e, "Failed to remove staging link");
                }
                Ok(())
            }
        }
    }
}
