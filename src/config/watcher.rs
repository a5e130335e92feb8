//! Keys file watcher for allow-list hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::schema::AuthConfig;
use crate::security::StaticAllowList;

/// Monitors the keys file and sends a freshly built allow-list on change.
///
/// The parent directory is watched so that editors replacing the file by
/// rename are noticed too.
pub struct KeysFileWatcher {
    path: PathBuf,
    auth: AuthConfig,
    update_tx: mpsc::UnboundedSender<StaticAllowList>,
}

impl KeysFileWatcher {
    /// Create a new watcher for `auth.keys_file`.
    ///
    /// Returns `None` when no keys file is configured, otherwise the watcher
    /// and a receiver for allow-list updates.
    pub fn new(auth: &AuthConfig) -> Option<(Self, mpsc::UnboundedReceiver<StaticAllowList>)> {
        let path = auth.keys_file.clone()?;
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        Some((
            Self {
                path,
                auth: auth.clone(),
                update_tx,
            },
            update_rx,
        ))
    }

    /// Start watching in notify's background thread.
    ///
    /// The returned handle must be kept alive for as long as reloads are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let auth = self.auth.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = (event.kind.is_modify() || event.kind.is_create())
                        && event
                            .paths
                            .iter()
                            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !relevant {
                        return;
                    }
                    tracing::info!("Keys file change detected, reloading");
                    match StaticAllowList::from_config(&auth) {
                        Ok(list) => {
                            let _ = tx.send(list);
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload keys file; keeping current allow-list");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(watch_dir(&self.path), RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Keys file watcher started");
        Ok(watcher)
    }
}

fn watch_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::KeyAllowList;

    #[test]
    fn test_no_keys_file_no_watcher() {
        assert!(KeysFileWatcher::new(&AuthConfig::default()).is_none());
    }

    #[test]
    fn test_watch_dir_of_bare_name() {
        assert_eq!(watch_dir(Path::new("keys.txt")), Path::new("."));
        assert_eq!(watch_dir(Path::new("/etc/relay/keys.txt")), Path::new("/etc/relay"));
    }

    #[tokio::test]
    async fn test_change_pushes_new_list() {
        let dir = tempfile::tempdir().unwrap();
        let keys = dir.path().join("keys.txt");
        std::fs::write(&keys, "old\n").unwrap();

        let auth = AuthConfig {
            keys: vec!["inline".into()],
            keys_file: Some(keys.clone()),
            watch_keys_file: true,
        };
        let (watcher, mut rx) = KeysFileWatcher::new(&auth).unwrap();
        let _handle = watcher.run().unwrap();

        let staged = dir.path().join("keys.txt.new");
        std::fs::write(&staged, "# rotated\nfresh\n").unwrap();
        std::fs::rename(&staged, &keys).unwrap();

        let list = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let list = rx.recv().await.unwrap();
                if list.contains("fresh") {
                    return list;
                }
            }
        })
        .await
        .unwrap();
        assert!(list.contains("inline"));
        assert!(!list.contains("old"));
    }
}
