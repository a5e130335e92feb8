//! Document lookup under the root directory.
//!
//! # Responsibilities
//! - Turn a list/info/catalog lookup into a `<prefix>*.xml` pattern
//! - Enumerate the root directory and pick one regular file
//! - Return the chosen file or an explicit NotFound
//!
//! # Design Decisions
//! - Candidates are sorted by name and the first wins, so the result never
//!   depends on directory enumeration order
//! - Prefixes are checked for separators and `..` before touching the disk
//! - Only the root itself is searched, never subdirectories

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tokio::fs;

use crate::config::RelayConfig;
use crate::error::{FileOp, RelayError, RelayResult};
use crate::resilience::timeouts::with_deadline;
use crate::routing::matcher::{FilePattern, Matcher};
use crate::security::paths::ensure_safe_component;

/// Suffix shared by every routed document.
pub const DOCUMENT_SUFFIX: &str = ".xml";

/// Kind of read-only document a lookup asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    /// `nodelist_*.xml`
    List,
    /// `info_*.xml`
    Info,
    /// `catalog_<deviceID>_*.xml`
    Catalog(String),
}

impl DocumentKind {
    pub fn prefix(&self) -> String {
        match self {
            DocumentKind::List => "nodelist_".to_string(),
            DocumentKind::Info => "info_".to_string(),
            DocumentKind::Catalog(device_id) => format!("catalog_{}_", device_id),
        }
    }
}

/// A resolved document and its contents.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Resolves `<prefix>*.xml` to a single file under the root directory.
#[derive(Debug, Clone)]
pub struct FileRouter {
    root: PathBuf,
    io_timeout: Duration,
}

impl FileRouter {
    pub fn new(root: impl Into<PathBuf>, io_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            io_timeout,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.storage.root_dir.clone(),
            Duration::from_millis(config.timeouts.io_ms),
        )
    }

    /// Find the file matching `prefix*.xml`.
    pub async fn resolve(&self, prefix: &str) -> RelayResult<PathBuf> {
        ensure_safe_component("prefix", prefix)?;
        let pattern = FilePattern::new(prefix, DOCUMENT_SUFFIX);

        let mut candidates = with_deadline(self.io_timeout, self.candidates(&pattern))
            .await
            .map_err(|e| RelayError::file(FileOp::List, pattern.to_string(), e))?;

        if candidates.len() > 1 {
            candidates.sort();
            tracing::debug!(
                pattern = %pattern,
                candidates = candidates.len(),
                chosen = %candidates[0],
                "Several documents match; taking the first by name"
            );
        }

        match candidates.into_iter().next() {
            Some(name) => Ok(self.root.join(name)),
            None => Err(RelayError::NoMatch {
                pattern: pattern.to_string(),
            }),
        }
    }

    /// Resolve and read the document for `kind`.
    pub async fn fetch(&self, kind: &DocumentKind) -> RelayResult<Document> {
        if let DocumentKind::Catalog(device_id) = kind {
            ensure_safe_component("catalog", device_id)?;
        }
        let path = self.resolve(&kind.prefix()).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match with_deadline(self.io_timeout, fs::read(&path)).await {
            Ok(bytes) => Ok(Document { name, bytes }),
            // removed between listing and reading
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(RelayError::NoMatch {
                pattern: FilePattern::new(kind.prefix(), DOCUMENT_SUFFIX).to_string(),
            }),
            Err(e) => Err(RelayError::file(FileOp::Read, name, e)),
        }
    }

    async fn candidates(&self, pattern: &FilePattern) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !pattern.matches(&name) {
                continue;
            }
            // follows symlinks, like a plain is-file check
            if fs::metadata(entry.path()).await.map(|m| m.is_file()).unwrap_or(false) {
                names.push(name);
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn router_with(files: &[&str]) -> (tempfile::TempDir, FileRouter) {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), format!("<doc name=\"{}\"/>", name)).unwrap();
        }
        let router = FileRouter::new(dir.path(), Duration::from_secs(5));
        (dir, router)
    }

    #[tokio::test]
    async fn test_zero_matches_is_not_found() {
        let (_dir, router) = router_with(&["info_a.xml"]);
        let err = router.resolve("nodelist_").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.diagnostic(),
            "ERROR- No files in set! fileMatchPattern=[nodelist_*.xml]\n"
        );
    }

    #[tokio::test]
    async fn test_single_match_is_returned() {
        let (dir, router) = router_with(&["nodelist_main.xml", "info_a.xml", "nodelist_x.txt"]);
        let path = router.resolve("nodelist_").await.unwrap();
        assert_eq!(path, dir.path().join("nodelist_main.xml"));
        // stable across calls
        assert_eq!(router.resolve("nodelist_").await.unwrap(), path);
    }

    #[tokio::test]
    async fn test_multiple_matches_take_first_by_name() {
        let (dir, router) = router_with(&["info_c.xml", "info_a.xml", "info_b.xml"]);
        let path = router.resolve("info_").await.unwrap();
        assert_eq!(path, dir.path().join("info_a.xml"));
    }

    #[tokio::test]
    async fn test_directories_and_hidden_files_are_skipped() {
        let (dir, router) = router_with(&[".info_hidden.xml"]);
        std::fs::create_dir(dir.path().join("info_dir.xml")).unwrap();
        let err = router.resolve("info_").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_catalog_reads_document() {
        let (_dir, router) = router_with(&["catalog_0013A2_v2.xml", "catalog_0013A3_v1.xml"]);
        let doc = router
            .fetch(&DocumentKind::Catalog("0013A2".into()))
            .await
            .unwrap();
        assert_eq!(doc.name, "catalog_0013A2_v2.xml");
        assert_eq!(doc.bytes, b"<doc name=\"catalog_0013A2_v2.xml\"/>");
    }

    #[tokio::test]
    async fn test_traversal_rejected_before_listing() {
        let (_dir, router) = router_with(&[]);
        for bad in ["../secret", "a/b", ""] {
            let err = router
                .fetch(&DocumentKind::Catalog(bad.into()))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadRequest, "{bad:?}");
        }
        let err = router.resolve("../nodelist_").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn test_missing_root_is_file_error() {
        let router = FileRouter::new("/definitely/not/a/root", Duration::from_secs(1));
        let err = router.resolve("info_").await.unwrap_err();
        assert!(matches!(err, RelayError::File { op: FileOp::List, .. }));
    }
}
