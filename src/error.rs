//! Request-level error taxonomy.
//!
//! Every error is terminal for the request that raised it. The HTTP layer
//! never turns these into status codes: each one is rendered as a single
//! plain-text diagnostic line, which is what deployed devices parse.

use std::fmt;
use std::io;

use thiserror::Error;

/// Filesystem step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    Open,
    Write,
    Flush,
    Publish,
    Read,
    Remove,
    Claim,
    Restore,
    List,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            FileOp::Open => "open",
            FileOp::Write => "write",
            FileOp::Flush => "flush",
            FileOp::Publish => "publish",
            FileOp::Read => "read",
            FileOp::Remove => "remove",
            FileOp::Claim => "claim",
            FileOp::Restore => "restore",
            FileOp::List => "list",
        };
        f.write_str(op)
    }
}

/// Coarse classification of a [`RelayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    NotFound,
    File,
    BadRequest,
}

/// Errors that end the processing of a single relay request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or unknown shared-secret key.
    #[error("request NOT authorized")]
    Unauthorized,

    /// No document matched a list/info/catalog pattern.
    #[error("No files in set! fileMatchPattern=[{pattern}]")]
    NoMatch { pattern: String },

    /// The response envelope has not been produced yet.
    #[error("File NOT found! desiredFileSpec=[{path}]")]
    ResponseNotReady { path: String },

    /// A filesystem step failed.
    #[error("can't {op} [{path}]: {source}")]
    File {
        op: FileOp,
        path: String,
        #[source]
        source: io::Error,
    },

    /// A response was delivered but could not be removed afterwards.
    #[error("Failed to remove file! desiredFileSpec=[{path}]")]
    RemoveFailed {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Unsupported method, selector or malformed field.
    #[error("{0}")]
    BadRequest(String),
}

impl RelayError {
    pub fn file(op: FileOp, path: impl Into<String>, source: io::Error) -> Self {
        Self::File {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Unauthorized => ErrorKind::Auth,
            RelayError::NoMatch { .. } | RelayError::ResponseNotReady { .. } => {
                ErrorKind::NotFound
            }
            RelayError::File { .. } | RelayError::RemoveFailed { .. } => ErrorKind::File,
            RelayError::BadRequest(_) => ErrorKind::BadRequest,
        }
    }

    /// The plain-text line sent back to the caller.
    pub fn diagnostic(&self) -> String {
        match self {
            RelayError::File { .. } => format!("FILE-ERROR {}\n", self),
            RelayError::BadRequest(message) => format!("{}\n", message),
            _ => format!("ERROR- {}\n", self),
        }
    }

    /// Short label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Auth => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::File => "file_error",
            ErrorKind::BadRequest => "bad_request",
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
