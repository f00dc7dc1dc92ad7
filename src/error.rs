//! Error types for the media index

use std::path::PathBuf;
use thiserror::Error;

/// Error kinds that can occur while scanning a single entry or subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanErrorKind {
    /// File name cannot be represented as text
    DecodeError,
    /// Entry resolved to an empty relative path (root collision)
    EmptyRelativePath,
    /// Canonical path is not under any configured root
    OutsideRoots,
    /// Permission denied when accessing a file or directory
    PermissionDenied,
    /// File or directory not found
    NotFound,
    /// I/O error during traversal
    IoError,
    /// Worker pool could not be created
    ThreadPool,
}

impl ScanErrorKind {
    /// Short label used in reports and log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanErrorKind::DecodeError => "decode",
            ScanErrorKind::EmptyRelativePath => "empty_relative_path",
            ScanErrorKind::OutsideRoots => "outside_roots",
            ScanErrorKind::PermissionDenied => "permission_denied",
            ScanErrorKind::NotFound => "not_found",
            ScanErrorKind::IoError => "io",
            ScanErrorKind::ThreadPool => "thread_pool",
        }
    }
}

impl std::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A non-fatal problem met during a scan. The entry or subtree is skipped.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message} (path: {path:?})")]
pub struct ScanError {
    /// The kind of error
    pub kind: ScanErrorKind,
    /// The path where the error occurred
    pub path: Option<PathBuf>,
    /// Human-readable error message
    pub message: String,
}

impl ScanError {
    /// Create a new scan error
    pub fn new(kind: ScanErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// Create a decode error for a name that is not valid UTF-8
    pub fn decode(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::DecodeError,
            Some(path.clone()),
            format!("File name is not valid UTF-8: {}", path.to_string_lossy()),
        )
    }

    /// Create an error for an entry whose relative path came out empty
    pub fn empty_relative_path(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::EmptyRelativePath,
            Some(path),
            "Entry resolves to an empty relative path",
        )
    }

    /// Create an error for an entry that escaped every root
    pub fn outside_roots(path: PathBuf) -> Self {
        Self::new(
            ScanErrorKind::OutsideRoots,
            Some(path),
            "Canonical path is outside every configured root",
        )
    }

    /// Create an I/O error
    pub fn io_error(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(ScanErrorKind::IoError, path, message)
    }

    /// Build a scan error from an I/O error at a known path
    pub fn from_io(path: PathBuf, err: &std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanErrorKind::PermissionDenied,
            std::io::ErrorKind::NotFound => ScanErrorKind::NotFound,
            _ => ScanErrorKind::IoError,
        };
        Self::new(kind, Some(path), err.to_string())
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        let kind = match err.io_error().map(|e| e.kind()) {
            Some(std::io::ErrorKind::PermissionDenied) => ScanErrorKind::PermissionDenied,
            Some(std::io::ErrorKind::NotFound) => ScanErrorKind::NotFound,
            _ => ScanErrorKind::IoError,
        };
        Self::new(kind, path, err.to_string())
    }
}

/// Errors surfaced to callers of the library
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Nothing matches the requested path or title
    #[error("no such item: {0}")]
    NotFound(String),

    /// The path matches a forbidden rule
    #[error("access denied: {0} is forbidden")]
    Forbidden(String),

    /// The path resolves outside every configured root
    #[error("access denied: {0} escapes the media roots")]
    PathTraversal(String),

    /// Not a single configured root could be read
    #[error("no readable media roots among {0:?}")]
    NoReadableRoots(Vec<PathBuf>),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O failure outside of a scan
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LibraryError {
    /// Whether the error denies access rather than reporting absence
    pub fn is_access_denied(&self) -> bool {
        matches!(self, LibraryError::Forbidden(_) | LibraryError::PathTraversal(_))
    }
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;
