//! Core data models for the media index

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ScanError, ScanErrorKind};

/// Which catalogue view an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Playable audio or video
    Media,
    /// Cover image
    Image,
}

impl MediaKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Media => "media",
            MediaKind::Image => "image",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a playable extension should be rendered with a video player
pub fn is_video_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "mp4" | "webm" | "ogv" | "mkv" | "mov" | "m4v"
    )
}

/// Content type served for an extension
pub fn mime_type(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "ogg" => "audio/ogg",
        "ogv" => "video/ogg",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

/// A single indexed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    /// Canonical filesystem path, never exposed externally
    #[serde(skip)]
    pub absolute_path: PathBuf,
    /// File name including extension
    pub display_name: String,
    /// File name with the extension stripped
    pub base_name: String,
    /// Lowercase extension without dot
    pub extension: String,
    /// Path below the owning root, `/`-separated
    pub relative_path: String,
    /// Index of the owning root in the configured root list
    #[serde(skip)]
    pub root_index: usize,
    /// Catalogue view
    pub kind: MediaKind,
}

impl MediaEntry {
    /// Build an entry from a canonical path, its decoded file name and
    /// its relative path below root `root_index`.
    pub fn new(
        absolute_path: PathBuf,
        display_name: String,
        relative_path: String,
        root_index: usize,
        kind: MediaKind,
    ) -> Self {
        let (base_name, extension) = split_name(&display_name);
        Self {
            absolute_path,
            display_name,
            base_name,
            extension,
            relative_path,
            root_index,
            kind,
        }
    }

    /// Folder part of the relative path, `""` for files directly in a root
    pub fn folder(&self) -> &str {
        match self.relative_path.rfind('/') {
            Some(idx) => &self.relative_path[..idx],
            None => "",
        }
    }

    /// Whether the entry plays in a video element
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Media && is_video_extension(&self.extension)
    }

    /// Content type of the entry
    pub fn mime_type(&self) -> &'static str {
        mime_type(&self.extension)
    }

    /// Canonical path (for internal use)
    pub fn path(&self) -> &Path {
        &self.absolute_path
    }
}

/// Split a file name into base name and lowercase extension.
/// Dot files like `.hidden` have no extension.
pub fn split_name(name: &str) -> (String, String) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (name[..idx].to_string(), name[idx + 1..].to_lowercase()),
        _ => (name.to_string(), String::new()),
    }
}

/// Result of a completed scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Regular files looked at
    pub total_files: u64,
    /// Directories traversed
    pub total_dirs: u64,
    /// Playable entries in the new snapshot
    pub media_entries: u64,
    /// Cover images in the new snapshot
    pub image_entries: u64,
    /// Files left out because their extension is not indexed
    pub skipped_extension: u64,
    /// Files left out by a forbidden rule
    pub skipped_forbidden: u64,
    /// Files already indexed through an earlier root
    pub skipped_duplicate: u64,
    /// Non-fatal errors per kind
    pub error_counts: BTreeMap<String, u64>,
    /// Errors encountered during scanning
    #[serde(skip)]
    pub errors: Vec<ScanError>,
    /// Roots that could not be read at all
    pub unreadable_roots: Vec<PathBuf>,
    /// Total scan duration in milliseconds
    pub duration_ms: u64,
    /// When the snapshot was built
    pub built_at: DateTime<Utc>,
}

impl Default for ScanReport {
    fn default() -> Self {
        Self {
            total_files: 0,
            total_dirs: 0,
            media_entries: 0,
            image_entries: 0,
            skipped_extension: 0,
            skipped_forbidden: 0,
            skipped_duplicate: 0,
            error_counts: BTreeMap::new(),
            errors: Vec::new(),
            unreadable_roots: Vec::new(),
            duration_ms: 0,
            built_at: Utc::now(),
        }
    }
}

impl ScanReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal error
    pub fn push_error(&mut self, err: ScanError) {
        *self
            .error_counts
            .entry(err.kind.as_str().to_string())
            .or_insert(0) += 1;
        self.errors.push(err);
    }

    /// Get the number of errors
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of errors of one kind
    pub fn errors_of(&self, kind: ScanErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Check if the scan completed without errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fold another report (one root) into this one
    pub fn merge(&mut self, other: ScanReport) {
        self.total_files += other.total_files;
        self.total_dirs += other.total_dirs;
        self.skipped_extension += other.skipped_extension;
        self.skipped_forbidden += other.skipped_forbidden;
        self.unreadable_roots.extend(other.unreadable_roots);
        for err in other.errors {
            self.push_error(err);
        }
    }
}
