//! The media library service
//!
//! Owns the current catalogue snapshot. Readers clone an `Arc` to the
//! snapshot and work on it without further locking; a rebuild scans into a
//! new snapshot and swaps the pointer once the scan is complete, so readers
//! only ever see a whole old or a whole new catalogue. At most one rebuild
//! runs at a time and overlapping requests are dropped, not queued.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, TryLockError};

use crate::config::LibraryConfig;
use crate::cover::CoverMatcher;
use crate::error::{LibraryError, Result};
use crate::filter::ForbiddenFilter;
use crate::guard;
use crate::listing::{self, FolderListing};
use crate::models::{split_name, MediaEntry, MediaKind, ScanReport};
use crate::resolver::{normalize_query, Resolution, Resolver};
use crate::scanner::{self, Catalogue};
use crate::similarity::{IndelRatio, Similarity};
use crate::sort::{CaseFoldCollator, Collator};

/// One complete, immutable catalogue
#[derive(Debug, Default)]
pub struct Snapshot {
    catalogue: Catalogue,
    generation: u64,
    built_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Playable entries, in scan order
    pub fn media(&self) -> &[MediaEntry] {
        &self.catalogue.media
    }

    /// Cover images, in scan order
    pub fn images(&self) -> &[MediaEntry] {
        &self.catalogue.images
    }

    /// Number of rebuilds that led to this snapshot, 0 for the initial empty one
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.catalogue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogue.is_empty()
    }
}

/// A file cleared for byte-serving
#[derive(Debug, Clone, Serialize)]
pub struct ServableFile {
    /// Canonical path, checked right before hand-off
    pub path: PathBuf,
    pub relative_path: String,
    pub mime_type: &'static str,
    pub kind: MediaKind,
}

/// Media index and resolution service
pub struct MediaLibrary {
    config: LibraryConfig,
    filter: ForbiddenFilter,
    resolver: Resolver,
    covers: CoverMatcher,
    collator: Arc<dyn Collator>,
    snapshot: RwLock<Arc<Snapshot>>,
    rebuild_lock: Mutex<()>,
    generation: AtomicU64,
}

impl std::fmt::Debug for MediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibrary")
            .field("roots", &self.config.roots)
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MediaLibrary {
    /// Create a library with an empty snapshot and the default similarity
    /// and collation providers
    pub fn new(config: LibraryConfig) -> Result<Self> {
        Self::with_providers(config, Arc::new(IndelRatio), Arc::new(CaseFoldCollator))
    }

    /// Create a library with explicit similarity and collation providers
    pub fn with_providers(
        config: LibraryConfig,
        similarity: Arc<dyn Similarity>,
        collator: Arc<dyn Collator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filter: ForbiddenFilter::new(&config.forbidden),
            resolver: Resolver::from_config(&config, similarity),
            covers: CoverMatcher::new(config.cover_scores),
            collator,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            rebuild_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            config,
        })
    }

    /// Create a library and build its first snapshot. Fails when no root
    /// can be read.
    pub fn open(config: LibraryConfig) -> Result<Self> {
        let library = Self::new(config)?;
        library.rebuild()?;
        Ok(library)
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rescan every root and publish the result as the new snapshot.
    ///
    /// Returns `Ok(None)` without scanning when another rebuild is running.
    /// When not a single root is readable the previous snapshot stays in
    /// place and `NoReadableRoots` is returned.
    pub fn rebuild(&self) -> Result<Option<ScanReport>> {
        let _guard = match self.rebuild_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                log::debug!("Rebuild already in progress, skipping");
                return Ok(None);
            }
        };

        log::info!("Rebuilding media index");
        let (catalogue, report) = scanner::build_index(&self.config, &self.filter);

        if report.unreadable_roots.len() == self.config.roots.len() {
            log::error!("No readable media roots, keeping previous index");
            return Err(LibraryError::NoReadableRoots(self.config.roots.clone()));
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let next = Arc::new(Snapshot {
            catalogue,
            generation,
            built_at: Some(report.built_at),
        });
        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;

        log::info!(
            "Published index generation {} ({} media, {} images)",
            generation,
            report.media_entries,
            report.image_entries
        );
        Ok(Some(report))
    }

    /// Resolve a title query to at most `limit` playable entries
    pub fn resolve(&self, query: &str, limit: usize) -> Vec<MediaEntry> {
        self.resolve_detailed(query, limit).into_entries()
    }

    /// Resolve a title query, reporting which phase matched
    pub fn resolve_detailed(&self, query: &str, limit: usize) -> Resolution {
        let snapshot = self.snapshot();
        self.resolver.resolve(snapshot.media(), query, limit)
    }

    /// Resolve with the configured default limit
    pub fn resolve_default(&self, query: &str) -> Resolution {
        self.resolve_detailed(query, self.config.default_limit)
    }

    /// Best cover image anywhere in the catalogue
    pub fn find_cover(&self, track_base: &str) -> Option<MediaEntry> {
        let snapshot = self.snapshot();
        self.covers.best(track_base, snapshot.images()).cloned()
    }

    /// Best cover image for `track`, preferring images in the track's own
    /// folder and falling back to the whole catalogue
    pub fn find_cover_near(&self, track: &MediaEntry) -> Option<MediaEntry> {
        let snapshot = self.snapshot();
        let folder = track.folder();
        let nearby = snapshot
            .images()
            .iter()
            .filter(|img| img.root_index == track.root_index && img.folder() == folder);
        self.covers
            .best(&track.base_name, nearby)
            .or_else(|| self.covers.best(&track.base_name, snapshot.images()))
            .cloned()
    }

    pub fn is_forbidden(&self, relative_path: &str) -> bool {
        self.filter.is_forbidden(relative_path)
    }

    /// Canonical path of `path` if it lies inside a configured root
    pub fn is_contained(&self, path: &Path) -> Option<PathBuf> {
        guard::is_contained(path, &guard::canonical_roots(&self.config.roots))
    }

    /// Clear a relative path for byte-serving. The filter and the
    /// containment guard both run again here, independently of the index.
    pub fn open_for_serving(&self, relative_path: &str) -> Result<ServableFile> {
        let rel = normalize_query(relative_path);
        if rel.is_empty() {
            return Err(LibraryError::NotFound(relative_path.to_string()));
        }
        if self.filter.is_forbidden(&rel) {
            log::warn!("Refusing forbidden path {:?}", rel);
            return Err(LibraryError::Forbidden(rel));
        }

        let mut escaped = false;
        for root in guard::canonical_roots(&self.config.roots) {
            let Ok(canonical) = root.join(&rel).canonicalize() else {
                continue;
            };
            if !canonical.starts_with(&root) {
                escaped = true;
                continue;
            }
            if !canonical.is_file() {
                continue;
            }

            let Some(canonical_rel) = guard::relative_to(&canonical, &root) else {
                continue;
            };
            if self.filter.is_forbidden(&canonical_rel) {
                log::warn!("Refusing forbidden target of {:?}", rel);
                return Err(LibraryError::Forbidden(rel));
            }

            let name = canonical
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (_, ext) = split_name(&name);
            let kind = if self.config.is_media_extension(&ext) {
                MediaKind::Media
            } else if self.config.is_image_extension(&ext) {
                MediaKind::Image
            } else {
                continue;
            };

            return Ok(ServableFile {
                mime_type: crate::models::mime_type(&ext),
                path: canonical,
                relative_path: canonical_rel,
                kind,
            });
        }

        if escaped {
            log::warn!("Refusing path outside media roots {:?}", rel);
            return Err(LibraryError::PathTraversal(rel));
        }
        Err(LibraryError::NotFound(rel))
    }

    /// All playable entries in display order
    pub fn flat_listing(&self) -> Vec<MediaEntry> {
        listing::flat_listing(self.snapshot().media(), self.collator.as_ref())
    }

    /// Playable entries grouped by folder, in display order
    pub fn structured_listing(&self) -> Vec<FolderListing> {
        listing::structured_listing(self.snapshot().media(), self.collator.as_ref())
    }

    /// A random playable entry of the current snapshot
    pub fn random_entry(&self) -> Option<MediaEntry> {
        listing::random_entry(self.snapshot().media()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn library_with(files: &[&str]) -> (TempDir, MediaLibrary) {
        let tmp = TempDir::new().unwrap();
        for rel in files {
            let path = tmp.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"data").unwrap();
        }
        let config = LibraryConfig::builder()
            .add_root(tmp.path())
            .num_threads(1)
            .build();
        let library = MediaLibrary::new(config).unwrap();
        (tmp, library)
    }

    #[test]
    fn test_starts_empty() {
        let (_tmp, library) = library_with(&["a.mp3"]);
        assert!(library.snapshot().is_empty());
        assert_eq!(library.snapshot().generation(), 0);
        assert!(library.resolve("a.mp3", 5).is_empty());
    }

    #[test]
    fn test_rebuild_publishes_snapshot() {
        let (_tmp, library) = library_with(&["a.mp3", "b.jpg"]);
        let report = library.rebuild().unwrap().unwrap();
        assert_eq!(report.media_entries, 1);
        assert_eq!(report.image_entries, 1);

        let snapshot = library.snapshot();
        assert_eq!(snapshot.generation(), 1);
        assert_eq!(snapshot.media().len(), 1);
        assert!(snapshot.built_at().is_some());
    }

    #[test]
    fn test_random_entry_is_playable() {
        let (_tmp, library) = library_with(&["a.mp3", "b.jpg"]);
        assert!(library.random_entry().is_none());

        library.rebuild().unwrap();
        let entry = library.random_entry().unwrap();
        assert_eq!(entry.display_name, "a.mp3");
        assert_eq!(entry.kind, MediaKind::Media);
    }

    #[test]
    fn test_concurrent_rebuild_is_skipped() {
        let (_tmp, library) = library_with(&["a.mp3"]);
        let held = library.rebuild_lock.lock().unwrap();
        assert!(library.rebuild().unwrap().is_none());
        drop(held);
        assert!(library.rebuild().unwrap().is_some());
    }

    #[test]
    fn test_unreadable_roots_keep_old_snapshot() {
        let (tmp, library) = library_with(&["a.mp3"]);
        library.rebuild().unwrap();
        let before = library.snapshot();

        fs::remove_dir_all(tmp.path()).unwrap();
        let err = library.rebuild().unwrap_err();
        assert!(matches!(err, LibraryError::NoReadableRoots(_)));
        assert!(Arc::ptr_eq(&before, &library.snapshot()));
    }

    #[test]
    fn test_old_snapshot_survives_swap() {
        let (tmp, library) = library_with(&["a.mp3"]);
        library.rebuild().unwrap();
        let old = library.snapshot();

        fs::write(tmp.path().join("b.mp3"), b"data").unwrap();
        library.rebuild().unwrap();

        assert_eq!(old.media().len(), 1);
        assert_eq!(library.snapshot().media().len(), 2);
    }
}
