//! Scanner module - walks the configured roots into a catalogue
//!
//! Roots are walked in parallel, each in file-name order, and the results are
//! concatenated in configured root order. Per-entry failures are logged and
//! skipped, they never abort the scan.

use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

use crate::config::LibraryConfig;
use crate::error::{ScanError, ScanErrorKind};
use crate::filter::ForbiddenFilter;
use crate::guard;
use crate::models::{split_name, MediaEntry, MediaKind, ScanReport};

/// Entries produced by one complete scan
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    /// Playable entries, in scan order
    pub media: Vec<MediaEntry>,
    /// Cover images, in scan order
    pub images: Vec<MediaEntry>,
}

impl Catalogue {
    pub fn len(&self) -> usize {
        self.media.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_empty() && self.images.is_empty()
    }
}

/// A configured root that resolved on disk
#[derive(Debug, Clone)]
struct ScanRoot {
    /// Position in the configured root list
    index: usize,
    /// Canonical form
    path: PathBuf,
}

/// Outcome of looking at one regular file
enum FileOutcome {
    Indexed(MediaEntry),
    Extension,
    Forbidden,
    Failed(ScanError),
}

/// Walk every configured root and build a fresh catalogue.
///
/// Unreadable roots are listed in `ScanReport::unreadable_roots`; deciding
/// whether that is fatal is up to the caller.
pub fn build_index(config: &LibraryConfig, filter: &ForbiddenFilter) -> (Catalogue, ScanReport) {
    let start = Instant::now();
    let mut report = ScanReport::new();

    let mut roots = Vec::new();
    for (index, root) in config.roots.iter().enumerate() {
        match root.canonicalize() {
            Ok(path) if path.is_dir() => roots.push(ScanRoot { index, path }),
            Ok(_) => {
                log::error!("Media root is not a directory: {:?}", root);
                report.unreadable_roots.push(root.clone());
                report.push_error(ScanError::io_error(Some(root.clone()), "Not a directory"));
            }
            Err(e) => {
                log::error!("Cannot open media root {:?}: {}", root, e);
                report.unreadable_roots.push(root.clone());
                report.push_error(ScanError::from_io(root.clone(), &e));
            }
        }
    }

    log::info!(
        "Scanning {} root(s) with {} thread(s)",
        roots.len(),
        config.effective_threads()
    );

    let canonical: Vec<PathBuf> = roots.iter().map(|r| r.path.clone()).collect();
    let walk = || -> Vec<(Vec<MediaEntry>, ScanReport)> {
        roots
            .par_iter()
            .map(|root| scan_root(root, &roots, &canonical, config, filter))
            .collect()
    };

    let per_root = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_threads())
        .build()
    {
        Ok(pool) => pool.install(walk),
        Err(e) => {
            log::warn!("Falling back to the global thread pool: {}", e);
            report.push_error(ScanError::new(ScanErrorKind::ThreadPool, None, e.to_string()));
            walk()
        }
    };

    let mut catalogue = Catalogue::default();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    for (entries, root_report) in per_root {
        report.merge(root_report);
        for entry in entries {
            if !seen.insert(entry.absolute_path.clone()) {
                report.skipped_duplicate += 1;
                continue;
            }
            match entry.kind {
                MediaKind::Media => catalogue.media.push(entry),
                MediaKind::Image => catalogue.images.push(entry),
            }
        }
    }

    report.media_entries = catalogue.media.len() as u64;
    report.image_entries = catalogue.images.len() as u64;
    report.duration_ms = start.elapsed().as_millis() as u64;
    report.built_at = chrono::Utc::now();

    log::info!(
        "Scan finished: {} media, {} images, {} skipped, {} errors in {}ms",
        report.media_entries,
        report.image_entries,
        report.skipped_forbidden + report.skipped_duplicate,
        report.error_count(),
        report.duration_ms
    );

    (catalogue, report)
}

/// Walk one root
fn scan_root(
    root: &ScanRoot,
    roots: &[ScanRoot],
    canonical: &[PathBuf],
    config: &LibraryConfig,
    filter: &ForbiddenFilter,
) -> (Vec<MediaEntry>, ScanReport) {
    let mut report = ScanReport::new();
    let mut entries = Vec::new();

    let walker = WalkDir::new(&root.path)
        .follow_links(config.follow_links)
        .max_depth(config.max_depth.unwrap_or(usize::MAX))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e, config));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = ScanError::from(e);
                log::warn!("Skipping unreadable subtree: {}", err);
                report.push_error(err);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            report.total_dirs += 1;
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }

        report.total_files += 1;
        match process_file(entry.path(), roots, canonical, config, filter) {
            FileOutcome::Indexed(media) => entries.push(media),
            FileOutcome::Extension => report.skipped_extension += 1,
            FileOutcome::Forbidden => report.skipped_forbidden += 1,
            FileOutcome::Failed(err) => {
                log::warn!("Skipping entry: {}", err);
                report.push_error(err);
            }
        }
    }

    log::debug!(
        "Root {:?}: {} entries from {} files",
        root.path,
        entries.len(),
        report.total_files
    );
    (entries, report)
}

fn is_ignored_dir(entry: &DirEntry, config: &LibraryConfig) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| config.should_ignore_dir(name))
}

/// Turn one walked file into an entry, or say why it was left out
fn process_file(
    path: &Path,
    roots: &[ScanRoot],
    canonical: &[PathBuf],
    config: &LibraryConfig,
    filter: &ForbiddenFilter,
) -> FileOutcome {
    let Some(raw_name) = path.file_name() else {
        return FileOutcome::Extension;
    };
    let (_, extension) = split_name(&raw_name.to_string_lossy());
    let kind = if config.is_media_extension(&extension) {
        MediaKind::Media
    } else if config.is_image_extension(&extension) {
        MediaKind::Image
    } else {
        return FileOutcome::Extension;
    };

    if raw_name.to_str().is_none() {
        return FileOutcome::Failed(ScanError::decode(path.to_path_buf()));
    }

    let absolute = match path.canonicalize() {
        Ok(p) => p,
        Err(e) => return FileOutcome::Failed(ScanError::from_io(path.to_path_buf(), &e)),
    };

    // Owning root is the first configured root containing the file, which
    // for nested roots is not necessarily the one being walked.
    let Some(owner) = guard::owning_root(&absolute, canonical) else {
        return FileOutcome::Failed(ScanError::outside_roots(absolute));
    };
    let root = &roots[owner];

    let relative_path = match guard::relative_to(&absolute, &root.path) {
        Some(rel) if rel.is_empty() => {
            return FileOutcome::Failed(ScanError::empty_relative_path(absolute))
        }
        Some(rel) => rel,
        None => return FileOutcome::Failed(ScanError::decode(absolute)),
    };

    if filter.is_forbidden(&relative_path) {
        log::debug!("Forbidden: {}", relative_path);
        return FileOutcome::Forbidden;
    }

    let display_name = match absolute.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => return FileOutcome::Failed(ScanError::decode(absolute)),
    };
    // A followed symlink may carry a different extension than its target.
    let (_, target_ext) = split_name(&display_name);
    let kind_ok = match kind {
        MediaKind::Media => config.is_media_extension(&target_ext),
        MediaKind::Image => config.is_image_extension(&target_ext),
    };
    if !kind_ok {
        return FileOutcome::Extension;
    }

    FileOutcome::Indexed(MediaEntry::new(
        absolute,
        display_name,
        relative_path,
        root.index,
        kind,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
    }

    fn config_for(roots: Vec<PathBuf>) -> LibraryConfig {
        LibraryConfig::builder().roots(roots).num_threads(2).build()
    }

    #[test]
    fn test_indexes_media_and_images() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "Album/01 Intro.mp3");
        touch(tmp.path(), "Album/cover.JPG");
        touch(tmp.path(), "Album/notes.txt");
        touch(tmp.path(), "clip.webm");

        let config = config_for(vec![tmp.path().to_path_buf()]);
        let (catalogue, report) = build_index(&config, &ForbiddenFilter::default());

        let rels: Vec<&str> = catalogue.media.iter().map(|e| e.relative_path.as_str()).collect();
        assert_eq!(rels, vec!["Album/01 Intro.mp3", "clip.webm"]);
        assert_eq!(catalogue.images.len(), 1);
        assert_eq!(catalogue.images[0].extension, "jpg");
        assert_eq!(report.total_files, 4);
        assert_eq!(report.skipped_extension, 1);
        assert!(report.is_success());
    }

    #[test]
    fn test_forbidden_substring_excluded() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "wordpress/x.mp3");
        touch(tmp.path(), "old/wordpress_backup/x.mp3");
        touch(tmp.path(), "keep/x.mp3");

        let config = config_for(vec![tmp.path().to_path_buf()]);
        let filter = ForbiddenFilter::new(["WordPress"]);
        let (catalogue, report) = build_index(&config, &filter);

        assert_eq!(catalogue.media.len(), 1);
        assert_eq!(catalogue.media[0].relative_path, "keep/x.mp3");
        assert_eq!(report.skipped_forbidden, 2);
    }

    #[test]
    fn test_nested_roots_first_root_wins() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "inner/song.mp3");
        let outer = tmp.path().to_path_buf();
        let inner = tmp.path().join("inner");

        let config = config_for(vec![outer.clone(), inner]);
        let (catalogue, report) = build_index(&config, &ForbiddenFilter::default());

        assert_eq!(catalogue.media.len(), 1);
        assert_eq!(catalogue.media[0].relative_path, "inner/song.mp3");
        assert_eq!(catalogue.media[0].root_index, 0);
        assert_eq!(report.skipped_duplicate, 1);
    }

    #[test]
    fn test_missing_root_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.ogg");
        let missing = tmp.path().join("does-not-exist");

        let config = config_for(vec![missing.clone(), tmp.path().to_path_buf()]);
        let (catalogue, report) = build_index(&config, &ForbiddenFilter::default());

        assert_eq!(catalogue.media.len(), 1);
        assert_eq!(catalogue.media[0].root_index, 1);
        assert_eq!(report.unreadable_roots, vec![missing]);
        assert_eq!(report.errors_of(ScanErrorKind::NotFound), 1);
    }

    #[test]
    fn test_ignored_dirs_pruned() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "@eaDir/thumb.jpg");
        touch(tmp.path(), "Album/song.mp3");

        let config = LibraryConfig::builder()
            .add_root(tmp.path())
            .ignore_dirs(LibraryConfig::system_ignore_dirs())
            .build();
        let (catalogue, _) = build_index(&config, &ForbiddenFilter::default());
        assert!(catalogue.images.is_empty());
        assert_eq!(catalogue.media.len(), 1);
    }

    #[test]
    fn test_system_dirs_indexed_by_default() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "@eaDir/song.mp3");
        touch(tmp.path(), ".Trash/other.mp3");
        touch(tmp.path(), "plain.mp3");

        let config = config_for(vec![tmp.path().to_path_buf()]);
        let (catalogue, _) = build_index(&config, &ForbiddenFilter::default());
        let mut rels: Vec<&str> = catalogue
            .media
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect();
        rels.sort();
        assert_eq!(rels, vec![".Trash/other.mp3", "@eaDir/song.mp3", "plain.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_subtrees_skipped_scan_continues() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("music");
        touch(&root, "a.mp3");
        touch(&root, "Album/b.mp3");
        symlink(&root, root.join("Album/loop")).unwrap();
        symlink(tmp.path().join("missing"), root.join("gone")).unwrap();

        let config = LibraryConfig::builder()
            .add_root(&root)
            .follow_links(true)
            .num_threads(2)
            .build();
        let (catalogue, report) = build_index(&config, &ForbiddenFilter::default());

        let rels: Vec<&str> = catalogue
            .media
            .iter()
            .map(|e| e.relative_path.as_str())
            .collect();
        assert_eq!(rels, vec!["Album/b.mp3", "a.mp3"]);
        let walk_errors =
            report.errors_of(ScanErrorKind::IoError) + report.errors_of(ScanErrorKind::NotFound);
        assert!(walk_errors >= 1);
        assert!(!report.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_undecodable_name_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "fine.mp3");
        let bad = tmp.path().join(OsStr::from_bytes(b"bad\xff.mp3"));
        if fs::write(&bad, b"data").is_err() {
            // Filesystem refuses non-UTF-8 names
            return;
        }

        let config = config_for(vec![tmp.path().to_path_buf()]);
        let (catalogue, report) = build_index(&config, &ForbiddenFilter::default());
        assert_eq!(catalogue.media.len(), 1);
        assert_eq!(catalogue.media[0].display_name, "fine.mp3");
        assert_eq!(report.errors_of(ScanErrorKind::DecodeError), 1);
    }

    #[test]
    fn test_relative_path_round_trips() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "A/B/c d.mp3");
        let config = config_for(vec![tmp.path().to_path_buf()]);
        let (catalogue, _) = build_index(&config, &ForbiddenFilter::default());

        for entry in &catalogue.media {
            let root = &config.roots[entry.root_index];
            let rejoined = root.join(&entry.relative_path).canonicalize().unwrap();
            assert_eq!(rejoined, entry.absolute_path);
        }
    }
}
