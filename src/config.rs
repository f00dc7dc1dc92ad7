//! Configuration for the media library

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cover::CoverScores;
use crate::error::{LibraryError, Result};

/// Default maximum number of resolver results
pub const DEFAULT_LIMIT: usize = 50;

/// Default similarity threshold for approximate title matches
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.70;

/// Environment variable naming an extra media root
pub const AUDIO_PATH_ENV: &str = "AUDIO_PATH";

/// Configuration for the media library
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Root directories to index, in precedence order
    pub roots: Vec<PathBuf>,

    /// Playable extensions (lowercase, without dot)
    pub media_extensions: HashSet<String>,

    /// Cover image extensions (lowercase, without dot)
    pub image_extensions: HashSet<String>,

    /// Case-insensitive substrings excluding any matching relative path
    pub forbidden: Vec<String>,

    /// Directory names pruned during the walk. Empty by default, so every
    /// directory is indexed unless the forbidden rules exclude it.
    pub ignore_dirs: HashSet<String>,

    /// Whether to follow symbolic links while walking
    pub follow_links: bool,

    /// Maximum walk depth, unbounded when unset
    pub max_depth: Option<usize>,

    /// Number of threads for parallel root walks
    /// 0 means auto-detect
    pub num_threads: usize,

    /// Result limit used when the caller does not pass one
    pub default_limit: usize,

    /// Minimum similarity (0..=1) for an approximate match
    pub fuzzy_threshold: f64,

    /// Whether title and path matching is case-sensitive
    pub case_sensitive: bool,

    /// Also score approximate matches against the name without extension
    pub fuzzy_match_base_name: bool,

    /// Score table used by the cover matcher
    pub cover_scores: CoverScores,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            media_extensions: Self::default_media_extensions(),
            image_extensions: Self::default_image_extensions(),
            forbidden: Vec::new(),
            ignore_dirs: HashSet::new(),
            follow_links: false,
            max_depth: None,
            num_threads: 0,
            default_limit: DEFAULT_LIMIT,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            case_sensitive: false,
            fuzzy_match_base_name: false,
            cover_scores: CoverScores::default(),
        }
    }
}

impl LibraryConfig {
    /// Create a new config with the given root directories
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Default::default()
        }
    }

    /// Create a config builder
    pub fn builder() -> LibraryConfigBuilder {
        LibraryConfigBuilder::new()
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Append the directory named by `AUDIO_PATH`, if it exists
    pub fn with_env_root(mut self) -> Self {
        if let Some(dir) = std::env::var_os(AUDIO_PATH_ENV).map(PathBuf::from) {
            if dir.is_dir() && !self.roots.contains(&dir) {
                self.roots.push(dir);
            }
        }
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(LibraryError::Config(format!(
                "fuzzy_threshold must be within 0..=1, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.media_extensions.is_empty() {
            return Err(LibraryError::Config(
                "media_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default playable extensions
    pub fn default_media_extensions() -> HashSet<String> {
        ["mp3", "mp4", "ogg", "ogv", "webm"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Get the default image extensions
    pub fn default_image_extensions() -> HashSet<String> {
        ["jpg", "jpeg", "png"].iter().map(|s| s.to_string()).collect()
    }

    /// NAS and OS housekeeping directories, for use with `ignore_dirs`
    pub fn system_ignore_dirs() -> HashSet<String> {
        [
            "$RECYCLE.BIN",
            "System Volume Information",
            ".Trash",
            ".Trash-1000",
            "@eaDir",
            ".git",
            ".svn",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    /// Check if an extension is playable
    pub fn is_media_extension(&self, ext: &str) -> bool {
        contains_extension(&self.media_extensions, ext)
    }

    /// Check if an extension is a cover image
    pub fn is_image_extension(&self, ext: &str) -> bool {
        contains_extension(&self.image_extensions, ext)
    }

    /// Check if a directory should be pruned
    pub fn should_ignore_dir(&self, name: &str) -> bool {
        self.ignore_dirs.contains(name)
    }

    /// Get the effective number of threads
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        } else {
            self.num_threads
        }
    }
}

fn contains_extension(set: &HashSet<String>, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.').to_lowercase();
    !ext.is_empty() && set.iter().any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
}

/// Builder for LibraryConfig
#[derive(Debug, Default)]
pub struct LibraryConfigBuilder {
    config: LibraryConfig,
}

impl LibraryConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root directories
    pub fn roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.config.roots = roots;
        self
    }

    /// Add a root directory
    pub fn add_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.roots.push(root.into());
        self
    }

    /// Set the playable extensions
    pub fn media_extensions(mut self, extensions: HashSet<String>) -> Self {
        self.config.media_extensions = extensions;
        self
    }

    /// Set the cover image extensions
    pub fn image_extensions(mut self, extensions: HashSet<String>) -> Self {
        self.config.image_extensions = extensions;
        self
    }

    /// Set the forbidden rules
    pub fn forbidden(mut self, rules: Vec<String>) -> Self {
        self.config.forbidden = rules;
        self
    }

    /// Add a forbidden rule
    pub fn forbid(mut self, rule: impl Into<String>) -> Self {
        self.config.forbidden.push(rule.into());
        self
    }

    /// Set the directories to ignore
    pub fn ignore_dirs(mut self, dirs: HashSet<String>) -> Self {
        self.config.ignore_dirs = dirs;
        self
    }

    /// Enable or disable symlink following
    pub fn follow_links(mut self, enabled: bool) -> Self {
        self.config.follow_links = enabled;
        self
    }

    /// Limit the walk depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Set the number of threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Set the default resolver limit
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the approximate match threshold
    pub fn fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.config.fuzzy_threshold = threshold;
        self
    }

    /// Enable or disable case-sensitive matching
    pub fn case_sensitive(mut self, enabled: bool) -> Self {
        self.config.case_sensitive = enabled;
        self
    }

    /// Score approximate matches against the base name too
    pub fn fuzzy_match_base_name(mut self, enabled: bool) -> Self {
        self.config.fuzzy_match_base_name = enabled;
        self
    }

    /// Set the cover score table
    pub fn cover_scores(mut self, scores: CoverScores) -> Self {
        self.config.cover_scores = scores;
        self
    }

    /// Build the config
    pub fn build(self) -> LibraryConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = LibraryConfig::default();
        assert!(config.roots.is_empty());
        assert!(config.forbidden.is_empty());
        assert!(!config.case_sensitive);
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
        assert_eq!(config.fuzzy_threshold, DEFAULT_FUZZY_THRESHOLD);
        assert!(!config.fuzzy_match_base_name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extension_checks() {
        let config = LibraryConfig::default();
        assert!(config.is_media_extension("mp3"));
        assert!(config.is_media_extension("MP3"));
        assert!(config.is_media_extension(".webm"));
        assert!(!config.is_media_extension("jpg"));
        assert!(!config.is_media_extension(""));
        assert!(config.is_image_extension("JPEG"));
        assert!(!config.is_image_extension("mp3"));
    }

    #[test]
    fn test_should_ignore_dir() {
        let config = LibraryConfig::default();
        assert!(config.ignore_dirs.is_empty());
        assert!(!config.should_ignore_dir("@eaDir"));

        let config = LibraryConfig::builder()
            .ignore_dirs(LibraryConfig::system_ignore_dirs())
            .build();
        assert!(config.should_ignore_dir("@eaDir"));
        assert!(config.should_ignore_dir("$RECYCLE.BIN"));
        assert!(!config.should_ignore_dir("Albums"));
    }

    #[test]
    fn test_config_builder() {
        let config = LibraryConfig::builder()
            .add_root("/music")
            .forbid("wordpress")
            .num_threads(2)
            .default_limit(10)
            .case_sensitive(true)
            .build();

        assert_eq!(config.roots, vec![PathBuf::from("/music")]);
        assert_eq!(config.forbidden, vec!["wordpress".to_string()]);
        assert_eq!(config.effective_threads(), 2);
        assert_eq!(config.default_limit, 10);
        assert!(config.case_sensitive);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = LibraryConfig::builder().fuzzy_threshold(1.5).build();
        assert!(matches!(config.validate(), Err(LibraryError::Config(_))));
    }

    #[test]
    fn test_from_json_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"roots": ["/srv/music"], "forbidden": ["phpgedview"], "fuzzy_threshold": 0.8}}"#
        )
        .unwrap();

        let config = LibraryConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("/srv/music")]);
        assert_eq!(config.forbidden, vec!["phpgedview".to_string()]);
        assert_eq!(config.fuzzy_threshold, 0.8);
        assert!(config.is_media_extension("ogg"));
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
    }
}
