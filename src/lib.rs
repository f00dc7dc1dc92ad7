//! Media index and title resolution engine
//!
//! This library walks media roots into an in-memory catalogue, resolves
//! free-form titles against it, picks cover art for tracks and keeps every
//! served path inside the configured roots.

pub mod config;
pub mod cover;
pub mod error;
pub mod filter;
pub mod guard;
pub mod library;
pub mod listing;
pub mod models;
pub mod resolver;
pub mod scanner;
pub mod similarity;
pub mod sort;

pub use config::LibraryConfig;
pub use cover::{CoverMatcher, CoverScores};
pub use error::{LibraryError, Result, ScanError, ScanErrorKind};
pub use filter::ForbiddenFilter;
pub use guard::is_contained;
pub use library::{MediaLibrary, ServableFile, Snapshot};
pub use listing::FolderListing;
pub use models::{MediaEntry, MediaKind, ScanReport};
pub use resolver::{MatchPhase, Outcome, Resolution, Resolver};
pub use scanner::{build_index, Catalogue};
pub use similarity::{IndelRatio, Similarity};
pub use sort::{sort_key, CaseFoldCollator, Collator, PriorityClass, SortKey};
