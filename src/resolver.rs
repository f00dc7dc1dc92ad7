//! Query resolution
//!
//! A title query is matched against the catalogue in three phases, stopping
//! at the first phase that produces anything:
//!
//! 1. exact relative path, always a single entry
//! 2. substring of the display name, in catalogue order
//! 3. approximate match on the display or base name, in catalogue order
//!
//! Phase order decides correctness: a query equal to one relative path that
//! is also a substring of many names still yields exactly that one entry.

use rayon::prelude::*;
use std::sync::Arc;

use crate::config::LibraryConfig;
use crate::models::MediaEntry;
use crate::similarity::{IndelRatio, Similarity};

/// Phase that produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    ExactPath,
    Substring,
    Fuzzy,
}

/// Matches for a query, in ranked order
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Phase that matched, `None` when nothing did
    pub phase: Option<MatchPhase>,
    pub entries: Vec<MediaEntry>,
}

/// How a caller should present a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    NotFound,
    Single(&'a MediaEntry),
    Ambiguous(&'a [MediaEntry]),
}

impl Resolution {
    fn empty() -> Self {
        Self::default()
    }

    fn found(phase: MatchPhase, entries: Vec<MediaEntry>) -> Self {
        Self {
            phase: Some(phase),
            entries,
        }
    }

    pub fn outcome(&self) -> Outcome<'_> {
        match self.entries.as_slice() {
            [] => Outcome::NotFound,
            [single] => Outcome::Single(single),
            many => Outcome::Ambiguous(many),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<MediaEntry> {
        self.entries
    }
}

/// Normalize a raw title query: `\` becomes `/`, surrounding whitespace and
/// leading `/` or `./` are dropped.
pub fn normalize_query(query: &str) -> String {
    let mut q = query.trim().replace('\\', "/");
    loop {
        if let Some(rest) = q.strip_prefix("./") {
            q = rest.to_string();
        } else if let Some(rest) = q.strip_prefix('/') {
            q = rest.to_string();
        } else {
            break;
        }
    }
    q
}

/// Three-phase title resolver
#[derive(Clone)]
pub struct Resolver {
    similarity: Arc<dyn Similarity>,
    threshold: f64,
    case_sensitive: bool,
    match_base_name: bool,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("threshold", &self.threshold)
            .field("case_sensitive", &self.case_sensitive)
            .field("match_base_name", &self.match_base_name)
            .finish_non_exhaustive()
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(
            Arc::new(IndelRatio),
            crate::config::DEFAULT_FUZZY_THRESHOLD,
            false,
        )
    }
}

impl Resolver {
    pub fn new(similarity: Arc<dyn Similarity>, threshold: f64, case_sensitive: bool) -> Self {
        Self {
            similarity,
            threshold,
            case_sensitive,
            match_base_name: false,
        }
    }

    pub fn from_config(config: &LibraryConfig, similarity: Arc<dyn Similarity>) -> Self {
        Self::new(similarity, config.fuzzy_threshold, config.case_sensitive)
            .with_base_name_matching(config.fuzzy_match_base_name)
    }

    /// Also score the approximate phase against the base name, keeping the
    /// better of the two scores
    pub fn with_base_name_matching(mut self, enabled: bool) -> Self {
        self.match_base_name = enabled;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn fold(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    }

    /// Resolve `query` against `entries`, returning at most `limit` matches
    pub fn resolve(&self, entries: &[MediaEntry], query: &str, limit: usize) -> Resolution {
        let query = normalize_query(query);
        if query.is_empty() || limit == 0 {
            return Resolution::empty();
        }

        if let Some(entry) = self.exact_path(entries, &query) {
            log::debug!("Exact path match for {:?}", query);
            return Resolution::found(MatchPhase::ExactPath, vec![entry.clone()]);
        }

        let folded = self.fold(&query);
        let substring: Vec<MediaEntry> = entries
            .iter()
            .filter(|e| self.fold(&e.display_name).contains(&folded))
            .take(limit)
            .cloned()
            .collect();
        if !substring.is_empty() {
            log::debug!("{} substring match(es) for {:?}", substring.len(), query);
            return Resolution::found(MatchPhase::Substring, substring);
        }

        let fuzzy = self.fuzzy(entries, &folded, limit);
        if fuzzy.is_empty() {
            log::debug!("No match for {:?}", query);
            return Resolution::empty();
        }
        log::debug!("{} approximate match(es) for {:?}", fuzzy.len(), query);
        Resolution::found(MatchPhase::Fuzzy, fuzzy)
    }

    /// Case-exact match first, then the first case-insensitive one
    fn exact_path<'a>(&self, entries: &'a [MediaEntry], query: &str) -> Option<&'a MediaEntry> {
        entries
            .iter()
            .find(|e| e.relative_path == query)
            .or_else(|| {
                if self.case_sensitive {
                    return None;
                }
                let folded = query.to_lowercase();
                entries
                    .iter()
                    .find(|e| e.relative_path.to_lowercase() == folded)
            })
    }

    fn fuzzy(&self, entries: &[MediaEntry], folded: &str, limit: usize) -> Vec<MediaEntry> {
        let matched: Vec<&MediaEntry> = entries
            .par_iter()
            .filter(|e| self.score(folded, e) >= self.threshold)
            .collect();
        matched.into_iter().take(limit).cloned().collect()
    }

    fn score(&self, folded: &str, entry: &MediaEntry) -> f64 {
        let display = self.similarity.similarity(folded, &self.fold(&entry.display_name));
        if !self.match_base_name {
            return display;
        }
        let base = self.similarity.similarity(folded, &self.fold(&entry.base_name));
        display.max(base)
    }
}
