//! Cover art matching
//!
//! Each image in the catalogue is scored against a track's base name and
//! the highest scoring image wins. Equal scores keep the image seen first.
//! An image scoring 0 is never returned.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::models::MediaEntry;

const SEPARATORS: [char; 3] = ['-', '_', ' '];

/// Score table for the cover matcher. Rules are tried from top to bottom
/// and the first one that applies decides an image's score.
///
/// | rule | applies when |
/// |---|---|
/// | `exact` | alphanumeric-only lowercase bases are equal |
/// | `prefix` | image base starts with `<track><sep>` |
/// | `suffix` | image base ends with `<sep><track>` |
/// | `contained` | normalized track base is inside the normalized image base |
/// | `keyword` | image name has cover/folder/front/album and contains the track base |
///
/// `prefix` and `suffix` are disabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverScores {
    pub exact: u32,
    pub prefix: Option<u32>,
    pub suffix: Option<u32>,
    pub contained: u32,
    pub keyword: u32,
}

impl Default for CoverScores {
    fn default() -> Self {
        Self {
            exact: 100,
            prefix: None,
            suffix: None,
            contained: 80,
            keyword: 70,
        }
    }
}

impl CoverScores {
    /// Table that ranks `<track> - cover` style names above plain containment
    pub fn separator_aware() -> Self {
        Self {
            prefix: Some(95),
            suffix: Some(90),
            ..Self::default()
        }
    }
}

fn keyword_regex() -> &'static Regex {
    static KEYWORD: OnceLock<Regex> = OnceLock::new();
    KEYWORD.get_or_init(|| {
        Regex::new(r"(?i)\b(cover|folder|front|album)\b").expect("keyword pattern is valid")
    })
}

/// Lowercase and keep only alphanumeric characters
pub fn normalize_base(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Scores images against track base names
#[derive(Debug, Clone, Default)]
pub struct CoverMatcher {
    scores: CoverScores,
}

impl CoverMatcher {
    pub fn new(scores: CoverScores) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &CoverScores {
        &self.scores
    }

    /// Score one image base name against a track base name
    pub fn score(&self, track_base: &str, image_base: &str) -> u32 {
        if track_base.trim().is_empty() {
            return 0;
        }
        let norm_track = normalize_base(track_base);
        let norm_image = normalize_base(image_base);
        if !norm_track.is_empty() && norm_image == norm_track {
            return self.scores.exact;
        }

        let track_lower = track_base.to_lowercase();
        let image_lower = image_base.to_lowercase();
        if let Some(score) = self.scores.prefix {
            if has_affix(&image_lower, &track_lower, Affix::Prefix) {
                return score;
            }
        }
        if let Some(score) = self.scores.suffix {
            if has_affix(&image_lower, &track_lower, Affix::Suffix) {
                return score;
            }
        }

        if !norm_track.is_empty() && norm_image.contains(&norm_track) {
            return self.scores.contained;
        }
        // Only reachable when the track base has no alphanumerics left
        // after normalization.
        if keyword_regex().is_match(image_base) && image_lower.contains(&track_lower) {
            return self.scores.keyword;
        }
        0
    }

    /// Best image for `track_base` among `images`
    pub fn best<'a, I>(&self, track_base: &str, images: I) -> Option<&'a MediaEntry>
    where
        I: IntoIterator<Item = &'a MediaEntry>,
    {
        let mut best: Option<(&MediaEntry, u32)> = None;
        for image in images {
            let score = self.score(track_base, &image.base_name);
            if score == 0 {
                continue;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((image, score));
            }
        }
        if let Some((image, score)) = best {
            log::debug!(
                "Cover for {:?}: {} (score {})",
                track_base,
                image.relative_path,
                score
            );
        }
        best.map(|(image, _)| image)
    }
}

#[derive(Clone, Copy)]
enum Affix {
    Prefix,
    Suffix,
}

fn has_affix(image: &str, track: &str, affix: Affix) -> bool {
    if track.is_empty() || image.len() <= track.len() {
        return false;
    }
    match affix {
        Affix::Prefix => image
            .strip_prefix(track)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| SEPARATORS.contains(&c)),
        Affix::Suffix => image
            .strip_suffix(track)
            .and_then(|rest| rest.chars().last())
            .is_some_and(|c| SEPARATORS.contains(&c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;
    use std::path::PathBuf;

    fn image(name: &str) -> MediaEntry {
        MediaEntry::new(
            PathBuf::from(format!("/music/{}", name)),
            name.to_string(),
            name.to_string(),
            0,
            MediaKind::Image,
        )
    }

    #[test]
    fn test_exact_beats_prefix_and_unrelated() {
        let images = vec![
            image("Song One - cover.png"),
            image("Song One.jpg"),
            image("random.jpg"),
        ];
        for matcher in [
            CoverMatcher::default(),
            CoverMatcher::new(CoverScores::separator_aware()),
        ] {
            let best = matcher.best("Song One", &images).unwrap();
            assert_eq!(best.display_name, "Song One.jpg");
            assert!(matcher.score("Song One", "Song One - cover") <= 95);
            assert_eq!(matcher.score("Song One", "random"), 0);
        }
    }

    #[test]
    fn test_default_table() {
        let m = CoverMatcher::default();
        assert_eq!(m.score("Song One", "song_one"), 100);
        assert_eq!(m.score("Song One", "Song One (Remaster) front"), 80);
        assert_eq!(m.score("Song One", "Song One - cover"), 80);
        assert_eq!(m.score("Song One", "unrelated"), 0);
    }

    #[test]
    fn test_keyword_rule() {
        let m = CoverMatcher::default();
        assert_eq!(m.score("a.b", "A.B Cover"), 80);
        assert_eq!(m.score("!!", "front !!"), 70);
        assert_eq!(m.score("!!", "frontcover !!"), 0);
        assert_eq!(m.score("!!", "!!"), 0);
    }

    #[test]
    fn test_separator_aware_table() {
        let m = CoverMatcher::new(CoverScores::separator_aware());
        assert_eq!(m.score("Song One", "Song One"), 100);
        assert_eq!(m.score("Song One", "Song One - cover"), 95);
        assert_eq!(m.score("Song One", "song one_front"), 95);
        assert_eq!(m.score("Song One", "Artist - Song One"), 90);
        assert_eq!(m.score("Song One", "Song Ones"), 80);
    }

    #[test]
    fn test_first_seen_wins_ties() {
        let images = vec![image("Song One (a).jpg"), image("Song One (b).jpg")];
        let best = CoverMatcher::default().best("Song One", &images).unwrap();
        assert_eq!(best.display_name, "Song One (a).jpg");
    }

    #[test]
    fn test_no_candidates() {
        let images = vec![image("random.jpg")];
        assert!(CoverMatcher::default().best("Song One", &images).is_none());
        assert!(CoverMatcher::default().best("", &images).is_none());
    }
}
