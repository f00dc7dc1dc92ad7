//! Forbidden-path filter
//!
//! A path is forbidden when its `/`-normalized, lowercased form contains any
//! configured rule as a plain substring. Rules are not anchored to path
//! segments, so `wordpress` also hides `old/wordpress_backup/x.mp3`.

/// Ordered set of case-insensitive substring rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenFilter {
    rules: Vec<String>,
}

impl ForbiddenFilter {
    /// Build a filter from raw rules. Empty rules are dropped, since they
    /// would match every path.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = rules
            .into_iter()
            .map(|r| normalize(r.as_ref()))
            .filter(|r| !r.is_empty())
            .collect();
        Self { rules }
    }

    /// Normalized rules, in configured order
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Whether `relative_path` matches any rule
    pub fn is_forbidden(&self, relative_path: &str) -> bool {
        if self.rules.is_empty() || relative_path.is_empty() {
            return false;
        }
        let path = normalize(relative_path);
        self.rules.iter().any(|rule| path.contains(rule.as_str()))
    }

    /// First rule matching `relative_path`, for diagnostics
    pub fn matching_rule(&self, relative_path: &str) -> Option<&str> {
        let path = normalize(relative_path);
        self.rules
            .iter()
            .find(|rule| path.contains(rule.as_str()))
            .map(String::as_str)
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").to_lowercase()
}
