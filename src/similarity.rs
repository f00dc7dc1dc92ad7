//! Approximate string similarity used for fuzzy title matching

/// Similarity capability returning a score in `0.0..=1.0`
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Normalized indel similarity: `2 * lcs(a, b) / (len(a) + len(b))`,
/// computed over Unicode scalar values.
///
/// Two empty strings are identical (1.0); one empty string scores 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelRatio;

impl Similarity for IndelRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let total = a.len() + b.len();
        if total == 0 {
            return 1.0;
        }
        let lcs = lcs_len(&a, &b);
        (2 * lcs) as f64 / total as f64
    }
}

/// Longest common subsequence length, two-row dynamic programme
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
