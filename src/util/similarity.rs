//! Fuzzy string similarity on a 0–100 scale.
//!
//! Scores are derived from the insertion/deletion (indel) edit distance:
//! `ratio = 100 * (1 - indel / (len_a + len_b))`, which is equivalent to
//! `200 * lcs / (len_a + len_b)`. `partial_ratio` slides the shorter string
//! over every equally long window of the longer one and keeps the best ratio,
//! so `"invoice"` scores 100 against `"invoice_march.pdf"`.
//!
//! All comparisons are case-insensitive and ignore surrounding whitespace.
//! An empty input on either side scores 0.

use std::cmp::max;

/// Highest possible score.
pub const MAX_SCORE: f64 = 100.0;

/// Lowercase and trim a string before comparison.
pub fn normalize(s: &str) -> Vec<char> {
    s.trim().chars().flat_map(char::to_lowercase).collect()
}

/// Length of the longest common subsequence of two char slices.
///
/// Uses two rolling rows, so memory is linear in the shorter input.
#[allow(clippy::needless_range_loop)]
pub fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if inner.is_empty() {
        return 0;
    }

    let mut prev_row = vec![0usize; inner.len() + 1];
    let mut curr_row = vec![0usize; inner.len() + 1];

    for i in 1..=outer.len() {
        for j in 1..=inner.len() {
            curr_row[j] = if outer[i - 1] == inner[j - 1] {
                prev_row[j - 1] + 1
            } else {
                max(prev_row[j], curr_row[j - 1])
            };
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[inner.len()]
}

/// Indel distance: the number of insertions and deletions turning `a` into `b`.
pub fn indel_distance(a: &[char], b: &[char]) -> usize {
    a.len() + b.len() - 2 * lcs_len(a, b)
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    MAX_SCORE * (1.0 - indel_distance(a, b) as f64 / total as f64)
}

fn partial_ratio_chars(a: &[char], b: &[char]) -> f64 {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return 0.0;
    }
    if shorter.len() == longer.len() {
        return ratio_chars(shorter, longer);
    }

    let mut best = 0.0f64;
    for window in longer.windows(shorter.len()) {
        let score = ratio_chars(shorter, window);
        if score > best {
            best = score;
            if best >= MAX_SCORE {
                break;
            }
        }
    }
    best
}

/// Whole-string similarity between two strings.
pub fn ratio(a: &str, b: &str) -> f64 {
    ratio_chars(&normalize(a), &normalize(b))
}

/// Best similarity of the shorter string against any window of the longer.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    partial_ratio_chars(&normalize(a), &normalize(b))
}

/// Similarity scoring against a fixed term.
///
/// The term is normalized once and reused for every candidate.
#[derive(Debug, Clone)]
pub struct SimilarityMatcher {
    term: String,
    term_chars: Vec<char>,
}

impl SimilarityMatcher {
    /// Create a new matcher for the given term.
    pub fn new<S: Into<String>>(term: S) -> Self {
        let term = term.into();
        let term_chars = normalize(&term);
        SimilarityMatcher { term, term_chars }
    }

    /// Get the original term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Whole-string similarity to a candidate.
    pub fn ratio(&self, candidate: &str) -> f64 {
        ratio_chars(&self.term_chars, &normalize(candidate))
    }

    /// Partial similarity to a candidate.
    pub fn partial_ratio(&self, candidate: &str) -> f64 {
        partial_ratio_chars(&self.term_chars, &normalize(candidate))
    }

    /// Check whether the partial similarity reaches `threshold`.
    pub fn is_match(&self, candidate: &str, threshold: f64) -> bool {
        self.partial_ratio(candidate) >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_lcs_len() {
        assert_eq!(lcs_len(&chars(""), &chars("abc")), 0);
        assert_eq!(lcs_len(&chars("abc"), &chars("abc")), 3);
        assert_eq!(lcs_len(&chars("abcde"), &chars("ace")), 3);
        assert_eq!(lcs_len(&chars("kitten"), &chars("sitting")), 4);
    }

    #[test]
    fn test_indel_distance() {
        assert_eq!(indel_distance(&chars("abc"), &chars("abc")), 0);
        assert_eq!(indel_distance(&chars("abc"), &chars("abd")), 2);
        assert_eq!(indel_distance(&chars(""), &chars("ab")), 2);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("", ""), 0.0);
        assert_eq!(ratio("abc", ""), 0.0);
        assert_eq!(ratio("report", "REPORT"), 100.0);

        let score = ratio("report", "report.docx");
        assert!((score - 1200.0 / 17.0).abs() < 1e-9);
        assert!(ratio("report", "report.docx") > ratio("report", "report_final.pdf"));
        assert!(ratio("report", "banana.jpg") < 20.0);
    }

    #[test]
    fn test_partial_ratio() {
        assert_eq!(partial_ratio("invoice", "invoice_march.pdf"), 100.0);
        assert_eq!(partial_ratio("INVOICE", " invoice "), 100.0);
        assert_eq!(partial_ratio("", "anything"), 0.0);
        assert!(partial_ratio("invoce", "invoice.pdf") >= 80.0);
        assert!(partial_ratio("invoice", "holiday.png") < 60.0);
    }

    #[test]
    fn test_partial_ratio_is_symmetric() {
        assert_eq!(
            partial_ratio("quarterly report", "report"),
            partial_ratio("report", "quarterly report")
        );
    }

    #[test]
    fn test_similarity_matcher() {
        let matcher = SimilarityMatcher::new("Invoice");

        assert_eq!(matcher.term(), "Invoice");
        assert_eq!(matcher.partial_ratio("invoice-2024.pdf"), 100.0);
        assert!(matcher.is_match("invoice-2024.pdf", 85.0));
        assert!(!matcher.is_match("cat.gif", 85.0));
        assert!(matcher.ratio("invoice.pdf") > matcher.ratio("invoice_final_v2.pdf"));
    }
}
