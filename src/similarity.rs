//! # Similarity Scoring Module
//!
//! Fuzzy-tier scoring lives behind [`SimilarityScorer`] so the matcher's tier
//! and review logic does not depend on a particular string metric. Both
//! inputs are names already normalized for matching.

use strsim::{jaro_winkler, normalized_levenshtein};

/// Scores how close a query name is to a directory name
pub trait SimilarityScorer: Send + Sync {
    /// Similarity in [0, 1] when the pair counts as a fuzzy match, `None` otherwise
    fn similarity(&self, query: &str, candidate: &str) -> Option<f64>;

    /// Short identifier used in match notes
    fn name(&self) -> &'static str;
}

/// Substring containment in either direction, or a small relative edit distance
///
/// Containment scores the length ratio of the two names; when the shorter
/// name sits in the longer one as whole words the score is lifted halfway to
/// 1.0, so "kosher salt" ~ "salt" outranks "peppercorn" ~ "pepper".
#[derive(Debug, Clone)]
pub struct ContainmentEditDistanceScorer {
    /// Largest Levenshtein distance, as a share of the longer name, still accepted
    pub max_relative_distance: f64,
}

impl ContainmentEditDistanceScorer {
    pub fn new(max_relative_distance: f64) -> Self {
        Self {
            max_relative_distance: max_relative_distance.clamp(0.0, 1.0),
        }
    }
}

impl SimilarityScorer for ContainmentEditDistanceScorer {
    fn similarity(&self, query: &str, candidate: &str) -> Option<f64> {
        if query.is_empty() || candidate.is_empty() {
            return None;
        }

        let edit_similarity = normalized_levenshtein(query, candidate);
        let by_edit = (1.0 - edit_similarity <= self.max_relative_distance).then_some(edit_similarity);

        let (shorter, longer) = if query.chars().count() <= candidate.chars().count() {
            (query, candidate)
        } else {
            (candidate, query)
        };
        let by_containment = longer.contains(shorter).then(|| {
            let ratio = shorter.chars().count() as f64 / longer.chars().count() as f64;
            if contains_words(longer, shorter) {
                (1.0 + ratio) / 2.0
            } else {
                ratio
            }
        });

        match (by_edit, by_containment) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    fn name(&self) -> &'static str {
        "containment+levenshtein"
    }
}

/// Jaro-Winkler similarity above a fixed threshold
#[derive(Debug, Clone)]
pub struct JaroWinklerScorer {
    pub threshold: f64,
}

impl JaroWinklerScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl SimilarityScorer for JaroWinklerScorer {
    fn similarity(&self, query: &str, candidate: &str) -> Option<f64> {
        if query.is_empty() || candidate.is_empty() {
            return None;
        }
        let score = jaro_winkler(query, candidate);
        (score >= self.threshold).then_some(score)
    }

    fn name(&self) -> &'static str {
        "jaro-winkler"
    }
}

/// Whether `needle` appears in `haystack` as a run of whole words
fn contains_words(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}
