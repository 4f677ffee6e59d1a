//! # Directory Matcher Module
//!
//! Resolves parsed ingredient names against the canonical directory.
//!
//! ## Tiers
//!
//! 1. Exact: canonical name or registered plural (confidence 1.0)
//! 2. Alias: any registered alias (confidence 0.9)
//! 3. Fuzzy: the configured [`SimilarityScorer`] accepts the pair; confidence
//!    is scaled into the 0.6-0.8 band by similarity
//! 4. Unmatched (confidence 0.0)
//!
//! ## Or-patterns
//!
//! Every fragment of an "X or Y" line is matched on its own. Fragments that
//! resolve to the same canonical entry or the same family are equivalent;
//! otherwise the first-listed fragment's match is kept and flagged for
//! review. Each determination is handed to the optional [`DecisionLog`].

use crate::config::MatcherConfig;
use crate::decision_log::{DecisionLog, DecisionRecord};
use crate::directory::{entry_forms, IngredientDirectory};
use crate::errors::{EngineError, EngineResult};
use crate::ingredient_model::{
    CanonicalIngredient, IngredientFragment, MatchMethod, MatchResult, NameCandidates, ParsedIngredient,
};
use crate::similarity::{ContainmentEditDistanceScorer, SimilarityScorer};
use crate::text_processing::normalize_for_matching;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Match outcome for a single name fragment
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMatch {
    pub fragment: IngredientFragment,
    /// Name as compared against the directory
    pub normalized: String,
    pub ingredient: Option<CanonicalIngredient>,
    pub method: MatchMethod,
    pub confidence: f64,
    /// Short explanation of how the tier was reached
    pub detail: String,
}

impl FragmentMatch {
    fn unmatched(fragment: &IngredientFragment, normalized: String) -> Self {
        let detail = format!("No directory entry for '{}'", fragment.display_name);
        Self {
            fragment: fragment.clone(),
            normalized,
            ingredient: None,
            method: MatchMethod::Unmatched,
            confidence: 0.0,
            detail,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.ingredient.is_some()
    }

    fn family(&self) -> &str {
        self.ingredient
            .as_ref()
            .and_then(|i| i.family.as_deref())
            .unwrap_or("unclassified")
    }

    fn describe(&self) -> String {
        match &self.ingredient {
            Some(ingredient) => format!("'{}' ({})", ingredient.name, self.family()),
            None => format!("'{}' (unmatched)", self.fragment.display_name),
        }
    }
}

/// Tiered matcher over an injected directory
pub struct IngredientMatcher {
    directory: Arc<dyn IngredientDirectory>,
    scorer: Arc<dyn SimilarityScorer>,
    decision_log: Option<Arc<dyn DecisionLog>>,
    config: MatcherConfig,
}

impl IngredientMatcher {
    /// Matcher using the containment + edit distance scorer
    pub fn new(directory: Arc<dyn IngredientDirectory>, config: MatcherConfig) -> Self {
        let scorer = Arc::new(ContainmentEditDistanceScorer::new(config.fuzzy_max_relative_distance));
        Self {
            directory,
            scorer,
            decision_log: None,
            config,
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn SimilarityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_decision_log(mut self, decision_log: Arc<dyn DecisionLog>) -> Self {
        self.decision_log = Some(decision_log);
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Match a parsed line
    ///
    /// Fails only with [`EngineError::DirectoryUnavailable`]; an unmatched
    /// name is a successful result.
    pub async fn match_ingredient(&self, parsed: &ParsedIngredient) -> EngineResult<MatchResult> {
        self.match_in_recipe(parsed, None).await
    }

    /// Match a parsed line, tagging any decision record with the recipe
    ///
    /// # Arguments
    ///
    /// * `parsed` - Output of the line parser
    /// * `recipe_id` - Recipe the line belongs to, for the decision log
    ///
    /// # Returns
    ///
    /// The primary fragment's match, or an or-pattern resolution when the
    /// line lists alternatives. Errors only with
    /// [`EngineError::DirectoryUnavailable`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ingredients::config::MatcherConfig;
    /// use ingredients::directory::InMemoryIngredientDirectory;
    /// use ingredients::ingredient_model::{CanonicalIngredient, MatchMethod};
    /// use ingredients::ingredient_parser::parse;
    /// use ingredients::matcher::IngredientMatcher;
    /// use std::sync::Arc;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let directory = InMemoryIngredientDirectory::new(vec![
    ///         CanonicalIngredient::new(1, "butter").with_family("dairy"),
    ///         CanonicalIngredient::new(2, "vegetable oil").with_alias("oil").with_family("fat/oil"),
    ///     ]);
    ///     let matcher = IngredientMatcher::new(Arc::new(directory), MatcherConfig::default());
    ///
    ///     let result = matcher.match_in_recipe(&parse("2 tbsp butter or oil"), Some("r-1")).await?;
    ///     assert_eq!(result.match_method, MatchMethod::Exact);
    ///     assert!(result.needs_review);
    ///     Ok(())
    /// }
    /// ```
    pub async fn match_in_recipe(
        &self,
        parsed: &ParsedIngredient,
        recipe_id: Option<&str>,
    ) -> EngineResult<MatchResult> {
        let mut result = match parsed.candidates() {
            NameCandidates::Single(primary) => {
                let primary = self.match_fragment(&primary).await?;
                self.single_result(primary)
            }
            NameCandidates::Either { primary, alternatives } => {
                let primary = self.match_fragment(&primary).await?;
                let mut others = Vec::with_capacity(alternatives.len());
                for alternative in alternatives {
                    others.push(self.match_fragment(alternative).await?);
                }
                self.resolve_alternatives(parsed, recipe_id, primary, others)
            }
        };

        if let (Some(low), Some(high)) = (parsed.quantity_amount, parsed.quantity_range_max) {
            append_note(
                &mut result.match_notes,
                &format!("Quantity given as range {}-{}; using lower bound {}", low, high, low),
            );
        }

        trace!(
            "Matched '{}': {} {:.2} review={}",
            parsed.raw_text,
            result.match_method,
            result.match_confidence,
            result.needs_review
        );
        Ok(result)
    }

    /// Run the tiers for one name fragment
    pub async fn match_fragment(&self, fragment: &IngredientFragment) -> EngineResult<FragmentMatch> {
        let normalized = normalize_for_matching(&fragment.name);
        if normalized.is_empty() {
            return Ok(FragmentMatch::unmatched(fragment, normalized));
        }

        let candidates = self
            .directory
            .lookup_candidates(&normalized)
            .await
            .map_err(|e| {
                warn!("Ingredient directory lookup for '{}' failed: {}", normalized, e);
                match e {
                    EngineError::DirectoryUnavailable(_) => e,
                    other => EngineError::DirectoryUnavailable(other.to_string()),
                }
            })?;

        let matches_form = |form: &str| normalize_for_matching(form) == normalized;

        let exact = candidates.iter().find(|c| {
            matches_form(&c.name) || c.plural.as_deref().is_some_and(|p| matches_form(p))
        });
        if let Some(entry) = exact {
            return Ok(self.fragment_match(
                fragment,
                normalized,
                entry,
                MatchMethod::Exact,
                self.config.exact_confidence,
                format!("Exact match '{}'", entry.name),
            ));
        }

        let alias = candidates
            .iter()
            .find_map(|c| c.aliases.iter().find(|a| matches_form(a)).map(|a| (c, a)));
        if let Some((entry, alias)) = alias {
            return Ok(self.fragment_match(
                fragment,
                normalized,
                entry,
                MatchMethod::Alias,
                self.config.alias_confidence,
                format!("Alias '{}' of '{}'", alias, entry.name),
            ));
        }

        let mut best: Option<(&CanonicalIngredient, f64)> = None;
        for candidate in &candidates {
            for form in entry_forms(candidate) {
                let Some(similarity) = self.scorer.similarity(&normalized, &normalize_for_matching(form)) else {
                    continue;
                };
                if best.map_or(true, |(_, top)| similarity > top) {
                    best = Some((candidate, similarity));
                }
            }
        }
        if let Some((entry, similarity)) = best {
            let confidence = self.config.fuzzy_confidence(similarity);
            return Ok(self.fragment_match(
                fragment,
                normalized,
                entry,
                MatchMethod::Fuzzy,
                confidence,
                format!(
                    "Fuzzy match '{}' ~ '{}' (similarity {:.2}, {})",
                    fragment.display_name,
                    entry.name,
                    similarity,
                    self.scorer.name()
                ),
            ));
        }

        debug!("No match for '{}' among {} candidates", normalized, candidates.len());
        Ok(FragmentMatch::unmatched(fragment, normalized))
    }

    fn fragment_match(
        &self,
        fragment: &IngredientFragment,
        normalized: String,
        entry: &CanonicalIngredient,
        method: MatchMethod,
        confidence: f64,
        detail: String,
    ) -> FragmentMatch {
        FragmentMatch {
            fragment: fragment.clone(),
            normalized,
            ingredient: Some(entry.clone()),
            method,
            confidence,
            detail,
        }
    }

    fn single_result(&self, primary: FragmentMatch) -> MatchResult {
        let needs_review = self.config.needs_review(primary.confidence);
        let mut notes = primary.detail.clone();
        if needs_review && primary.is_matched() {
            append_note(&mut notes, &self.review_note(primary.confidence));
            debug!("Low-confidence match: {}", notes);
        }
        build_result(&primary, primary.method, primary.confidence, needs_review, notes)
    }

    fn resolve_alternatives(
        &self,
        parsed: &ParsedIngredient,
        recipe_id: Option<&str>,
        primary: FragmentMatch,
        alternatives: Vec<FragmentMatch>,
    ) -> MatchResult {
        let (equivalent, result) = if !primary.is_matched() {
            let resolved: Vec<String> = alternatives
                .iter()
                .filter(|a| a.is_matched())
                .map(FragmentMatch::describe)
                .collect();
            let mut notes = format!(
                "Primary alternative '{}' could not be matched",
                primary.fragment.display_name
            );
            if !resolved.is_empty() {
                append_note(
                    &mut notes,
                    &format!("other alternatives resolved to {}", resolved.join(", ")),
                );
            }
            (false, build_result(&primary, MatchMethod::Unmatched, 0.0, true, notes))
        } else if let Some(unresolved) = alternatives.iter().find(|a| !a.is_matched()) {
            let mut result = self.single_result(primary.clone());
            append_note(
                &mut result.match_notes,
                &format!(
                    "Alternative '{}' could not be matched; kept primary {}",
                    unresolved.fragment.display_name,
                    primary.describe()
                ),
            );
            (false, result)
        } else if let Some(divergent) = alternatives.iter().find(|a| !same_family(&primary, a)) {
            let names: Vec<String> = std::iter::once(&primary)
                .chain(alternatives.iter())
                .map(FragmentMatch::describe)
                .collect();
            let notes = format!(
                "Ambiguous alternatives: {} belong to different families; kept primary '{}' over '{}'",
                names.join(" vs "),
                primary.fragment.display_name,
                divergent.fragment.display_name
            );
            debug!("Or-pattern family mismatch in '{}': {}", parsed.raw_text, notes);
            (
                false,
                build_result(&primary, primary.method, primary.confidence, true, notes),
            )
        } else {
            let confidence = alternatives
                .iter()
                .map(|a| a.confidence)
                .fold(primary.confidence, f64::min);
            let all_same_entry = alternatives
                .iter()
                .all(|a| a.ingredient.as_ref().map(|i| i.id) == primary.ingredient.as_ref().map(|i| i.id));
            let basis = if all_same_entry {
                "the same ingredient".to_string()
            } else {
                format!("family '{}'", primary.family())
            };
            let alternative_names: Vec<&str> = alternatives
                .iter()
                .map(|a| a.fragment.display_name.as_str())
                .collect();
            let mut notes = format!(
                "Alternatives '{}' and '{}' resolve to {}; selected '{}' as primary",
                primary.fragment.display_name,
                alternative_names.join("', '"),
                basis,
                primary.fragment.display_name
            );
            let needs_review = self.config.needs_review(confidence);
            if needs_review {
                append_note(&mut notes, &self.review_note(confidence));
            }
            debug!("Or-pattern equivalent in '{}': {}", parsed.raw_text, notes);
            (
                true,
                build_result(&primary, MatchMethod::OrPatternEquivalent, confidence, needs_review, notes),
            )
        };

        self.log_decision(parsed, recipe_id, &primary, &alternatives, equivalent, &result.match_notes);
        result
    }

    fn log_decision(
        &self,
        parsed: &ParsedIngredient,
        recipe_id: Option<&str>,
        primary: &FragmentMatch,
        alternatives: &[FragmentMatch],
        equivalent: bool,
        reasoning: &str,
    ) {
        let Some(log) = &self.decision_log else {
            return;
        };
        let record = DecisionRecord::new(
            &parsed.raw_text,
            &primary.fragment.display_name,
            alternatives
                .iter()
                .map(|a| a.fragment.display_name.clone())
                .collect(),
        )
        .with_recipe(recipe_id)
        .with_determination(equivalent, reasoning);
        log.record(record);
    }

    fn review_note(&self, confidence: f64) -> String {
        format!(
            "Confidence {:.2} below review threshold {:.2}",
            confidence, self.config.review_threshold
        )
    }
}

fn same_family(a: &FragmentMatch, b: &FragmentMatch) -> bool {
    match (&a.ingredient, &b.ingredient) {
        (Some(x), Some(y)) if x.id == y.id => true,
        (Some(x), Some(y)) => match (&x.family, &y.family) {
            (Some(fx), Some(fy)) => fx.trim().eq_ignore_ascii_case(fy.trim()),
            _ => false,
        },
        _ => false,
    }
}

fn build_result(
    primary: &FragmentMatch,
    method: MatchMethod,
    confidence: f64,
    needs_review: bool,
    match_notes: String,
) -> MatchResult {
    let (ingredient_id, canonical_name) = match (&primary.ingredient, method) {
        (_, MatchMethod::Unmatched) | (None, _) => (None, None),
        (Some(ingredient), _) => (Some(ingredient.id), Some(ingredient.name.clone())),
    };
    MatchResult {
        ingredient_id,
        canonical_name,
        match_method: method,
        match_confidence: confidence,
        match_notes,
        needs_review,
    }
}

fn append_note(notes: &mut String, note: &str) {
    if !notes.is_empty() {
        notes.push_str("; ");
    }
    notes.push_str(note);
}
