//! # Recipe Ingestion Module
//!
//! Runs the parser and the matcher over every line of a recipe. Lines are
//! independent, so they are processed concurrently with bounded fan-out;
//! results are put back in the recipe's own order before returning.

use crate::config::BatchConfig;
use crate::errors::EngineResult;
use crate::ingredient_model::{MatchResult, ParsedIngredient, RawLine};
use crate::ingredient_parser::parse;
use crate::matcher::IngredientMatcher;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, info_span, Instrument};

/// A parsed and matched recipe line, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedIngredient {
    /// Zero-based position in the recipe's ingredient list
    pub position: usize,
    pub parsed: ParsedIngredient,
    pub match_result: MatchResult,
}

/// Parse and match every line of a recipe
///
/// Fails only if the ingredient directory is unavailable. The returned
/// items are in the same order as `lines`.
pub async fn ingest_recipe(
    matcher: &IngredientMatcher,
    lines: &[RawLine],
    config: &BatchConfig,
) -> EngineResult<Vec<IngestedIngredient>> {
    let concurrency = config.max_concurrency.max(1);
    info!(
        "Ingesting {} ingredient lines (concurrency {})",
        lines.len(),
        concurrency
    );

    let mut items: Vec<IngestedIngredient> = stream::iter(lines.iter().enumerate())
        .map(|(position, line)| {
            let span = info_span!(
                "ingredient_line",
                recipe_id = line.recipe_id.as_deref().unwrap_or(""),
                recipe_title = line.recipe_title.as_deref().unwrap_or(""),
                line_index = position
            );
            async move {
                let parsed = parse(&line.text);
                let match_result = matcher
                    .match_in_recipe(&parsed, line.recipe_id.as_deref())
                    .await?;
                debug!("Line {} -> {}", position, match_result.match_method);
                Ok::<_, crate::errors::EngineError>(IngestedIngredient {
                    position,
                    parsed,
                    match_result,
                })
            }
            .instrument(span)
        })
        .buffer_unordered(concurrency)
        .try_collect()
        .await?;

    items.sort_by_key(|item| item.position);
    Ok(items)
}

/// Ingest a pasted block of ingredient lines, skipping blank lines
pub async fn ingest_text_block(
    matcher: &IngredientMatcher,
    recipe_id: &str,
    recipe_title: &str,
    text: &str,
    config: &BatchConfig,
) -> EngineResult<Vec<IngestedIngredient>> {
    let lines: Vec<RawLine> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| RawLine::new(line).with_recipe(recipe_id, recipe_title))
        .collect();
    ingest_recipe(matcher, &lines, config).await
}

/// Counts over an ingested recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub or_patterns: usize,
    pub needs_review: usize,
    pub unmatched: usize,
    /// Raw text of every line flagged for review, in recipe order
    pub review_lines: Vec<String>,
}

/// Summarize match outcomes for display or logging
pub fn summarize_batch(items: &[IngestedIngredient]) -> BatchSummary {
    let mut summary = BatchSummary {
        total: items.len(),
        ..Default::default()
    };

    for item in items {
        let result = &item.match_result;
        if result.is_matched() {
            summary.matched += 1;
        } else {
            summary.unmatched += 1;
        }
        if !item.parsed.alternatives.is_empty() {
            summary.or_patterns += 1;
        }
        if result.needs_review {
            summary.needs_review += 1;
            summary.review_lines.push(item.parsed.raw_text.clone());
        }
    }

    summary
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ingredients: {} matched, {} unmatched, {} need review",
            self.total, self.matched, self.unmatched, self.needs_review
        )?;
        for line in &self.review_lines {
            write!(f, "\n  - {}", line)?;
        }
        Ok(())
    }
}
