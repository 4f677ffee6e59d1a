//! # Ingredient Directory Module
//!
//! The matcher reaches the canonical ingredient directory through the narrow
//! [`IngredientDirectory`] trait and never sees its storage format. This
//! module provides the trait and an in-memory implementation that can be
//! loaded from a JSON fixture; the Postgres implementation lives in `db`.

use crate::errors::EngineResult;
use crate::ingredient_model::CanonicalIngredient;
use crate::text_processing::normalize_for_matching;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info};

/// Minimum shared prefix, in characters, for a loose candidate
const CANDIDATE_PREFIX_LENGTH: usize = 3;

/// Read-only query surface over canonical ingredients
#[async_trait]
pub trait IngredientDirectory: Send + Sync {
    /// Entries whose name, plural or alias is plausibly related to
    /// `normalized_name`; the matcher decides which, if any, actually match
    async fn lookup_candidates(&self, normalized_name: &str) -> EngineResult<Vec<CanonicalIngredient>>;
}

/// Directory held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryIngredientDirectory {
    entries: Vec<CanonicalIngredient>,
}

impl InMemoryIngredientDirectory {
    pub fn new(entries: Vec<CanonicalIngredient>) -> Self {
        Self { entries }
    }

    /// Load entries from a JSON array of canonical ingredients
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let entries: Vec<CanonicalIngredient> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    /// Load entries from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let directory = Self::from_json_str(&json)?;
        info!(
            "Loaded {} canonical ingredients from {}",
            directory.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CanonicalIngredient] {
        &self.entries
    }
}

#[async_trait]
impl IngredientDirectory for InMemoryIngredientDirectory {
    async fn lookup_candidates(&self, normalized_name: &str) -> EngineResult<Vec<CanonicalIngredient>> {
        if normalized_name.is_empty() {
            return Ok(Vec::new());
        }

        let candidates: Vec<CanonicalIngredient> = self
            .entries
            .iter()
            .filter(|entry| {
                entry_forms(entry)
                    .iter()
                    .any(|form| is_related(normalized_name, &normalize_for_matching(form)))
            })
            .cloned()
            .collect();

        debug!(
            "Directory lookup '{}' returned {} candidates",
            normalized_name,
            candidates.len()
        );
        Ok(candidates)
    }
}

/// Every surface form registered for an entry: name, plural, aliases
pub fn entry_forms(entry: &CanonicalIngredient) -> Vec<&str> {
    let mut forms = vec![entry.name.as_str()];
    if let Some(plural) = &entry.plural {
        forms.push(plural.as_str());
    }
    forms.extend(entry.aliases.iter().map(String::as_str));
    forms
}

/// Loose relation used to pre-select candidates: substring either way, a
/// shared word, or a shared leading prefix
fn is_related(query: &str, form: &str) -> bool {
    if form.is_empty() {
        return false;
    }
    if query.contains(form) || form.contains(query) {
        return true;
    }
    let shares_word = query
        .split_whitespace()
        .filter(|word| word.chars().count() >= CANDIDATE_PREFIX_LENGTH)
        .any(|word| form.split_whitespace().any(|other| other == word));
    if shares_word {
        return true;
    }
    let prefix = |s: &str| s.chars().take(CANDIDATE_PREFIX_LENGTH).collect::<String>();
    query.chars().count() >= CANDIDATE_PREFIX_LENGTH && prefix(query) == prefix(form)
}
