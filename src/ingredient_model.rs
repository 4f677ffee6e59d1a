//! # Ingredient and Measurement Data Model
//!
//! This module defines the value objects that flow through the engine: the raw
//! input line, the parser's structured output, the matcher's verdict, the
//! measurement unit reference rows and the converter's display result.
//!
//! ## Core Concepts
//!
//! - **ParsedIngredient**: quantity, unit, name and preparation split out of one line
//! - **IngredientFragment**: one name candidate of an "X or Y" line
//! - **MatchResult**: which canonical ingredient a line resolved to, and how surely
//! - **MeasurementUnit**: a row of the unit directory with its metric pivot factor
//! - **ConversionResult**: a scaled and converted amount ready for display
//!
//! ## Usage
//!
//! ```rust
//! use ingredients::ingredient_parser::parse;
//!
//! let parsed = parse("2 1/2 cups whole wheat flour, sifted");
//! assert_eq!(parsed.quantity_amount, Some(2.5));
//! assert_eq!(parsed.quantity_unit.as_deref(), Some("cups"));
//! assert_eq!(parsed.name, "whole wheat flour");
//! assert_eq!(parsed.preparation.as_deref(), Some("sifted"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One raw ingredient line as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    /// The line exactly as written in the recipe
    pub text: String,

    /// Recipe identifier, used as tracing context only
    pub recipe_id: Option<String>,

    /// Recipe title, used as tracing context only
    pub recipe_title: Option<String>,
}

impl RawLine {
    /// Create a raw line without recipe context
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            recipe_id: None,
            recipe_title: None,
        }
    }

    /// Attach recipe context for log correlation
    pub fn with_recipe(mut self, recipe_id: &str, recipe_title: &str) -> Self {
        self.recipe_id = Some(recipe_id.to_string());
        self.recipe_title = Some(recipe_title.to_string());
        self
    }
}

/// One ingredient name candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientFragment {
    /// Lowercased, whitespace-normalized name (accents kept)
    pub name: String,

    /// Name as written, casing preserved
    pub display_name: String,
}

impl IngredientFragment {
    /// Build a fragment from the name as it appears in the line
    pub fn from_display(display_name: &str) -> Self {
        let display_name = display_name.split_whitespace().collect::<Vec<_>>().join(" ");
        Self {
            name: display_name.to_lowercase(),
            display_name,
        }
    }
}

/// Structured output of the line parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIngredient {
    /// Leading amount; for a range this is the lower bound
    pub quantity_amount: Option<f64>,

    /// Upper bound when the quantity was written as a range ("2-3")
    pub quantity_range_max: Option<f64>,

    /// Unit token as written ("cups", "tbsp"); absent for count-only items
    pub quantity_unit: Option<String>,

    /// Primary ingredient name, lowercased and trimmed
    pub name: String,

    /// Primary ingredient name with its original casing
    pub display_name: String,

    /// Clause after the last top-level comma ("sifted", "diced")
    pub preparation: Option<String>,

    /// Parenthetical remarks ("all-purpose", "14 oz")
    pub note: Option<String>,

    /// Vague quantity qualifier split off the name ("to taste", "optional")
    pub qualifier: Option<String>,

    /// Additional name candidates from an "or" pattern, in line order
    pub alternatives: Vec<IngredientFragment>,

    /// Original line, verbatim
    pub raw_text: String,
}

/// The name shape of a parsed line, as seen by the matcher
#[derive(Debug, Clone, PartialEq)]
pub enum NameCandidates<'a> {
    /// A single ingredient name
    Single(IngredientFragment),
    /// An "X or Y" line: the first-listed fragment plus the others
    Either {
        primary: IngredientFragment,
        alternatives: &'a [IngredientFragment],
    },
}

impl ParsedIngredient {
    /// An empty parse of the given line
    pub fn empty(raw_text: &str) -> Self {
        Self {
            quantity_amount: None,
            quantity_range_max: None,
            quantity_unit: None,
            name: String::new(),
            display_name: String::new(),
            preparation: None,
            note: None,
            qualifier: None,
            alternatives: Vec::new(),
            raw_text: raw_text.to_string(),
        }
    }

    /// The primary name as a fragment
    pub fn primary(&self) -> IngredientFragment {
        IngredientFragment {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
        }
    }

    /// Classify the line as a single name or an or-pattern
    pub fn candidates(&self) -> NameCandidates<'_> {
        let primary = self.primary();
        if self.alternatives.is_empty() {
            NameCandidates::Single(primary)
        } else {
            NameCandidates::Either {
                primary,
                alternatives: &self.alternatives,
            }
        }
    }

    /// Total number of name candidates, primary included
    pub fn fragment_count(&self) -> usize {
        1 + self.alternatives.len()
    }

    /// Whether the line carried a measurable quantity
    pub fn has_quantity(&self) -> bool {
        self.quantity_amount.is_some()
    }

    /// Whether the quantity was written as a range
    pub fn is_range(&self) -> bool {
        self.quantity_range_max.is_some()
    }
}

impl fmt::Display for ParsedIngredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(amount) = self.quantity_amount {
            write!(f, "{}", amount)?;
            if let Some(max) = self.quantity_range_max {
                write!(f, "-{}", max)?;
            }
            write!(f, " ")?;
        }
        if let Some(unit) = &self.quantity_unit {
            write!(f, "{} ", unit)?;
        }
        write!(f, "{}", self.display_name)?;
        for alternative in &self.alternatives {
            write!(f, " or {}", alternative.display_name)?;
        }
        if let Some(preparation) = &self.preparation {
            write!(f, ", {}", preparation)?;
        }
        Ok(())
    }
}

/// How a match was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Exact,
    Alias,
    Fuzzy,
    OrPatternEquivalent,
    Unmatched,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Alias => "alias",
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::OrPatternEquivalent => "or_pattern_equivalent",
            MatchMethod::Unmatched => "unmatched",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the directory matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Canonical ingredient id; absent when unmatched
    pub ingredient_id: Option<i64>,

    /// Canonical ingredient name, for display
    pub canonical_name: Option<String>,

    pub match_method: MatchMethod,

    /// Confidence in [0, 1]
    pub match_confidence: f64,

    /// Human-readable explanation of the decision
    pub match_notes: String,

    /// Whether a human should confirm this match
    pub needs_review: bool,
}

impl MatchResult {
    /// Whether any canonical ingredient was selected
    pub fn is_matched(&self) -> bool {
        self.ingredient_id.is_some()
    }
}

/// Entry of the canonical ingredient directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalIngredient {
    pub id: i64,

    /// Canonical singular name ("tomato")
    pub name: String,

    /// Registered plural form ("tomatoes")
    #[serde(default)]
    pub plural: Option<String>,

    /// Alternative names ("scallion" for "green onion")
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Coarse grouping used to judge substitutes ("dairy", "fat/oil")
    #[serde(default)]
    pub family: Option<String>,
}

impl CanonicalIngredient {
    /// Create a directory entry with just a name
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            plural: None,
            aliases: Vec::new(),
            family: None,
        }
    }

    pub fn with_plural(mut self, plural: &str) -> Self {
        self.plural = Some(plural.to_string());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_family(mut self, family: &str) -> Self {
        self.family = Some(family.to_string());
        self
    }
}

/// Measurement dimension of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    Volume,
    Weight,
    Count,
    Other,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Volume => "volume",
            UnitType::Weight => "weight",
            UnitType::Count => "count",
            UnitType::Other => "other",
        }
    }

    /// Parse a stored unit type; anything unrecognized is `Other`
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "volume" => UnitType::Volume,
            "weight" => UnitType::Weight,
            "count" => UnitType::Count,
            _ => UnitType::Other,
        }
    }
}

/// Measurement system a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasureSystem {
    Metric,
    Imperial,
}

impl MeasureSystem {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "metric" => Some(MeasureSystem::Metric),
            "imperial" | "us" | "us_customary" => Some(MeasureSystem::Imperial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureSystem::Metric => "metric",
            MeasureSystem::Imperial => "imperial",
        }
    }
}

/// Row of the measurement unit directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementUnit {
    pub unit_code: String,
    pub display_singular: String,
    pub display_plural: String,
    pub unit_type: UnitType,

    /// Measurement system, when the unit belongs to one
    #[serde(default)]
    pub system: Option<MeasureSystem>,

    /// Grams per unit (weight units only)
    #[serde(default)]
    pub metric_g: Option<f64>,

    /// Milliliters per unit (volume units only)
    #[serde(default)]
    pub metric_ml: Option<f64>,

    /// Other spellings, matched case-insensitively
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl MeasurementUnit {
    pub fn is_metric(&self) -> bool {
        self.system == Some(MeasureSystem::Metric)
    }

    pub fn is_imperial(&self) -> bool {
        self.system == Some(MeasureSystem::Imperial)
    }

    /// Display form for the given amount
    pub fn display_for(&self, amount: f64) -> &str {
        if amount > 1.0 {
            &self.display_plural
        } else {
            &self.display_singular
        }
    }
}

/// Target measurement system requested by the display layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Keep the unit as written
    Native,
    Metric,
    Imperial,
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" | "original" => Ok(UnitSystem::Native),
            "metric" => Ok(UnitSystem::Metric),
            "imperial" | "us" => Ok(UnitSystem::Imperial),
            other => Err(format!("unknown unit system: {}", other)),
        }
    }
}

/// Display-ready output of the converter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub amount: f64,
    pub unit: String,

    /// Amount and unit formatted for display, e.g. "1½ cups"
    pub display_text: String,

    /// Whether the unit was changed
    pub converted: bool,
}

impl fmt::Display for ConversionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_from_display() {
        let fragment = IngredientFragment::from_display("  Fresno   Chiles ");
        assert_eq!(fragment.name, "fresno chiles");
        assert_eq!(fragment.display_name, "Fresno Chiles");
    }

    #[test]
    fn test_candidates_shape() {
        let mut parsed = ParsedIngredient::empty("butter or oil");
        parsed.name = "butter".to_string();
        parsed.display_name = "butter".to_string();
        assert!(matches!(parsed.candidates(), NameCandidates::Single(_)));

        parsed.alternatives.push(IngredientFragment::from_display("oil"));
        match parsed.candidates() {
            NameCandidates::Either { primary, alternatives } => {
                assert_eq!(primary.name, "butter");
                assert_eq!(alternatives.len(), 1);
            }
            NameCandidates::Single(_) => panic!("Expected an or-pattern"),
        }
        assert_eq!(parsed.fragment_count(), 2);
    }

    #[test]
    fn test_match_method_serialization() {
        let json = serde_json::to_string(&MatchMethod::OrPatternEquivalent).unwrap();
        assert_eq!(json, "\"or_pattern_equivalent\"");
        assert_eq!(MatchMethod::Unmatched.to_string(), "unmatched");
    }

    #[test]
    fn test_unit_system_from_str() {
        assert_eq!("Metric".parse::<UnitSystem>().unwrap(), UnitSystem::Metric);
        assert_eq!("us".parse::<UnitSystem>().unwrap(), UnitSystem::Imperial);
        assert!("martian".parse::<UnitSystem>().is_err());
    }

    #[test]
    fn test_measurement_unit_deserializes_with_defaults() {
        let json = r#"{"unit_code":"pinch","display_singular":"pinch","display_plural":"pinches","unit_type":"other"}"#;
        let unit: MeasurementUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.unit_type, UnitType::Other);
        assert!(unit.metric_g.is_none());
        assert!(unit.aliases.is_empty());
        assert!(!unit.is_metric());
    }

    #[test]
    fn test_display_formatting() {
        let mut parsed = ParsedIngredient::empty("2-3 cups Flour or meal, sifted");
        parsed.quantity_amount = Some(2.0);
        parsed.quantity_range_max = Some(3.0);
        parsed.quantity_unit = Some("cups".to_string());
        parsed.name = "flour".to_string();
        parsed.display_name = "Flour".to_string();
        parsed.alternatives.push(IngredientFragment::from_display("meal"));
        parsed.preparation = Some("sifted".to_string());
        assert_eq!(parsed.to_string(), "2-3 cups Flour or meal, sifted");
    }
}
