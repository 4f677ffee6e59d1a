//! # Measurement Patterns Module
//!
//! This module contains the regex patterns and static vocabularies the line
//! parser uses: quantity shapes, the lightweight set of unit spellings,
//! vulgar fraction glyphs and the adjectives shared across "or" fragments.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Unicode vulgar fractions and their values
pub const VULGAR_FRACTIONS: &[(char, f64)] = &[
    ('¼', 0.25),
    ('½', 0.5),
    ('¾', 0.75),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
    ('⅕', 0.2),
    ('⅖', 0.4),
    ('⅗', 0.6),
    ('⅘', 0.8),
    ('⅙', 1.0 / 6.0),
    ('⅚', 5.0 / 6.0),
];

// One quantity: "1½", "1 1/2", "1/2", "1⁄2", "2.5", "2,5", "12" or a vulgar
// fraction glyph. Mixed forms come first; alternation is leftmost-first.
const QUANTITY_ATOM: &str =
    r"(?:\d+\s*[¼½¾⅓⅔⅛⅜⅝⅞⅕⅖⅗⅘⅙⅚]|\d+\s+\d+\s*[/⁄]\s*\d+|\d+\s*[/⁄]\s*\d+|\d+(?:[.,]\d+)?|[¼½¾⅓⅔⅛⅜⅝⅞⅕⅖⅗⅘⅙⅚])";

lazy_static! {
    /// "1½", "1 ½"
    pub static ref MIXED_VULGAR_REGEX: Regex =
        Regex::new(r"^(\d+)\s*([¼½¾⅓⅔⅛⅜⅝⅞⅕⅖⅗⅘⅙⅚])").expect("Mixed vulgar pattern should be valid");

    /// "1 1/2", "2 3⁄4"
    pub static ref MIXED_FRACTION_REGEX: Regex =
        Regex::new(r"^(\d+)\s+(\d+)\s*[/⁄]\s*(\d+)").expect("Mixed fraction pattern should be valid");

    /// "2-3", "2 – 3", "1 to 2", "½-1", "1½-2", "1 1/2-2", "2 or 3"
    pub static ref RANGE_REGEX: Regex = Regex::new(&format!(
        r"(?i)^({quantity})(?:\s*[-–—]\s*|\s+to\s+|\s+or\s+)({quantity})",
        quantity = QUANTITY_ATOM
    ))
    .expect("Range pattern should be valid");

    /// A single quantity, plain or mixed, at the start of the text
    pub static ref SINGLE_QUANTITY_REGEX: Regex =
        Regex::new(&format!(r"^({quantity})", quantity = QUANTITY_ATOM)).expect("Quantity pattern should be valid");

    /// Lightweight unit spellings recognized directly after a quantity
    pub static ref UNIT_SURFACE_FORMS: HashSet<&'static str> = [
        // Volume units
        "cup", "cups", "c",
        "tablespoon", "tablespoons", "tbsp", "tbsps", "tbs", "tbl", "tbls",
        "teaspoon", "teaspoons", "tsp", "tsps",
        "fl oz", "fl. oz", "fluid ounce", "fluid ounces",
        "pint", "pints", "pt",
        "quart", "quarts", "qt",
        "gallon", "gallons", "gal",
        "ml", "milliliter", "milliliters", "millilitre", "millilitres",
        "l", "liter", "liters", "litre", "litres",
        "dl", "deciliter", "deciliters", "cl", "centiliter", "centiliters",
        // Weight units
        "oz", "ounce", "ounces",
        "lb", "lbs", "pound", "pounds",
        "g", "gr", "gram", "grams", "gramme", "grammes",
        "kg", "kilogram", "kilograms", "kilogramme", "kilogrammes",
        "mg", "milligram", "milligrams",
        // Count and other units
        "pinch", "pinches", "dash", "dashes", "drop", "drops",
        "clove", "cloves", "can", "cans", "package", "packages", "pkg",
        "packet", "packets", "bottle", "bottles", "jar", "jars",
        "stick", "sticks", "slice", "slices", "piece", "pieces",
        "bunch", "bunches", "sprig", "sprigs", "handful", "handfuls",
        "head", "heads", "stalk", "stalks", "dozen",
    ]
    .into_iter()
    .collect();

    /// Adjectives and variants that can borrow the head noun of a sibling
    /// fragment ("purple or green cabbage")
    pub static ref VARIANT_WORDS: HashSet<&'static str> = [
        // Colors
        "red", "green", "yellow", "orange", "purple", "white", "black", "brown", "golden",
        // Sizes
        "large", "medium", "small", "big", "baby", "jumbo",
        // States
        "fresh", "dried", "frozen", "canned", "raw", "cooked", "smoked",
        "salted", "unsalted", "sweet", "sweetened", "unsweetened", "hot", "mild",
        "light", "dark", "whole", "skim", "low-fat", "nonfat", "full-fat",
        "ground", "sliced", "diced", "chopped", "minced", "shredded", "grated",
        "plain", "greek", "regular", "organic",
    ]
    .into_iter()
    .collect();

    /// Vague quantity phrases moved out of the name
    pub static ref QUALIFIER_PHRASES: Vec<&'static str> = vec![
        "or to taste", "to taste", "as needed", "as required", "if needed",
        "optional", "for garnish", "for serving", "for dusting", "for frying",
    ];
}

/// Numeric value of a vulgar fraction glyph
pub fn vulgar_value(glyph: char) -> Option<f64> {
    VULGAR_FRACTIONS
        .iter()
        .find(|(c, _)| *c == glyph)
        .map(|(_, value)| *value)
}

/// Numeric value of one number atom ("1/2", "2,5", "¾")
///
/// Returns `None` for a zero denominator.
pub fn atom_value(atom: &str) -> Option<f64> {
    let atom = atom.trim();

    if let Some((numerator, denominator)) = atom.split_once(|c: char| c == '/' || c == '⁄') {
        let numerator: f64 = numerator.trim().parse().ok()?;
        let denominator: f64 = denominator.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }

    let mut chars = atom.chars();
    if let (Some(glyph), None) = (chars.next(), chars.next()) {
        if let Some(value) = vulgar_value(glyph) {
            return Some(value);
        }
    }

    atom.replace(',', ".").parse().ok()
}

/// Numeric value of one quantity: a plain atom
/// or a mixed number ("1½", "1 1/2")
pub fn quantity_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let whole_match = |end: usize| end == text.len();

    if let Some(c) = MIXED_VULGAR_REGEX.captures(text) {
        if whole_match(c.get(0)?.end()) {
            let whole: f64 = c[1].parse().ok()?;
            return Some(whole + atom_value(&c[2])?);
        }
    }
    if let Some(c) = MIXED_FRACTION_REGEX.captures(text) {
        if whole_match(c.get(0)?.end()) {
            let whole: f64 = c[1].parse().ok()?;
            return Some(whole + atom_value(&format!("{}/{}", &c[2], &c[3]))?);
        }
    }
    atom_value(text)
}

/// Whether a lowercased token is a known unit spelling
pub fn is_unit_surface_form(token: &str) -> bool {
    UNIT_SURFACE_FORMS.contains(token)
}

/// Whether a lowercased word is a variant adjective
pub fn is_variant_word(word: &str) -> bool {
    VARIANT_WORDS.contains(word)
}
