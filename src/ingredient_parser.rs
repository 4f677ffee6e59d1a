//! # Ingredient Parser
//!
//! This module turns one free-text ingredient line into a [`ParsedIngredient`].
//! Parsing never fails: lines without a quantity, a unit or even a name come
//! back as partial structures and the caller decides what to do with them.
//!
//! ## Features
//!
//! - Quantities as integers, decimals, fractions (1/2, 2 1/4) and vulgar
//!   fractions (½, 1½)
//! - Ranges (2-3, 1 to 2): the lower bound is kept as the amount
//! - Unit spellings from a static vocabulary, including "fl oz" and "tbsp."
//! - Preparation clauses after the last top-level comma
//! - "X or Y" alternatives, with shared head nouns ("purple or green cabbage")
//!
//! ## Usage
//!
//! ```rust
//! use ingredients::ingredient_parser::parse;
//!
//! let parsed = parse("2 jalapeños or fresno chiles");
//! assert_eq!(parsed.quantity_amount, Some(2.0));
//! assert_eq!(parsed.name, "jalapeños");
//! assert_eq!(parsed.alternatives[0].name, "fresno chiles");
//! ```

use crate::ingredient_model::{IngredientFragment, ParsedIngredient};
use crate::measurement_patterns::{
    is_unit_surface_form, is_variant_word, quantity_value, QUALIFIER_PHRASES, RANGE_REGEX,
    SINGLE_QUANTITY_REGEX,
};
use crate::text_processing::{
    collapse_whitespace, extract_parentheticals, post_process_ingredient_name,
    split_last_top_level_comma, split_top_level_or,
};
use tracing::{debug, trace};

/// A quantity recognized at the start of a line
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityToken<'a> {
    pub amount: f64,
    pub range_max: Option<f64>,
    /// Text following the quantity
    pub rest: &'a str,
}

/// Parse a single ingredient line
///
/// # Arguments
///
/// * `raw_text` - One ingredient line as written in the recipe
///
/// # Returns
///
/// A [`ParsedIngredient`] whose `raw_text` is the input unchanged. Missing
/// parts stay unset; an empty line gives an empty name.
///
/// # Examples
///
/// ```rust
/// use ingredients::ingredient_parser::parse;
///
/// let parsed = parse("2 or 3 cloves garlic, minced");
/// assert_eq!(parsed.quantity_amount, Some(2.0));
/// assert_eq!(parsed.quantity_range_max, Some(3.0));
/// assert_eq!(parsed.quantity_unit.as_deref(), Some("cloves"));
/// assert_eq!(parsed.name, "garlic");
/// assert_eq!(parsed.preparation.as_deref(), Some("minced"));
/// ```
pub fn parse(raw_text: &str) -> ParsedIngredient {
    let mut parsed = ParsedIngredient::empty(raw_text);
    let line = collapse_whitespace(raw_text);
    if line.is_empty() {
        trace!("Empty ingredient line");
        return parsed;
    }

    let (head, preparation) = split_last_top_level_comma(&line);
    parsed.preparation = preparation;

    let mut notes = Vec::new();
    let mut rest: &str = &head;

    if let Some(quantity) = consume_quantity(rest) {
        parsed.quantity_amount = Some(quantity.amount);
        parsed.quantity_range_max = quantity.range_max;
        rest = consume_leading_parenthetical(quantity.rest, &mut notes);

        if let Some((unit, remainder)) = consume_unit(rest) {
            parsed.quantity_unit = Some(unit);
            rest = remainder;
        }
    }

    let (name_text, groups) = extract_parentheticals(rest);
    notes.extend(groups);
    if !notes.is_empty() {
        parsed.note = Some(notes.join("; "));
    }

    let (name_text, qualifier) = split_qualifier(&name_text);
    parsed.qualifier = qualifier;

    let mut fragments = share_head_nouns(split_top_level_or(&name_text))
        .into_iter()
        .map(|fragment| post_process_ingredient_name(&fragment))
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| IngredientFragment::from_display(&fragment));

    if let Some(primary) = fragments.next() {
        parsed.name = primary.name;
        parsed.display_name = primary.display_name;
    }
    parsed.alternatives = fragments.collect();

    debug!(
        "Parsed '{}': amount={:?} unit={:?} name='{}' alternatives={}",
        raw_text,
        parsed.quantity_amount,
        parsed.quantity_unit,
        parsed.name,
        parsed.alternatives.len()
    );

    parsed
}

/// Parse a multi-line block, one ingredient per non-blank line, in order
pub fn parse_ingredient_block(text: &str) -> Vec<ParsedIngredient> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse)
        .collect()
}

/// Recognize a leading quantity
///
/// A range or numeric alternative ("2-3", "1½-2", "1 to 2", "2 or 3") is
/// tried before a single quantity ("1 1/2", "1½", "0.5", "¾").
///
/// # Arguments
///
/// * `text` - The text to scan, usually a line with its preparation removed
///
/// # Returns
///
/// The lower bound as `amount`, the upper bound of a range as `range_max`,
/// and the text after the quantity. `None` when the text does not start with
/// a number, a denominator is zero, or the number is a hyphenated size
/// ("3-inch").
///
/// # Examples
///
/// ```rust
/// use ingredients::ingredient_parser::consume_quantity;
///
/// let token = consume_quantity("1 1/2-2 cups stock").unwrap();
/// assert_eq!(token.amount, 1.5);
/// assert_eq!(token.range_max, Some(2.0));
/// assert_eq!(token.rest, "cups stock");
///
/// assert!(consume_quantity("3-inch cinnamon stick").is_none());
/// ```
pub fn consume_quantity(text: &str) -> Option<QuantityToken<'_>> {
    let text = text.trim_start();

    let (amount, range_max, end) = if let Some(c) = RANGE_REGEX.captures(text) {
        let first = quantity_value(&c[1])?;
        let second = quantity_value(&c[2])?;
        (first.min(second), Some(first.max(second)), c.get(0)?.end())
    } else if let Some(c) = SINGLE_QUANTITY_REGEX.captures(text) {
        (quantity_value(&c[1])?, None, c.get(0)?.end())
    } else {
        return None;
    };

    let rest = &text[end..];
    if rest.starts_with(|c: char| c == '-' || c == '–') {
        trace!("Hyphenated size after number, not a quantity: '{}'", text);
        return None;
    }

    Some(QuantityToken {
        amount,
        range_max,
        rest: rest.trim_start(),
    })
}

/// Recognize a unit spelling at the start of `text`
///
/// Two-word spellings ("fl oz") win over one-word ones. Returns the unit as
/// written (minus a trailing dot) and the remaining text.
pub fn consume_unit(text: &str) -> Option<(String, &str)> {
    let (first, after_first) = split_first_word(text)?;
    let first = first.trim_end_matches('.');

    if let Some((second, after_second)) = split_first_word(after_first) {
        let second = second.trim_end_matches('.');
        let candidate = format!("{} {}", first, second);
        if is_unit_surface_form(&candidate.to_lowercase()) {
            return Some((candidate, after_second));
        }
    }

    if !first.is_empty() && is_unit_surface_form(&first.to_lowercase()) {
        return Some((first.to_string(), after_first));
    }

    None
}

fn split_first_word(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    if text.is_empty() {
        return None;
    }
    match text.find(char::is_whitespace) {
        Some(pos) => Some((&text[..pos], text[pos..].trim_start())),
        None => Some((text, "")),
    }
}

/// "1 (14 oz) can tomatoes": keep the size remark out of the unit slot
fn consume_leading_parenthetical<'a>(text: &'a str, notes: &mut Vec<String>) -> &'a str {
    if !text.starts_with('(') {
        return text;
    }
    match text.find(')') {
        Some(close) => {
            let inner = collapse_whitespace(&text[1..close]);
            if !inner.is_empty() {
                notes.push(inner);
            }
            text[close + 1..].trim_start()
        }
        None => text,
    }
}

/// Move a trailing vague-quantity phrase ("to taste") out of the name
fn split_qualifier(name: &str) -> (String, Option<String>) {
    let lowered = name.to_lowercase();
    for phrase in QUALIFIER_PHRASES.iter() {
        if lowered == *phrase {
            return (String::new(), Some(phrase.to_string()));
        }
        if let Some(stripped) = lowered.strip_suffix(*phrase) {
            if stripped.ends_with(' ') {
                // Lowercasing can change byte lengths; cut by char count
                let keep = stripped.chars().count();
                let head: String = name.chars().take(keep).collect();
                return (head.trim().to_string(), Some(phrase.to_string()));
            }
        }
    }
    (name.to_string(), None)
}

/// Give bare variant fragments the head noun of the last fragment:
/// ["purple", "green cabbage"] becomes ["purple cabbage", "green cabbage"]
fn share_head_nouns(fragments: Vec<String>) -> Vec<String> {
    if fragments.len() < 2 {
        return fragments;
    }

    let last_words: Vec<&str> = fragments[fragments.len() - 1].split_whitespace().collect();
    let head_noun: Vec<&str> = last_words
        .iter()
        .copied()
        .skip_while(|word| is_variant_word(&word.to_lowercase()))
        .collect();
    if head_noun.is_empty() || head_noun.len() == last_words.len() {
        return fragments;
    }
    let head_noun = head_noun.join(" ");

    let last_index = fragments.len() - 1;
    fragments
        .into_iter()
        .enumerate()
        .map(|(i, fragment)| {
            let all_variants = fragment
                .split_whitespace()
                .all(|word| is_variant_word(&word.to_lowercase()));
            if i < last_index && all_variants {
                format!("{} {}", fragment, head_noun)
            } else {
                fragment
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_ingredient() {
        let result = parse("2 cups flour");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("cups"));
        assert_eq!(result.name, "flour");
        assert!(result.alternatives.is_empty());
        assert_eq!(result.raw_text, "2 cups flour");
    }

    #[test]
    fn test_parse_fraction_ingredient() {
        let result = parse("1/2 tsp salt");
        assert_eq!(result.quantity_amount, Some(0.5));
        assert_eq!(result.quantity_unit.as_deref(), Some("tsp"));
        assert_eq!(result.name, "salt");

        let result = parse("2 1/4 cups butter");
        assert_eq!(result.quantity_amount, Some(2.25));
        assert_eq!(result.name, "butter");
    }

    #[test]
    fn test_parse_vulgar_fractions() {
        let result = parse("½ cup sugar");
        assert_eq!(result.quantity_amount, Some(0.5));

        let result = parse("1½ cups milk");
        assert_eq!(result.quantity_amount, Some(1.5));
        assert_eq!(result.quantity_unit.as_deref(), Some("cups"));

        let result = parse("1 ¾ cups milk");
        assert_eq!(result.quantity_amount, Some(1.75));
    }

    #[test]
    fn test_parse_range_ingredient() {
        let result = parse("2-3 tbsp olive oil");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_range_max, Some(3.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("tbsp"));
        assert_eq!(result.name, "olive oil");
        assert!(result.is_range());

        let result = parse("1 to 2 cups stock");
        assert_eq!(result.quantity_amount, Some(1.0));
        assert_eq!(result.quantity_range_max, Some(2.0));
    }

    #[test]
    fn test_parse_range_with_mixed_lower_bound() {
        for line in ["1½-2 cups chicken stock", "1 1/2-2 cups chicken stock", "1 ½ to 2 cups chicken stock"] {
            let result = parse(line);
            assert_eq!(result.quantity_amount, Some(1.5), "{}", line);
            assert_eq!(result.quantity_range_max, Some(2.0), "{}", line);
            assert_eq!(result.quantity_unit.as_deref(), Some("cups"), "{}", line);
            assert_eq!(result.name, "chicken stock", "{}", line);
        }
    }

    #[test]
    fn test_parse_numeric_alternative_is_a_range() {
        let result = parse("2 or 3 cloves garlic");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_range_max, Some(3.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("cloves"));
        assert_eq!(result.name, "garlic");
        assert!(result.alternatives.is_empty());

        // A name disjunction after the unit is still split
        let result = parse("1 or 2 tbsp butter or oil");
        assert_eq!(result.quantity_range_max, Some(2.0));
        assert_eq!(result.name, "butter");
        assert_eq!(result.alternatives[0].name, "oil");
    }

    #[test]
    fn test_parse_preparation() {
        let result = parse("2 1/2 cups whole wheat flour, sifted");
        assert_eq!(result.quantity_amount, Some(2.5));
        assert_eq!(result.name, "whole wheat flour");
        assert_eq!(result.preparation.as_deref(), Some("sifted"));

        let result = parse("1 onion, peeled, finely diced");
        assert_eq!(result.name, "onion, peeled");
        assert_eq!(result.preparation.as_deref(), Some("finely diced"));
    }

    #[test]
    fn test_parse_with_note() {
        let result = parse("2 cups flour (all-purpose)");
        assert_eq!(result.name, "flour");
        assert_eq!(result.note.as_deref(), Some("all-purpose"));

        let result = parse("1 (14 oz) can diced tomatoes");
        assert_eq!(result.quantity_amount, Some(1.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("can"));
        assert_eq!(result.name, "diced tomatoes");
        assert_eq!(result.note.as_deref(), Some("14 oz"));
    }

    #[test]
    fn test_parse_no_quantity() {
        let result = parse("salt to taste");
        assert_eq!(result.quantity_amount, None);
        assert_eq!(result.quantity_unit, None);
        assert_eq!(result.name, "salt");
        assert_eq!(result.qualifier.as_deref(), Some("to taste"));

        let result = parse("eggs");
        assert_eq!(result.name, "eggs");
        assert!(!result.has_quantity());
    }

    #[test]
    fn test_parse_count_only() {
        let result = parse("2 eggs");
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_unit, None);
        assert_eq!(result.name, "eggs");
    }

    #[test]
    fn test_parse_empty_line() {
        let result = parse("   ");
        assert_eq!(result.name, "");
        assert_eq!(result.quantity_amount, None);
        assert_eq!(result.quantity_unit, None);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn test_parse_units_with_punctuation() {
        let result = parse("1 tbsp. honey");
        assert_eq!(result.quantity_unit.as_deref(), Some("tbsp"));
        assert_eq!(result.name, "honey");

        let result = parse("8 fl oz cream");
        assert_eq!(result.quantity_unit.as_deref(), Some("fl oz"));
        assert_eq!(result.name, "cream");

        let result = parse("500g butter");
        assert_eq!(result.quantity_amount, Some(500.0));
        assert_eq!(result.quantity_unit.as_deref(), Some("g"));
        assert_eq!(result.name, "butter");

        let result = parse("2 cups of flour");
        assert_eq!(result.name, "flour");
    }

    #[test]
    fn test_parse_or_pattern() {
        let result = parse("2 jalapeños or fresno chiles");
        assert_eq!(result.fragment_count(), 2);
        assert_eq!(result.quantity_amount, Some(2.0));
        assert_eq!(result.quantity_unit, None);
        assert_eq!(result.name, "jalapeños");
        assert_eq!(result.alternatives[0].name, "fresno chiles");
    }

    #[test]
    fn test_parse_or_pattern_shares_head_noun() {
        let result = parse("1/2 head purple or green cabbage, shredded");
        assert_eq!(result.quantity_unit.as_deref(), Some("head"));
        assert_eq!(result.name, "purple cabbage");
        assert_eq!(result.alternatives.len(), 1);
        assert_eq!(result.alternatives[0].name, "green cabbage");
        assert_eq!(result.preparation.as_deref(), Some("shredded"));
    }

    #[test]
    fn test_parse_or_inside_parentheses_is_not_a_disjunction() {
        let result = parse("2 tbsp oil (olive or canola)");
        assert_eq!(result.name, "oil");
        assert!(result.alternatives.is_empty());
        assert_eq!(result.note.as_deref(), Some("olive or canola"));
    }

    #[test]
    fn test_display_name_preserves_case() {
        let result = parse("1 cup Greek Yogurt");
        assert_eq!(result.name, "greek yogurt");
        assert_eq!(result.display_name, "Greek Yogurt");
    }

    #[test]
    fn test_hyphenated_size_is_not_a_quantity() {
        let result = parse("3-inch cinnamon stick");
        assert_eq!(result.quantity_amount, None);
        assert_eq!(result.name, "3-inch cinnamon stick");
    }

    #[test]
    fn test_zero_denominator_is_not_a_quantity() {
        let result = parse("1/0 cup sugar");
        assert_eq!(result.quantity_amount, None);
    }

    #[test]
    fn test_parse_ingredient_block() {
        let text = "2 cups flour\n\n1 tbsp salt\n1/2 tsp pepper\nsome mysterious ingredient";
        let parsed = parse_ingredient_block(text);
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed[0].name, "flour");
        assert_eq!(parsed[1].name, "salt");
        assert_eq!(parsed[2].name, "pepper");
        assert_eq!(parsed[3].name, "some mysterious ingredient");
    }

    #[test]
    fn test_consume_unit() {
        assert_eq!(consume_unit("cups flour"), Some(("cups".to_string(), "flour")));
        assert_eq!(consume_unit("fluid ounces milk"), Some(("fluid ounces".to_string(), "milk")));
        assert_eq!(consume_unit("large eggs"), None);
        assert_eq!(consume_unit(""), None);
    }
}
