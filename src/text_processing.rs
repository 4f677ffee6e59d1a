//! # Text Processing Module
//!
//! This module provides the string utilities shared by the parser and the
//! matcher:
//!
//! - Whitespace collapsing and ingredient name clean-up
//! - Parenthesis-aware splitting on commas and on the word "or"
//! - Accent stripping and plural folding for directory comparisons

use tracing::{trace, warn};

/// Maximum length for ingredient names (truncated at a word boundary if longer)
pub const MAX_INGREDIENT_NAME_LENGTH: usize = 100;

/// Collapse runs of whitespace to single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Split `text` at the last comma outside parentheses
///
/// A comma between two digits ("1,5 kg") is a decimal separator, not a
/// boundary. Returns the head and the trimmed tail when a boundary exists.
pub fn split_last_top_level_comma(text: &str) -> (String, Option<String>) {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut depth: i32 = 0;
    let mut boundary = None;

    for (i, &(byte_pos, c)) in chars.iter().enumerate() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = (depth - 1).max(0),
            ',' if depth == 0 => {
                let digit_before = i > 0 && chars[i - 1].1.is_ascii_digit();
                let digit_after = chars.get(i + 1).is_some_and(|(_, n)| n.is_ascii_digit());
                if !(digit_before && digit_after) {
                    boundary = Some(byte_pos);
                }
            }
            _ => {}
        }
    }

    match boundary {
        Some(pos) => {
            let head = text[..pos].trim().to_string();
            let tail = text[pos + 1..].trim().to_string();
            trace!("Split preparation clause: '{}' | '{}'", head, tail);
            (head, if tail.is_empty() { None } else { Some(tail) })
        }
        None => (text.trim().to_string(), None),
    }
}

/// Remove balanced top-level parenthetical groups, returning the remaining
/// text and the group contents in order
///
/// Unbalanced parentheses are left in place.
pub fn extract_parentheticals(text: &str) -> (String, Vec<String>) {
    let mut remaining = String::with_capacity(text.len());
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in text.chars() {
        match c {
            '(' => {
                if depth > 0 {
                    current.push(c);
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let group = collapse_whitespace(&current);
                    if !group.is_empty() {
                        groups.push(group);
                    }
                    current.clear();
                    remaining.push(' ');
                } else {
                    current.push(c);
                }
            }
            _ if depth > 0 => current.push(c),
            _ => remaining.push(c),
        }
    }

    if depth > 0 {
        // Unbalanced: give the text back untouched
        return (collapse_whitespace(text), Vec::new());
    }

    (collapse_whitespace(&remaining), groups)
}

/// Split a name on the word "or" (and "and/or") outside parentheses
///
/// Empty fragments are dropped, so "butter or" yields just "butter".
pub fn split_top_level_or(text: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth: i32 = 0;

    for word in text.split_whitespace() {
        let is_disjunction =
            depth == 0 && (word.eq_ignore_ascii_case("or") || word.eq_ignore_ascii_case("and/or"));

        if is_disjunction {
            fragments.push(current.join(" "));
            current.clear();
        } else {
            current.push(word);
        }

        depth += word.matches('(').count() as i32;
        depth = (depth - word.matches(')').count() as i32).max(0);
    }
    fragments.push(current.join(" "));

    fragments.retain(|fragment| !fragment.is_empty());
    fragments
}

/// Clean up an ingredient name extracted after the quantity and unit
///
/// - Removes a leading connective ("of ", "the ", "a ", "an ")
/// - Trims trailing punctuation
/// - Limits length to prevent overly long extractions
/// - Collapses whitespace
pub fn post_process_ingredient_name(raw_name: &str) -> String {
    let mut name = collapse_whitespace(raw_name);
    let original_name = name.clone();

    name = name
        .trim_end_matches(|c: char| !c.is_alphanumeric() && c != ')' && c != '\'')
        .to_string();

    for prefix in ["of ", "the ", "a ", "an "] {
        if name.to_lowercase().starts_with(prefix) {
            name = name[prefix.len()..].trim_start().to_string();
            break; // Only remove one prefix
        }
    }

    if name.len() > MAX_INGREDIENT_NAME_LENGTH {
        let mut cut = MAX_INGREDIENT_NAME_LENGTH;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        let truncated = &name[..cut];
        name = match truncated.rfind(' ') {
            Some(last_space) => truncated[..last_space].to_string(),
            None => truncated.to_string(),
        };
        warn!(
            "Ingredient name truncated due to length limit ({} > {}): '{}'",
            original_name.len(),
            MAX_INGREDIENT_NAME_LENGTH,
            name
        );
    }

    trace!("Post-processed ingredient name: '{}' -> '{}'", original_name, name);
    name.trim().to_string()
}

/// Replace common Latin accented letters with their base letters
pub fn strip_accents(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => out.push('A'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'ñ' => out.push('n'),
            'Ñ' => out.push('N'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => out.push('o'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => out.push('O'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('U'),
            'ý' | 'ÿ' => out.push('y'),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}

/// Fold a common English plural suffix on one lowercase word
pub fn singularize_word(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 {
        return word.to_string();
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    if let Some(stem) = word.strip_suffix("oes") {
        return format!("{}o", stem);
    }
    for suffix in ["ches", "shes", "sses", "xes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") && !word.ends_with("is") {
        return word[..word.len() - 1].to_string();
    }

    word.to_string()
}

/// Normalize a name for directory comparison: lowercase, strip accents,
/// drop punctuation, collapse whitespace and singularize the head noun
pub fn normalize_for_matching(name: &str) -> String {
    let lowered = strip_accents(&name.to_lowercase());
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '\'' { c } else { ' ' })
        .collect();

    let mut words: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
    if let Some(last) = words.last_mut() {
        *last = singularize_word(last);
    }
    words.join(" ")
}
