use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\s*\.\s*").expect("valid numbered prefix regex"));
static TEST_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:тест|test)\s*\d+(?:\.\d+)?\.?\s*").expect("valid test prefix regex")
});

pub fn normalize(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '\u{00A0}' | '\u{202F}' | '\r' | '\u{0007}' => cleaned.push(' '),
            '\u{200B}' | '\u{00AD}' | '\u{FEFF}' => {}
            'ё' | 'Ё' => cleaned.push('е'),
            _ => cleaned.extend(ch.to_lowercase()),
        }
    }
    condense_whitespace(&cleaned)
}

// Comparison key only; display text is never replaced by it.
pub fn match_key(input: &str) -> String {
    normalize(input)
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .collect()
}

pub fn is_match(left: &str, right: &str) -> bool {
    keys_match(&match_key(left), &match_key(right))
}

pub fn keys_match(left: &str, right: &str) -> bool {
    if left.is_empty() || right.is_empty() {
        return false;
    }
    left.contains(right) || right.contains(left)
}

pub fn contains_all(normalized: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .all(|keyword| normalized.contains(normalize(keyword).as_str()))
}

pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

pub fn strip_test_prefix(name: &str) -> String {
    let without_number = NUMBERED_PREFIX.replace(name, "");
    let without_test = TEST_PREFIX.replace(&without_number, "");
    without_test.trim().to_string()
}

pub fn split_test_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ';'])
        .map(|part| part.trim_matches(|ch: char| ch == ' ' || ch == '\t' || ch == '\r' || ch == ','))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '\u{00A0}' && *ch != '\u{202F}')
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn round_half_up(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    let scaled = value * factor;
    // Nudge past binary representation error so 2.675 rounds to 2.68.
    let nudged = scaled + scaled.signum() * 1e-9;
    nudged.round() / factor
}

pub fn format_decimal(value: f64, places: u32) -> String {
    let rounded = round_half_up(value, places);
    format!("{:.*}", places as usize, rounded).replace('.', ",")
}

pub fn format_score(raw: &str) -> String {
    let trimmed = raw.trim();
    match parse_number(trimmed) {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", value as i64),
        _ => trimmed.to_string(),
    }
}
