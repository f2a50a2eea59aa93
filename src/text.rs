//! Text normalisation and the portal's pattern library
//!
//! Everything here is pure. The case-number pattern and the noise filter are
//! shared by the waiter, the extractor and the metadata parser.

use regex::Regex;
use std::sync::LazyLock;

/// Canonical CNJ case number: `NNNNNNN-DD.YYYY.J.TR.OOOO`
pub static CASE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{7}-\d{2}\.\d{4}\.\d\.\d{2}\.\d{4}\b").expect("invalid regex: case number"));

/// Boilerplate that must never be returned as an extracted value
pub static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(documentos?\s+juntados|documento\b|certid[aã]o|visualizar|pjeoffice|indispon[ií]vel|aplicativo\s+pjeoffice|página\b|resultados?\s+encontrados|recibo)",
    )
    .expect("invalid regex: noise")
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex: whitespace"));

/// Phrases the portal prints when the search has no hits, lowercased
const NO_RECORDS_PHRASES: &[&str] = &[
    "nenhum registro",
    "não foram encontrados",
    "nao foram encontrados",
    "nenhum resultado",
];

/// Collapse runs of whitespace into single spaces and trim
pub fn normalize(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// Keep ASCII digits only
pub fn sanitize_document(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// First case number found in `text`
pub fn find_case_number(text: &str) -> Option<&str> {
    CASE_NUMBER_RE.find(text).map(|m| m.as_str())
}

pub fn is_case_number(text: &str) -> bool {
    CASE_NUMBER_RE.is_match(text)
}

pub fn is_noise(text: &str) -> bool {
    NOISE_RE.is_match(text)
}

/// Whether page content carries an explicit "no records" notice
pub fn signals_no_records(content: &str) -> bool {
    let lower = content.to_lowercase();
    NO_RECORDS_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Split body text into normalized, non-empty lines
pub fn body_lines(body: &str) -> Vec<String> {
    body.replace('\r', "")
        .split('\n')
        .map(normalize)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Find the value for a labelled field.
///
/// A line matches when its lowercased text contains any of `keys`. The value
/// is the text after the first `:` or `-` on that line, or else the next
/// line. Candidates matching the noise filter are rejected and scanning
/// continues with the following lines.
pub fn find_labeled_value(lines: &[String], keys: &[&str]) -> Option<String> {
    let keys: Vec<String> = keys.iter().map(|k| k.to_lowercase()).collect();

    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !keys.iter().any(|k| lower.contains(k.as_str())) {
            continue;
        }

        if let Some(value) = inline_value(line)
            && !is_noise(value)
        {
            return Some(value.to_string());
        }

        if let Some(next) = lines.get(i + 1)
            && !is_noise(next)
        {
            return Some(next.clone());
        }
    }

    None
}

/// Right-hand side of `label: value` or `label - value`
fn inline_value(line: &str) -> Option<&str> {
    let idx = line.find([':', '-'])?;
    let value = line[idx + 1..].trim();
    (!value.is_empty()).then_some(value)
}

/// Cap `text` at `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
