//! OCR noise cleanup applied before any field extraction.
//!
//! Extractors downstream are line-oriented, so every repair here keeps line
//! boundaries intact; only runs of horizontal whitespace and stacks of blank
//! lines are collapsed.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Unicode quote variants OCR emits in place of ASCII punctuation.
const QUOTE_VARIANTS: [char; 7] = [
    '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{0060}', '\u{00B4}', '\u{2032}',
];

/// Literal OCR misreads, applied in order until none match. A replacement is
/// never longer than its pattern and always drops a confusable character.
const LITERAL_FIXES: [(&str, &str); 11] = [
    ("OS /", "05 /"),
    ("OB /", "08 /"),
    ("OI /", "01 /"),
    ("/-", "-"),
    ("I/", "/"),
    ("|/", "/"),
    ("\\ /", ""),
    ("OS '/", "05 /"),
    ("OB '/", "08 /"),
    ("OI '/", "01 /"),
    ("O5 '/", "05 /"),
];

static RE_HSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());
static RE_DIGIT_BACKSLASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\\\s*/").unwrap());
static RE_DIGIT_APOSTROPHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2,3})\s*'\s*/").unwrap());
// Registration-number shaped tokens: 451/KS.O2.OO, B-123/PEM/2025
static RE_NUMBER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[A-Z0-9Ol]{1,8}[\-/.][A-Z0-9Ol.\-/]{2,}\b").unwrap());

/// Clean OCR artifacts from raw document text.
///
/// Total and pure: empty input yields empty output. The result is a fixed
/// point, so `normalize(&normalize(t)) == normalize(t)`.
pub fn normalize(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    // each pass only shortens the text or removes confusable characters
    for _ in 0..8 {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut t: String = text
        .replace("\r\n", "\n")
        .chars()
        .map(|c| if QUOTE_VARIANTS.contains(&c) { ' ' } else { c })
        .collect();
    t = RE_HSPACE.replace_all(&t, " ").into_owned();

    loop {
        let mut changed = false;
        for (from, to) in LITERAL_FIXES {
            if t.contains(from) {
                t = t.replace(from, to);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    t = RE_DIGIT_BACKSLASH.replace_all(&t, "${1}/").into_owned();
    t = RE_DIGIT_APOSTROPHE.replace_all(&t, "${1} /").into_owned();
    t = RE_NUMBER_SHAPE
        .replace_all(&t, |caps: &Captures| caps[0].replace('O', "0").replace('l', "1"))
        .into_owned();

    t = RE_HSPACE.replace_all(&t, " ").into_owned();
    t = RE_BLANK_RUN.replace_all(&t, "\n\n").into_owned();
    t.trim().to_string()
}

/// Collapse internal whitespace and trim label punctuation from a value.
/// All-caps values are converted to title case.
pub(crate) fn normalize_line(value: &str) -> Option<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = collapsed.trim_matches(|c| c == ' ' || c == ':' || c == '-');
    if cleaned.is_empty() {
        return None;
    }
    if is_upper(cleaned) {
        return Some(title_case(cleaned));
    }
    Some(cleaned.to_string())
}

/// True when the text has at least one cased character and no lowercase ones.
pub(crate) fn is_upper(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Upper-case the first letter of every letter run, lower-case the rest.
pub(crate) fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_cased = true;
        } else {
            out.push(c);
            prev_cased = false;
        }
    }
    out
}

/// Lines of `text`, trimmed, blank ones dropped.
pub(crate) fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// First `n` characters of `text`, respecting char boundaries.
pub(crate) fn prefix_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_matches_word_starts() {
        assert_eq!(title_case("UNDANGAN RAPAT RT 05"), "Undangan Rapat Rt 05");
        assert_eq!(title_case("451/KS"), "451/Ks");
    }

    #[test]
    fn is_upper_requires_a_cased_char() {
        assert!(is_upper("PERMOHONAN 12"));
        assert!(!is_upper("12/34"));
        assert!(!is_upper("Permohonan"));
    }

    #[test]
    fn prefix_chars_handles_multibyte() {
        assert_eq!(prefix_chars("ééé", 2), "éé");
        assert_eq!(prefix_chars("ab", 10), "ab");
    }

    #[test]
    fn normalize_line_strips_label_punctuation() {
        assert_eq!(normalize_line(" :  Undangan   Rapat - ").as_deref(), Some("Undangan Rapat"));
        assert_eq!(normalize_line(" : - "), None);
    }
}
