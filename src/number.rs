//! Registration number (`nomor surat`) extraction.
//!
//! Every strategy contributes weighted candidates; nothing short-circuits, so a
//! rejected label value falls through to the weaker strategies while a filename
//! hint can never beat evidence found in the text.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::candidate::{select_best, CandidateSource, ExtractionCandidate};
use crate::labels::{extract_labels, label_of, LabelKey};
use crate::normalize::normalize;

pub const WEIGHT_LABEL_BLOCK: u8 = 100;
pub const WEIGHT_AFTER_LABEL: u8 = 95;
pub const WEIGHT_SPLIT_TOKEN_EARLY: u8 = 75;
pub const WEIGHT_HEADER_TOKEN_EARLY: u8 = 70;
pub const WEIGHT_SPLIT_TOKEN_LATE: u8 = 65;
pub const WEIGHT_HEADER_TOKEN_LATE: u8 = 60;
pub const WEIGHT_FILENAME: u8 = 50;

/// Lines scanned for bare number tokens.
const HEADER_WINDOW: usize = 15;
/// Lines counted as the early part of the header.
const EARLY_LINES: usize = 8;

static AFTER_LABEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // e-surat numbers: e-0031/BM.00
        r"(?i)\b(?:Nomor|No|Nomer|Nemor)\s*[:.]?\s*(e-\d+[/\-][A-Za-z0-9./\-]+)",
        r"(?i)\b(?:Nomor|No|Nomer|Nemor)\s*[:.]?\s*(\d+[/\-][A-Za-z0-9./\-]+)",
        // OCR read the slash as a separate token: "31 /PU.01.00"
        r"(?i)\b(?:Nomor|No|Nomer|Nemor)\s*[:.]?\s*(\d+\s+[/\-][A-Za-z0-9./\-]+)",
        r"(?i)\b(?:Nomor|No)\s*\n\s*[:.]?\s*(\d+[/\-][A-Za-z0-9./\-]+)",
        // leading digits read as letters: "OS '/ KB.03.00"
        r"(?i)\b(?:Nomor|No|Nomer)\s*[:.]?\s*([A-Z]{1,2}\s*['\\/]\s*[A-Z]{2}\.[0-9.]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static RE_DATE_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{2,4}$").unwrap());
static RE_SPACE_BEFORE_SEP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s+([/\-])").unwrap());
static RE_HEADER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[/\-][A-Za-z0-9./\-]{2,}$").unwrap());
static RE_SPLIT_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2,3})\s+/\s+([A-Z]{2}\.\d{2}\.\d{2})").unwrap());
static RE_FILENAME_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[/\-][A-Za-z0-9./\-]+$").unwrap());
static RE_LEADING_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[:\-\s]+").unwrap());

/// Extract the registration number from raw document text.
pub fn extract_number(text: &str, filename: Option<&str>) -> Option<String> {
    number_from_clean(&normalize(text), filename)
}

pub(crate) fn number_from_clean(cleaned: &str, filename: Option<&str>) -> Option<String> {
    let candidates = number_candidates(cleaned, filename);
    match select_best(&candidates) {
        Some(best) => {
            info!(
                nomor = %best.value,
                confidence = best.confidence,
                source = best.source.as_str(),
                candidates = candidates.len(),
                "nomor extracted"
            );
            Some(best.value.clone())
        }
        None => {
            warn!("nomor surat not found");
            None
        }
    }
}

/// All number candidates in generation order, strongest strategy first.
pub fn number_candidates(cleaned: &str, filename: Option<&str>) -> Vec<ExtractionCandidate> {
    let mut candidates = Vec::new();

    if let Some(value) = extract_labels(cleaned).get(&LabelKey::Nomor) {
        let value = RE_LEADING_NOISE.replace(value, "");
        let value = value.trim_matches(|c| ".,;: ".contains(c));
        let has_digit = value.chars().any(|c| c.is_ascii_digit());
        let has_sep = value.contains(['/', '-', '.']);
        if value.chars().count() > 3 && has_digit && has_sep {
            candidates.push(ExtractionCandidate::new(value, WEIGHT_LABEL_BLOCK, CandidateSource::LabelBlock));
        }
    }

    for pattern in AFTER_LABEL_PATTERNS.iter() {
        let Some(caps) = pattern.captures(cleaned) else { continue };
        let raw = caps[1].trim().trim_matches(|c| ".,;: ".contains(c));
        let nomor = RE_SPACE_BEFORE_SEP.replace_all(raw, "${1}${2}").into_owned();
        if nomor.chars().count() > 3 && !RE_DATE_LIKE.is_match(&nomor) {
            candidates.push(ExtractionCandidate::new(nomor, WEIGHT_AFTER_LABEL, CandidateSource::AfterLabel));
        }
    }

    for (idx, line) in cleaned.lines().map(str::trim).take(HEADER_WINDOW).enumerate() {
        if line.is_empty() || label_of(line).is_some() {
            continue;
        }
        let early = idx < EARLY_LINES;
        for token in line.split_whitespace() {
            if RE_HEADER_TOKEN.is_match(token) && !RE_DATE_LIKE.is_match(token) {
                let weight = if early { WEIGHT_HEADER_TOKEN_EARLY } else { WEIGHT_HEADER_TOKEN_LATE };
                let value = token.trim_matches(|c| ".,;".contains(c));
                candidates.push(ExtractionCandidate::new(value, weight, CandidateSource::HeaderToken));
            }
        }
        if let Some(caps) = RE_SPLIT_TOKEN.captures(line) {
            let weight = if early { WEIGHT_SPLIT_TOKEN_EARLY } else { WEIGHT_SPLIT_TOKEN_LATE };
            let value = format!("{}/{}", &caps[1], &caps[2]);
            debug!(value = %value, weight, "split-token nomor");
            candidates.push(ExtractionCandidate::new(value, weight, CandidateSource::SplitToken));
        }
    }

    if let Some(token) = filename.and_then(filename_number) {
        candidates.push(ExtractionCandidate::new(token, WEIGHT_FILENAME, CandidateSource::Filename));
    }

    candidates
}

/// First token of a `<number> <subject>.pdf` style file name, when it looks like a number.
fn filename_number(filename: &str) -> Option<String> {
    let stem = strip_extension(filename);
    let first = stem.split_whitespace().next()?;
    RE_FILENAME_TOKEN.is_match(first).then(|| first.to_string())
}

/// File name without its last extension.
pub(crate) fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    }
}
