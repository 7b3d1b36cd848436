//! Label-block scanning: `Nomor : ...`, `Perihal : ...`, `Sifat`, `Lampiran`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::{non_blank_lines, normalize_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelKey {
    Nomor,
    Perihal,
    Lampiran,
    Sifat,
}

impl LabelKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKey::Nomor => "nomor",
            LabelKey::Perihal => "perihal",
            LabelKey::Lampiran => "lampiran",
            LabelKey::Sifat => "sifat",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            LabelKey::Nomor => &["nomor", "no", "nomer", "nemor"],
            LabelKey::Perihal => &["perihal", "hal"],
            LabelKey::Lampiran => &["lampiran"],
            LabelKey::Sifat => &["sifat"],
        }
    }
}

const ALL_KEYS: [LabelKey; 4] = [LabelKey::Nomor, LabelKey::Perihal, LabelKey::Lampiran, LabelKey::Sifat];

/// Words that turn up after a `Nomor` label but are never a registration number.
const NOMOR_BLACKLIST: [&str; 13] = [
    "sifat", "biasa", "penting", "segera", "rahasia", "lampiran", "hal", "perihal", "kepada", "yth",
    "tanggal", "tembusan", "dari",
];

/// Extra lines a `perihal` value may continue onto.
const PERIHAL_CONTINUATION: usize = 4;

static RE_RECIPIENT_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(kepada|yth|dengan|sehubungan)").unwrap());
static RE_NOMOR_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[/\-][A-Za-z0-9]").unwrap());

pub type LabelValues = BTreeMap<LabelKey, String>;

/// Which label, if any, a line starts with. Only the text before the first
/// colon is considered, and it must match an alias exactly.
pub fn label_of(line: &str) -> Option<LabelKey> {
    let label_part = line.split(':').next().unwrap_or(line);
    let lowered = label_part.to_lowercase();
    let lowered = lowered.trim_matches(|c| c == ' ' || c == ':' || c == '.' || c == '-');
    ALL_KEYS.into_iter().find(|key| key.aliases().contains(&lowered))
}

/// True for lines that open the recipient block of a letter.
pub(crate) fn starts_recipient_block(line: &str) -> bool {
    RE_RECIPIENT_START.is_match(line)
}

/// Scan cleaned text for label lines and resolve their values.
///
/// A later occurrence of the same label replaces an earlier one.
pub fn extract_labels(cleaned: &str) -> LabelValues {
    let lines = non_blank_lines(cleaned);
    let mut values = LabelValues::new();
    for (idx, line) in lines.iter().enumerate() {
        let Some(key) = label_of(line) else { continue };
        if let Some(value) = find_label_value(&lines, idx, key) {
            debug!(label = key.as_str(), value = %value, "label value");
            values.insert(key, value);
        }
    }
    values
}

fn find_label_value(lines: &[&str], idx: usize, key: LabelKey) -> Option<String> {
    // same line, after the colon
    if let Some((_, after)) = lines[idx].split_once(':') {
        let value = after.trim();
        if !value.is_empty() {
            let resolved = resolve_value(value, lines, idx, key);
            // a rejected number may still sit on the next line
            if resolved.is_some() || key != LabelKey::Nomor {
                return resolved;
            }
        }
    }

    // blank lines are already gone, so the following line is the only candidate
    let next = idx + 1;
    let candidate = lines.get(next)?;
    if label_of(candidate).is_some() {
        return None;
    }
    match candidate.strip_prefix(':') {
        Some(rest) => resolve_value(rest.trim(), lines, next, key),
        None => resolve_value(candidate, lines, next, key),
    }
}

fn resolve_value(value: &str, lines: &[&str], at: usize, key: LabelKey) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    match key {
        LabelKey::Nomor => value.split_whitespace().next().and_then(accept_nomor),
        LabelKey::Perihal => {
            let mut collected = vec![value];
            for next in lines.iter().skip(at + 1).take(PERIHAL_CONTINUATION) {
                if label_of(next).is_some() || starts_recipient_block(next) {
                    break;
                }
                collected.push(next);
            }
            normalize_line(&collected.join(" "))
        }
        LabelKey::Lampiran | LabelKey::Sifat => normalize_line(value),
    }
}

/// Rejection filter for `nomor` label values.
fn accept_nomor(token: &str) -> Option<String> {
    let lowered = token.trim().to_lowercase();
    if NOMOR_BLACKLIST.contains(&lowered.as_str()) {
        debug!(value = token, "nomor rejected: administrative word");
        return None;
    }
    if !RE_NOMOR_SHAPE.is_match(token) {
        debug!(value = token, "nomor rejected: no digit-separator shape");
        return None;
    }
    if !token.starts_with(|c: char| c.is_ascii_digit()) {
        debug!(value = token, "nomor rejected: does not start with a digit");
        return None;
    }
    Some(token.to_string())
}
