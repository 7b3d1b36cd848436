//! Subject line (`perihal`) extraction.
//!
//! Strategies run in a fixed order and the first sanitized hit wins.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::candidate::CandidateSource;
use crate::labels::{extract_labels, label_of, starts_recipient_block, LabelKey};
use crate::normalize::{is_upper, normalize};
use crate::number::strip_extension;

/// Substrings typical of an institutional letterhead.
const HEADER_INDICATORS: [&str; 12] = [
    "PEMERINTAH",
    "PROVINSI",
    "DAERAH",
    "KHUSUS",
    "IBUKOTA",
    "KOTA",
    "ADMINISTRASI",
    "KECAMATAN",
    "KELURAHAN",
    "DINAS",
    "KEMENTERIAN",
    "REPUBLIK",
];

/// A subject consisting of nothing but one of these is a letterhead fragment.
const HEADER_KEYWORDS: [&str; 12] = [
    "PEMERINTAH",
    "DINAS",
    "KELURAHAN",
    "KECAMATAN",
    "KOTA",
    "KEMENTERIAN",
    "BADAN",
    "DEWAN",
    "SEKRETARIAT",
    "PT",
    "CV",
    "YAYASAN",
];

const DIRECT_LABEL_LINES: usize = 10;
const KEYWORD_SCAN_START: usize = 5;
const KEYWORD_SCAN_END: usize = 40;

static RE_NOMOR_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b[O0][S5IB0-9]\s*['"`]?\s*/\s*[A-Z]{2}\.[0-9.]+"#).unwrap());
static RE_NOMOR_THEN_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2,3}\s*/\s*[A-Z]{2}\.[0-9.]+\s+\d{1,2}\s+\w+\s+\d{4}").unwrap());
static RE_RECIPIENT_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bYth\.|\bKepada\b").unwrap());
static RE_TRAILING_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(kebakaran|di|jakarta|tanggal|nomor)\s*$").unwrap());
static RE_DATE_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}[-/\s]\w+[-/\s]\d{2,4}$").unwrap());
static RE_HAL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(Hal|Perihal)\b").unwrap());
static RE_SUBJECT_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(Permohonan|Balasan|Undangan|Disposisi|Pemberitahuan|Pengajuan|Laporan|Penyampaian|Permintaan)\b",
    )
    .unwrap()
});
static RE_FILENAME_SUBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[A-Za-z0-9.\-/]+\s+(.+)$").unwrap());

/// Extract the subject line from raw document text.
pub fn extract_subject(text: &str, filename: Option<&str>) -> Option<String> {
    subject_from_clean(&normalize(text), filename)
}

pub(crate) fn subject_from_clean(cleaned: &str, filename: Option<&str>) -> Option<String> {
    match find_subject(cleaned, filename) {
        Some((subject, source)) => {
            info!(perihal = %subject, source = source.as_str(), "perihal extracted");
            Some(subject)
        }
        None => {
            warn!("perihal not found after all strategies");
            None
        }
    }
}

fn find_subject(cleaned: &str, filename: Option<&str>) -> Option<(String, CandidateSource)> {
    if let Some(value) = extract_labels(cleaned).get(&LabelKey::Perihal) {
        debug!(value = %value, "perihal candidate from label block");
        if let Some(subject) = sanitize_subject(value) {
            return Some((subject, CandidateSource::LabelBlock));
        }
    }

    if let Some(joined) = direct_label_text(cleaned) {
        debug!(value = %joined, "perihal candidate from direct label");
        if let Some(subject) = sanitize_subject(&joined) {
            return Some((subject, CandidateSource::DirectLabel));
        }
    }

    for line in cleaned.lines().skip(KEYWORD_SCAN_START).take(KEYWORD_SCAN_END - KEYWORD_SCAN_START) {
        if !RE_SUBJECT_KEYWORD.is_match(line) {
            continue;
        }
        debug!(value = line.trim(), "perihal candidate from keyword");
        if let Some(subject) = sanitize_subject(line.trim()) {
            if subject.chars().count() > 10 {
                return Some((subject, CandidateSource::KeywordScan));
            }
        }
    }

    // the file name is not sanitized; it was typed by a person
    let name = strip_extension(filename?);
    let caps = RE_FILENAME_SUBJECT.captures(name)?;
    let subject = caps[1].trim();
    (subject.chars().count() > 3).then(|| (subject.to_string(), CandidateSource::Filename))
}

/// Text following the first `Hal`/`Perihal` token, joined across lines until a
/// label or the recipient block starts.
fn direct_label_text(cleaned: &str) -> Option<String> {
    let found = RE_HAL_TOKEN.find(cleaned)?;
    let remainder = cleaned[found.end()..].trim_start_matches([' ', '\t', '\r', '\n', ':', '-']);

    let mut collected: Vec<&str> = Vec::new();
    for line in remainder.lines().take(DIRECT_LABEL_LINES) {
        let line = line.trim();
        // OCR inserts spurious blank lines mid-subject
        if line.is_empty() {
            continue;
        }
        if label_of(line).is_some() || starts_recipient_block(line) {
            break;
        }
        collected.push(line);
    }
    (!collected.is_empty()).then(|| collected.join(" "))
}

/// Clean a subject candidate, or reject it as letterhead, number or date noise.
pub(crate) fn sanitize_subject(value: &str) -> Option<String> {
    let mut cleaned = value.trim().trim_start_matches([':', '-', ' ']).to_string();

    if RE_NOMOR_NOISE.is_match(&cleaned) || RE_NOMOR_THEN_DATE.is_match(&cleaned) {
        debug!(value = %cleaned, "perihal rejected: looks like a registration number");
        return None;
    }

    // cut at the earliest recipient marker unless that leaves almost nothing
    if let Some(found) = RE_RECIPIENT_TAIL.find(&cleaned) {
        let head = cleaned[..found.start()].trim();
        if head.chars().count() >= 3 {
            cleaned = head.to_string();
        }
    }
    let cleaned = cleaned.trim_matches([' ', ',', '.', ';']);

    let cleaned = RE_TRAILING_NOISE.replace(cleaned, "").trim().to_string();

    let upper = cleaned.to_uppercase();
    let header_hits = HEADER_INDICATORS.iter().filter(|kw| upper.contains(*kw)).count();
    if header_hits >= 3 {
        debug!(value = %cleaned, header_hits, "perihal rejected: letterhead text");
        return None;
    }
    if HEADER_KEYWORDS.contains(&upper.as_str()) {
        debug!(value = %cleaned, "perihal rejected: header keyword");
        return None;
    }
    if cleaned.chars().count() < 5 || cleaned.chars().all(|c| c.is_ascii_digit()) {
        debug!(value = %cleaned, "perihal rejected: too short or numeric");
        return None;
    }
    if RE_DATE_SHAPE.is_match(&cleaned) {
        debug!(value = %cleaned, "perihal rejected: date");
        return None;
    }
    if is_upper(&cleaned) && cleaned.chars().count() > 40 {
        debug!(value = %cleaned, "perihal rejected: all-caps letterhead");
        return None;
    }
    Some(cleaned)
}
