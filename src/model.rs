//! Built-in type model: counts outgoing-letter and generic-letter indicators.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::classify::{ClassifierError, HomeInstitution, Jenis, ModelError, TypeModel};

const KELUAR_THRESHOLD: usize = 3;

const OUTGOING_PATTERNS: [&str; 13] = [
    r"kepada\s+yth\.?",
    r"kepada\s+yang\s+terhormat",
    r"yth\.?\s+(bapak|ibu|saudara)",
    r"di\s+tempat",
    r"di\s+-\s+",
    r"demikian\s+(kami\s+)?sampaikan",
    r"atas\s+perhatian(nya)?\s+(kami\s+)?ucapkan",
    r"hormat\s+kami",
    r"(an\.\s+)?(lurah|camat)",
    r"surat\s+keputusan",
    r"surat\s+perintah",
    r"surat\s+tugas",
    r"surat\s+(keterangan|edaran)",
];

const LETTER_PATTERNS: [&str; 8] = [
    r"no(mor)?\.?\s*[:.]?\s*\d+",
    r"\d+/\w+/\w+/\d+",
    r"perihal\s*:",
    r"hal\s*:",
    r"lampiran\s*:",
    r"surat\s+(masuk|keluar|undangan|permohonan)",
    r"(kepada|dari)\s+(yth|yang terhormat)",
    r"dengan\s+hormat",
];

/// Keyword-indicator model.
///
/// Three or more outgoing indicators make a letter `keluar`; otherwise any
/// letter indicator makes it `masuk`; otherwise it is `lainnya`.
#[derive(Debug)]
pub struct IndicatorModel {
    outgoing: Vec<Regex>,
    letter: Vec<Regex>,
}

impl IndicatorModel {
    pub fn new(home: &HomeInstitution) -> Result<Self, ClassifierError> {
        let name = home.name_pattern();
        let district = home.district_pattern();
        let mut outgoing: Vec<String> = OUTGOING_PATTERNS.iter().map(|p| p.to_string()).collect();
        // signatures and letterhead of the home institution
        outgoing.push(format!(r"(lurah|camat|kepala\s+seksi|kasi)\s+{}", name));
        outgoing.push(format!(r"pemerintah\s+(provinsi|kota).*kelurahan\s+{}", name));
        outgoing.push(format!(r"kelurahan\s+{}.*kecamatan\s+{}", name, district));

        Ok(Self {
            outgoing: compile_all(outgoing.iter().map(String::as_str))?,
            letter: compile_all(LETTER_PATTERNS.iter().copied())?,
        })
    }

    /// (outgoing, letter) indicator counts.
    pub fn indicator_counts(&self, text: &str) -> (usize, usize) {
        let lowered = text.to_lowercase();
        let count = |set: &[Regex]| set.iter().filter(|re| re.is_match(&lowered)).count();
        (count(&self.outgoing), count(&self.letter))
    }
}

fn compile_all<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<Vec<Regex>, ClassifierError> {
    patterns
        .map(|p| RegexBuilder::new(p).case_insensitive(true).build().map_err(ClassifierError::from))
        .collect()
}

impl TypeModel for IndicatorModel {
    fn predict(&self, text: &str) -> Result<(Jenis, f64), ModelError> {
        let (keluar, surat) = self.indicator_counts(text);
        debug!(keluar, surat, "indicator counts");
        if keluar >= KELUAR_THRESHOLD {
            return Ok((Jenis::Keluar, (0.6 + keluar as f64 * 0.1).min(0.95)));
        }
        if surat >= 1 {
            return Ok((Jenis::Masuk, (0.55 + surat as f64 * 0.1).min(0.90)));
        }
        Ok((Jenis::Lainnya, 0.65))
    }
}
