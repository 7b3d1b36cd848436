//! Directional type classification: an ordered rule cascade with an optional
//! model consulted only after every rule has passed.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::normalize::{normalize, prefix_chars};
use crate::number::strip_extension;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jenis {
    Masuk,
    Keluar,
    Lainnya,
}

impl Jenis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Jenis::Masuk => "masuk",
            Jenis::Keluar => "keluar",
            Jenis::Lainnya => "lainnya",
        }
    }
}

impl fmt::Display for Jenis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Jenis {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "masuk" => Ok(Jenis::Masuk),
            "keluar" => Ok(Jenis::Keluar),
            "lainnya" => Ok(Jenis::Lainnya),
            other => Err(ModelError::UnknownLabel(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown type label: {0}")]
    UnknownLabel(String),
    #[error("model prediction failed: {0}")]
    Prediction(String),
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid home institution pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Statistical type predictor consulted as the cascade's last resort.
pub trait TypeModel: Send + Sync {
    fn predict(&self, text: &str) -> Result<(Jenis, f64), ModelError>;
}

/// The institution whose archive this is. Letters under its letterhead are
/// outgoing; letters addressed to it are incoming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeInstitution {
    /// Place name as printed, e.g. `Pela Mampang`.
    pub name: String,
    pub district: String,
    /// Upper-case letterhead substrings, any one of which identifies the kop.
    pub kop_markers: Vec<String>,
    /// Upper-case substrings that identify the kop only when both appear.
    pub kop_marker_pairs: Vec<(String, String)>,
    /// Titles the institution is addressed by in a recipient block.
    pub recipient_titles: Vec<String>,
}

impl Default for HomeInstitution {
    fn default() -> Self {
        Self {
            name: "Pela Mampang".into(),
            district: "Mampang Prapatan".into(),
            kop_markers: vec![
                "KELURAHAN PELA MAMPANG".into(),
                "BANGKA X UJUNG".into(),
                "PELAMAMAMPANGKELURAHAN".into(),
                "718 2380".into(),
                "7182380".into(),
            ],
            kop_marker_pairs: vec![("PELA MAMPANG".into(), "MAMPANG PRAPATAN".into())],
            recipient_titles: vec!["lurah".into(), "kelurahan".into()],
        }
    }
}

impl HomeInstitution {
    /// `pela-mampang`
    pub fn tag(&self) -> String {
        crate::folder::slugify(&self.name)
    }

    /// Place name as a regex fragment tolerant to whitespace runs.
    pub(crate) fn name_pattern(&self) -> String {
        words_pattern(&self.name)
    }

    pub(crate) fn district_pattern(&self) -> String {
        words_pattern(&self.district)
    }
}

fn words_pattern(phrase: &str) -> String {
    phrase.split_whitespace().map(|w| regex::escape(&w.to_lowercase())).collect::<Vec<_>>().join(r"\s+")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub jenis: Jenis,
    /// 0.0-1.0
    pub confidence: f64,
    /// Which rule or fallback decided.
    pub method: String,
}

impl Classification {
    fn new(jenis: Jenis, confidence: f64, method: impl Into<String>) -> Self {
        Self { jenis, confidence, method: method.into() }
    }
}

const NON_LETTER_KEYWORDS: [&str; 8] =
    ["PAPARAN", "BUKU PANDUAN", "PANDUAN", "PRESENTASI", "HANDBOOK", "GUIDE BOOK", "MANUAL", "MODUL"];
const HEADER_LINES: usize = 30;
const KOP_LINES: usize = 10;
const NON_LETTER_WINDOW: usize = 500;
const RECIPIENT_WINDOW: usize = 1000;
const MODEL_MIN_CHARS: usize = 50;
const MODEL_MIN_CONFIDENCE: f64 = 0.80;

static RE_NOMOR_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(Nomor|No)\b\s*[:=.\-]*\s*[A-Za-z0-9]").unwrap());
static RE_INTERNAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}-[A-Z]{2}\.\d").unwrap());
static RE_MULTI_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}/\d{2}/\d{2}").unwrap());
static RE_SM_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:^|/|[-_])SM(?:/|[-_]|$)").unwrap());
static RE_SK_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:^|/|[-_])SK(?:/|[-_]|$)").unwrap());
static RE_MASUK_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bmasuk\b").unwrap());
static RE_KELUAR_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bkeluar\b").unwrap());

/// What the rules look at, computed once per document.
struct Evidence<'a> {
    cleaned: &'a str,
    /// First 30 lines, upper-cased.
    header_text: String,
    has_kop: bool,
    home_is_recipient: bool,
    nomor: Option<&'a str>,
    filename_stem: Option<&'a str>,
}

type Rule = fn(&TypeClassifier, &Evidence<'_>) -> Option<Classification>;

pub struct TypeClassifier {
    home: HomeInstitution,
    recipient: Regex,
    kop_tag: String,
    recipient_tag: String,
    model: Option<Box<dyn TypeModel>>,
}

impl fmt::Debug for TypeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeClassifier")
            .field("home", &self.home.name)
            .field("model", &self.model.is_some())
            .finish()
    }
}

impl TypeClassifier {
    /// Rules in evaluation order; the first that fires decides.
    const RULES: [Rule; 6] = [
        Self::non_letter_keywords,
        Self::no_nomor_label,
        Self::letterhead,
        Self::nomor_shape,
        Self::institution_header,
        Self::filename_hint,
    ];

    pub fn new(home: HomeInstitution, model: Option<Box<dyn TypeModel>>) -> Result<Self, ClassifierError> {
        let titles = home.recipient_titles.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
        let pattern = format!(r"(kepada|yth).{{0,50}}({}).{{0,20}}{}", titles, home.name_pattern());
        let recipient = RegexBuilder::new(&pattern).case_insensitive(true).dot_matches_new_line(true).build()?;
        let tag = home.tag();
        Ok(Self {
            kop_tag: format!("kop-{}", tag),
            recipient_tag: format!("recipient-{}", tag),
            home,
            recipient,
            model,
        })
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Classify raw document text.
    pub fn classify(&self, text: &str, nomor: Option<&str>, filename: Option<&str>) -> Classification {
        self.classify_clean(&normalize(text), nomor, filename)
    }

    pub(crate) fn classify_clean(&self, cleaned: &str, nomor: Option<&str>, filename: Option<&str>) -> Classification {
        let lines: Vec<&str> = cleaned.lines().take(HEADER_LINES).collect();
        let kop_text = lines.iter().take(KOP_LINES).copied().collect::<Vec<_>>().join(" ").to_uppercase();
        let evidence = Evidence {
            cleaned,
            header_text: lines.join(" ").to_uppercase(),
            has_kop: self.has_kop(&kop_text),
            home_is_recipient: self.recipient.is_match(prefix_chars(cleaned, RECIPIENT_WINDOW)),
            nomor,
            filename_stem: filename.map(strip_extension),
        };

        let decided = Self::RULES
            .iter()
            .find_map(|rule| rule(self, &evidence))
            .or_else(|| self.model_fallback(cleaned))
            .unwrap_or_else(|| Classification::new(Jenis::Lainnya, 0.60, "default-fallback"));
        debug!(jenis = %decided.jenis, confidence = decided.confidence, method = %decided.method, "jenis decided");
        decided
    }

    fn has_kop(&self, kop_text: &str) -> bool {
        self.home.kop_markers.iter().any(|m| kop_text.contains(m.as_str()))
            || self
                .home
                .kop_marker_pairs
                .iter()
                .any(|(a, b)| kop_text.contains(a.as_str()) && kop_text.contains(b.as_str()))
    }

    fn non_letter_keywords(&self, ev: &Evidence<'_>) -> Option<Classification> {
        let head = prefix_chars(ev.cleaned, NON_LETTER_WINDOW).to_uppercase();
        NON_LETTER_KEYWORDS
            .iter()
            .any(|kw| head.contains(kw))
            .then(|| Classification::new(Jenis::Lainnya, 0.90, "non-letter-keywords"))
    }

    fn no_nomor_label(&self, ev: &Evidence<'_>) -> Option<Classification> {
        (!RE_NOMOR_LABEL.is_match(ev.cleaned)).then(|| Classification::new(Jenis::Lainnya, 0.85, "no-nomor-label"))
    }

    fn letterhead(&self, ev: &Evidence<'_>) -> Option<Classification> {
        if ev.has_kop && !ev.home_is_recipient {
            return Some(Classification::new(Jenis::Keluar, 0.95, self.kop_tag.as_str()));
        }
        ev.home_is_recipient.then(|| Classification::new(Jenis::Masuk, 0.95, self.recipient_tag.as_str()))
    }

    fn nomor_shape(&self, ev: &Evidence<'_>) -> Option<Classification> {
        let nomor = ev.nomor?;
        if RE_INTERNAL_CODE.is_match(nomor) || RE_MULTI_SEGMENT.is_match(nomor) {
            return Some(Classification::new(Jenis::Keluar, 0.90, "nomor-pattern-keluar"));
        }
        RE_SM_TOKEN.is_match(nomor).then(|| Classification::new(Jenis::Masuk, 0.90, "nomor-pattern-SM"))
    }

    fn institution_header(&self, ev: &Evidence<'_>) -> Option<Classification> {
        let header = ev.header_text.as_str();
        if header.contains("PEMERINTAH") && !ev.has_kop {
            // a government sender addressing someone else still carries its own letterhead
            if header.contains("KEPADA") && (header.contains("YTH") || header.contains("YANG TERHORMAT")) {
                return Some(Classification::new(Jenis::Keluar, 0.80, "kepada-yth-pattern"));
            }
            return Some(Classification::new(Jenis::Masuk, 0.85, "pemerintah-header"));
        }
        (header.contains("KEMENTERIAN") || header.contains("DEWAN") || header.contains("PT."))
            .then(|| Classification::new(Jenis::Masuk, 0.85, "external-institution"))
    }

    fn filename_hint(&self, ev: &Evidence<'_>) -> Option<Classification> {
        let stem = ev.filename_stem?;
        if RE_SM_TOKEN.is_match(stem) || RE_MASUK_WORD.is_match(stem) {
            return Some(Classification::new(Jenis::Masuk, 0.70, "filename-hint"));
        }
        (RE_SK_TOKEN.is_match(stem) || RE_KELUAR_WORD.is_match(stem))
            .then(|| Classification::new(Jenis::Keluar, 0.70, "filename-hint"))
    }

    fn model_fallback(&self, cleaned: &str) -> Option<Classification> {
        let model = self.model.as_ref()?;
        if cleaned.trim().chars().count() <= MODEL_MIN_CHARS {
            return None;
        }
        match model.predict(cleaned) {
            Ok((jenis, confidence)) if confidence > MODEL_MIN_CONFIDENCE => {
                info!(jenis = %jenis, confidence, "model fallback accepted");
                Some(Classification::new(jenis, confidence, "model-fallback"))
            }
            Ok((jenis, confidence)) => {
                debug!(jenis = %jenis, confidence, "model confidence too low, ignored");
                None
            }
            Err(err) => {
                warn!(error = %err, "type model failed");
                None
            }
        }
    }
}
