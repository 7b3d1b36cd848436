use serde::{Deserialize, Serialize};

/// Which extraction strategy produced a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSource {
    LabelBlock,
    AfterLabel,
    HeaderToken,
    SplitToken,
    DirectLabel,
    KeywordScan,
    Filename,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::LabelBlock => "label-block",
            CandidateSource::AfterLabel => "after-label",
            CandidateSource::HeaderToken => "header-token",
            CandidateSource::SplitToken => "split-token",
            CandidateSource::DirectLabel => "direct-label",
            CandidateSource::KeywordScan => "keyword-scan",
            CandidateSource::Filename => "filename",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionCandidate {
    pub value: String,
    /// 0-100
    pub confidence: u8,
    pub source: CandidateSource,
}

impl ExtractionCandidate {
    pub fn new(value: impl Into<String>, confidence: u8, source: CandidateSource) -> Self {
        Self { value: value.into(), confidence: confidence.min(100), source }
    }
}

/// Highest-confidence candidate; among equals the one generated first wins.
pub fn select_best(candidates: &[ExtractionCandidate]) -> Option<&ExtractionCandidate> {
    candidates.iter().min_by_key(|c| std::cmp::Reverse(c.confidence))
}
