//! The extraction engine: one call turns document text into a `ParsedMetadata`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::{ClassifierError, HomeInstitution, Jenis, TypeClassifier, TypeModel};
use crate::date::date_from_clean;
use crate::normalize::normalize;
use crate::number::number_from_clean;
use crate::subject::subject_from_clean;

pub const TOTAL_FIELDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub fields_extracted: usize,
    pub total_fields: usize,
    pub text_length: usize,
    pub jenis_confidence: f64,
    pub jenis_method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMetadata {
    pub nomor: Option<String>,
    /// `05 Mei 2024`, or `2024` when only the year is known.
    pub tanggal_surat: Option<String>,
    pub tahun: Option<i32>,
    pub jenis: Jenis,
    pub jenis_confidence: f64,
    pub jenis_method: String,
    /// Never set for outgoing letters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perihal: Option<String>,
    pub extraction_stats: ExtractionStats,
}

#[derive(Debug)]
pub struct MetadataEngine {
    classifier: TypeClassifier,
}

impl MetadataEngine {
    /// `model` is consulted only after every classification rule passes.
    pub fn new(home: HomeInstitution, model: Option<Box<dyn TypeModel>>) -> Result<Self, ClassifierError> {
        Ok(Self { classifier: TypeClassifier::new(home, model)? })
    }

    pub fn classifier(&self) -> &TypeClassifier {
        &self.classifier
    }

    pub fn parse(&self, text: &str, filename: Option<&str>) -> ParsedMetadata {
        let cleaned = normalize(text);

        let nomor = number_from_clean(&cleaned, filename);
        let date = date_from_clean(&cleaned);
        let tanggal_surat = date.map(|d| d.to_string());
        let tahun = date.map(|d| d.year()).filter(|y| *y > 0);

        let decided = self.classifier.classify_clean(&cleaned, nomor.as_deref(), filename);
        let perihal = match decided.jenis {
            Jenis::Keluar => None,
            _ => subject_from_clean(&cleaned, filename),
        };

        let fields_extracted = [nomor.is_some(), perihal.is_some(), tanggal_surat.is_some(), tahun.is_some(), true]
            .iter()
            .filter(|present| **present)
            .count();
        info!(
            file = filename.unwrap_or("unknown"),
            nomor = nomor.as_deref().unwrap_or("-"),
            jenis = %decided.jenis,
            confidence = decided.confidence,
            method = %decided.method,
            tahun = tahun.unwrap_or_default(),
            fields = fields_extracted,
            "extraction complete"
        );

        ParsedMetadata {
            nomor,
            tanggal_surat,
            tahun,
            jenis: decided.jenis,
            jenis_confidence: decided.confidence,
            jenis_method: decided.method.clone(),
            perihal,
            extraction_stats: ExtractionStats {
                fields_extracted,
                total_fields: TOTAL_FIELDS,
                text_length: text.chars().count(),
                jenis_confidence: decided.confidence,
                jenis_method: decided.method,
            },
        }
    }
}
