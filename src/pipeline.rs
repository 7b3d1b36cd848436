//! One document in, one filed record out: native text or OCR, extraction,
//! scoring and the folder it belongs in.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::classify::{ClassifierError, TypeModel};
use crate::config::Config;
use crate::date::month_from_tanggal;
use crate::extract::{extract_native, mime_for_path, needs_ocr, MIME_PDF};
use crate::folder::{resolve_path, slugify_nomor, FolderPath, NO_NUMBER};
use crate::metadata::{MetadataEngine, ParsedMetadata};
use crate::model::IndicatorModel;
use crate::ocr::{OcrPipeline, OcrStats};
use crate::quality::{score, QualityAssessment};
use crate::store::sha256_hex;

/// Inputs larger than this are rejected before being read.
pub const MAX_INPUT_BYTES: u64 = 20 * 1024 * 1024;

/// When scanned PDFs go through OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrMode {
    /// Only when the native text layer is missing or too thin.
    #[default]
    Auto,
    On,
    Off,
}

impl FromStr for OcrMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(OcrMode::Auto),
            "on" => Ok(OcrMode::On),
            "off" => Ok(OcrMode::Off),
            other => Err(format!("invalid OCR mode '{other}', expected auto|on|off")),
        }
    }
}

impl fmt::Display for OcrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OcrMode::Auto => "auto",
            OcrMode::On => "on",
            OcrMode::Off => "off",
        })
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("FileTooLarge: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("ReadFailed: {0}")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub source_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub text: String,
    pub parsed: ParsedMetadata,
    pub quality: QualityAssessment,
    pub ocr_used: bool,
    pub ocr_stats: Option<OcrStats>,
    /// The extracted number, or `TANPA-NOMOR`.
    pub nomor_final: String,
    pub bulan: Option<String>,
    pub folder: FolderPath,
    /// Native extraction failure, kept so the caller can decide to reject the upload.
    pub extraction_error: Option<String>,
}

#[derive(Debug)]
pub struct DocumentProcessor {
    engine: MetadataEngine,
    ocr: OcrPipeline,
    ocr_mode: OcrMode,
}

impl DocumentProcessor {
    pub fn new(engine: MetadataEngine, ocr: OcrPipeline, ocr_mode: OcrMode) -> Self {
        Self { engine, ocr, ocr_mode }
    }

    /// Engine and OCR backends as described by `config`. Probes the OCR tools once.
    pub fn from_config(config: &Config, ocr_mode: OcrMode) -> Result<Self, ClassifierError> {
        let model: Option<Box<dyn TypeModel>> = if config.classifier.indicator_model {
            Some(Box::new(IndicatorModel::new(&config.home)?))
        } else {
            None
        };
        let engine = MetadataEngine::new(config.home.clone(), model)?;
        let ocr = if ocr_mode == OcrMode::Off {
            OcrPipeline::unavailable(config.ocr.clone(), "ocr")
        } else {
            OcrPipeline::detect(config.ocr.clone())
        };
        Ok(Self::new(engine, ocr, ocr_mode))
    }

    pub fn engine(&self) -> &MetadataEngine {
        &self.engine
    }

    pub fn ocr_mode(&self) -> OcrMode {
        self.ocr_mode
    }

    /// Run the whole pipeline over the file at `path`. `source_filename` is the
    /// name the document was submitted under and doubles as the filename hint.
    pub fn process(&self, path: &Path, source_filename: &str) -> Result<ProcessedDocument, ProcessError> {
        if !path.exists() {
            return Err(ProcessError::FileNotFound(path.display().to_string()));
        }
        let mime = mime_for_path(path).ok_or_else(|| ProcessError::UnsupportedType(path.display().to_string()))?;
        let size = std::fs::metadata(path)?.len();
        if size > MAX_INPUT_BYTES {
            return Err(ProcessError::TooLarge { size, max: MAX_INPUT_BYTES });
        }
        let bytes = std::fs::read(path)?;
        let sha256 = sha256_hex(&bytes);

        let (mut text, native_thin, extraction_error) = match extract_native(path, mime) {
            Ok(native) => {
                let thin = needs_ocr(&native, self.ocr.config().min_native_words);
                (native.text, thin, None)
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "native extraction failed");
                (String::new(), true, Some(e.to_string()))
            }
        };

        let wants_ocr = mime == MIME_PDF
            && match self.ocr_mode {
                OcrMode::Off => false,
                OcrMode::On => true,
                OcrMode::Auto => native_thin,
            };
        let mut ocr_used = false;
        let mut ocr_stats = None;
        if wants_ocr {
            let (ocr_text, stats) = self.ocr.recognize(path, self.ocr.config().dpi);
            if !ocr_text.trim().is_empty() {
                text = ocr_text;
                ocr_used = true;
            }
            ocr_stats = Some(stats);
        }

        let parsed = self.engine.parse(&text, Some(source_filename));
        let quality = score(&parsed, text.chars().count(), ocr_used, ocr_stats.as_ref());
        let bulan = parsed.tanggal_surat.as_deref().and_then(month_from_tanggal).map(str::to_string);
        let nomor_final = parsed.nomor.clone().unwrap_or_else(|| NO_NUMBER.to_string());
        let folder = resolve_path(parsed.tahun, parsed.jenis, bulan.as_deref(), &slugify_nomor(&nomor_final));

        info!(
            file = source_filename,
            folder = %folder,
            score = quality.score,
            ocr_used,
            "document processed"
        );

        Ok(ProcessedDocument {
            source_filename: source_filename.to_string(),
            mime_type: mime.to_string(),
            size_bytes: bytes.len() as u64,
            sha256,
            text,
            parsed,
            quality,
            ocr_used,
            ocr_stats,
            nomor_final,
            bulan,
            folder,
            extraction_error,
        })
    }
}
