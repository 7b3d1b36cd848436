//! Metadata extraction for Indonesian office correspondence (surat).
//!
//! Raw letter text goes in; a registration number, date, subject, directional
//! type, a quality score and the archive folder come out.

use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use thiserror::Error;

pub mod candidate;
pub mod classify;
pub mod config;
pub mod date;
pub mod extract;
pub mod folder;
pub mod labels;
pub mod metadata;
pub mod model;
pub mod normalize;
pub mod number;
pub mod ocr;
pub mod pipeline;
pub mod quality;
pub mod store;
pub mod subject;

pub use candidate::{select_best, CandidateSource, ExtractionCandidate};
pub use classify::{Classification, ClassifierError, HomeInstitution, Jenis, ModelError, TypeClassifier, TypeModel};
pub use config::{load_config, Config, ConfigError, DEFAULT_CONFIG_FILE};
pub use date::{extract_date, month_from_tanggal, DatePrecision, LetterDate};
pub use extract::{check_deps, extract_native, install_help_for, mime_for_path, needs_ocr, DepsResult, ExtractError, NativeText, MIME_PDF};
pub use folder::{resolve_path, slugify, slugify_nomor, FolderPath, NO_NUMBER};
pub use labels::{extract_labels, LabelKey, LabelValues};
pub use metadata::{ExtractionStats, MetadataEngine, ParsedMetadata};
pub use model::IndicatorModel;
pub use normalize::normalize;
pub use number::{extract_number, number_candidates};
pub use ocr::{recognize_pages, OcrConfig, OcrError, OcrPipeline, OcrStats, PageSource, Recognizer};
pub use pipeline::{DocumentProcessor, OcrMode, ProcessError, ProcessedDocument, MAX_INPUT_BYTES};
pub use quality::{score, QualityAssessment};
pub use store::{sha256_hex, store_document, StoreError, StoredPaths};
pub use subject::extract_subject;

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

/// Enumerate input letters using a glob pattern (e.g., "./input/**/*.pdf").
/// Returns a sorted list of files.
pub fn enumerate_documents(glob_pattern: &str) -> Result<Vec<PathBuf>, EnumerateError> {
    let root = if Path::new(glob_pattern).is_absolute() { "/" } else { "." };
    let pat = glob_pattern.strip_prefix("./").unwrap_or(glob_pattern);
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(root, &[pat])
        .case_insensitive(true)
        .follow_links(false)
        .build()
        .map_err(|_| EnumerateError::NoFilesFound { guidance: folder_guidance(glob_pattern) })?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.is_file())
        .collect();

    paths.sort();
    if paths.is_empty() {
        return Err(EnumerateError::NoFilesFound { guidance: folder_guidance(glob_pattern) });
    }
    Ok(paths)
}

fn folder_guidance(glob_pattern: &str) -> String {
    format!(
        r#"Tidak ada surat pada pola {glob_pattern}
Struktur yang disarankan:
  ./input/masuk/...
  ./input/keluar/...
Format yang didukung: .pdf, .docx, .txt
Contoh: letakkan berkas di ./input/masuk/451-KS.02.00 Undangan Rapat.pdf"#
    )
}
