//! Completeness score for an extraction record.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classify::Jenis;
use crate::folder::NO_NUMBER;
use crate::metadata::ParsedMetadata;
use crate::ocr::OcrStats;

const WEIGHT_NOMOR: i32 = 30;
const WEIGHT_TANGGAL: i32 = 20;
const WEIGHT_TAHUN: i32 = 10;
const WEIGHT_JENIS: i32 = 10;
const WEIGHT_PERIHAL_REQUIRED: i32 = 25;
const WEIGHT_PERIHAL_BONUS: i32 = 15;

const SHORT_TEXT: usize = 100;
const SHORT_OCR_TEXT: usize = 300;
const LOW_OCR_RATE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAssessment {
    /// 0-100
    pub score: u8,
    pub warnings: Vec<String>,
    pub ocr_used: bool,
}

/// Weighted completeness checks followed by text-quality penalties.
pub fn score(
    parsed: &ParsedMetadata,
    text_length: usize,
    ocr_used: bool,
    ocr_stats: Option<&OcrStats>,
) -> QualityAssessment {
    let mut total = 0i32;
    let mut warnings = Vec::new();
    let mut award = |present: bool, weight: i32, warning: &str| {
        if present {
            weight
        } else {
            warnings.push(warning.to_string());
            0
        }
    };

    total += award(
        parsed.nomor.as_deref().is_some_and(|n| !n.is_empty() && n != NO_NUMBER),
        WEIGHT_NOMOR,
        "Nomor surat tidak terdeteksi",
    );
    total += award(parsed.tanggal_surat.is_some(), WEIGHT_TANGGAL, "Tanggal surat tidak terdeteksi");
    total += award(parsed.tahun.is_some(), WEIGHT_TAHUN, "Tahun tidak terdeteksi");
    total += award(true, WEIGHT_JENIS, "Jenis surat tidak terdeteksi");

    let has_perihal = parsed.perihal.as_deref().is_some_and(|p| !p.is_empty());
    if parsed.jenis == Jenis::Keluar {
        total += award(has_perihal, WEIGHT_PERIHAL_REQUIRED, "Perihal tidak terdeteksi (wajib untuk surat keluar)");
    } else if has_perihal {
        // optional for other types: a bonus when present, no warning when absent
        total += WEIGHT_PERIHAL_BONUS;
    }

    if text_length < SHORT_TEXT {
        warnings.push("Teks terekstrak sangat pendek (kualitas OCR buruk)".to_string());
        total = (total - 15).max(0);
    } else if ocr_used && text_length < SHORT_OCR_TEXT {
        warnings.push("Teks hasil OCR kurang lengkap".to_string());
        total = (total - 5).max(0);
    }

    if let Some(stats) = ocr_stats.filter(|_| ocr_used) {
        if stats.success_rate < LOW_OCR_RATE {
            warnings.push(format!("OCR success rate rendah ({:.1}%)", stats.success_rate));
            total = (total - 10).max(0);
        }
    }

    let score = total.clamp(0, 100) as u8;
    if score < 50 {
        warn!(score, warnings = ?warnings, "low metadata quality");
    } else {
        info!(score, "metadata quality");
    }
    QualityAssessment { score, warnings, ocr_used }
}
