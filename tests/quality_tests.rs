use surat_extract::{score, ExtractionStats, Jenis, OcrStats, ParsedMetadata, NO_NUMBER};

fn parsed(nomor: Option<&str>, dated: bool, jenis: Jenis, perihal: Option<&str>) -> ParsedMetadata {
    ParsedMetadata {
        nomor: nomor.map(str::to_string),
        tanggal_surat: dated.then(|| "05 Mei 2024".to_string()),
        tahun: dated.then_some(2024),
        jenis,
        jenis_confidence: 0.9,
        jenis_method: "test".into(),
        perihal: perihal.map(str::to_string),
        extraction_stats: ExtractionStats {
            fields_extracted: 0,
            total_fields: 5,
            text_length: 0,
            jenis_confidence: 0.9,
            jenis_method: "test".into(),
        },
    }
}

fn ocr_stats(success_rate: f64) -> OcrStats {
    OcrStats {
        total_pages: 4,
        success_pages: 1,
        failed_pages: 3,
        total_chars: 500,
        dpi: 300,
        language: "ind".into(),
        success_rate,
        method: "pdftoppm + tesseract".into(),
        error: None,
    }
}

#[test]
fn incoming_without_subject_scores_seventy() {
    let q = score(&parsed(Some("12/AB.01.02"), true, Jenis::Masuk, None), 500, false, None);
    assert_eq!(q.score, 70);
    assert!(q.warnings.is_empty());
    assert!(!q.ocr_used);
}

#[test]
fn subject_is_a_bonus_for_incoming() {
    let q = score(&parsed(Some("12/AB.01.02"), true, Jenis::Masuk, Some("Undangan Rapat")), 500, false, None);
    assert_eq!(q.score, 85);
}

#[test]
fn subject_is_required_for_outgoing() {
    let missing = score(&parsed(Some("12/AB.01.02"), true, Jenis::Keluar, None), 500, false, None);
    assert_eq!(missing.score, 70);
    assert_eq!(missing.warnings, vec!["Perihal tidak terdeteksi (wajib untuk surat keluar)".to_string()]);

    let present = score(&parsed(Some("12/AB.01.02"), true, Jenis::Keluar, Some("Undangan")), 500, false, None);
    assert_eq!(present.score, 95);
}

#[test]
fn sentinel_number_does_not_count() {
    let q = score(&parsed(Some(NO_NUMBER), true, Jenis::Masuk, None), 500, false, None);
    assert_eq!(q.score, 40);
    assert_eq!(q.warnings, vec!["Nomor surat tidak terdeteksi".to_string()]);
}

#[test]
fn short_text_penalty() {
    let q = score(&parsed(Some("12/AB.01.02"), true, Jenis::Masuk, None), 80, false, None);
    assert_eq!(q.score, 55);
    assert_eq!(q.warnings.len(), 1);
}

#[test]
fn thin_ocr_text_penalty() {
    let q = score(&parsed(Some("12/AB.01.02"), true, Jenis::Masuk, None), 150, true, None);
    assert_eq!(q.score, 65);
    assert_eq!(q.warnings, vec!["Teks hasil OCR kurang lengkap".to_string()]);
}

#[test]
fn low_ocr_success_rate_penalty() {
    let stats = ocr_stats(25.0);
    let q = score(&parsed(Some("12/AB.01.02"), true, Jenis::Masuk, None), 500, true, Some(&stats));
    assert_eq!(q.score, 60);
    assert_eq!(q.warnings, vec!["OCR success rate rendah (25.0%)".to_string()]);
    assert!(q.ocr_used);

    // stats alone do not penalise native text
    let native = score(&parsed(Some("12/AB.01.02"), true, Jenis::Masuk, None), 500, false, Some(&stats));
    assert_eq!(native.score, 70);
}

#[test]
fn score_floors_at_zero() {
    let stats = ocr_stats(0.0);
    let q = score(&parsed(None, false, Jenis::Lainnya, None), 10, true, Some(&stats));
    assert_eq!(q.score, 0);
    assert_eq!(q.warnings.len(), 5);
}
