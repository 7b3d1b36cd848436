use std::fs;
use std::path::Path;

use surat_extract::{
    score, Config, DocumentProcessor, HomeInstitution, IndicatorModel, Jenis, MetadataEngine, OcrConfig, OcrMode,
    OcrPipeline, ProcessError, MAX_INPUT_BYTES, NO_NUMBER,
};

const LETTER: &str = "Nomor: 12/AB.01.02\nTanggal: 5 Mei 2024\nPerihal: Undangan Rapat\n";

const OUTGOING: &str = "PEMERINTAH PROVINSI DKI JAKARTA\nKELURAHAN PELA MAMPANG\nNomor : 005-PU.01\n\
                        Jakarta, 3 Juni 2024\nPerihal : Undangan Kerja Bakti\nKepada Yth. Ketua RW 03";

fn engine() -> MetadataEngine {
    let home = HomeInstitution::default();
    let model = IndicatorModel::new(&home).unwrap();
    MetadataEngine::new(home, Some(Box::new(model))).unwrap()
}

fn processor() -> DocumentProcessor {
    DocumentProcessor::new(engine(), OcrPipeline::unavailable(OcrConfig::default(), "tesseract"), OcrMode::Auto)
}

#[test]
fn end_to_end_incoming_letter() {
    let parsed = engine().parse(LETTER, None);
    assert_eq!(parsed.nomor.as_deref(), Some("12/AB.01.02"));
    assert_eq!(parsed.tanggal_surat.as_deref(), Some("05 Mei 2024"));
    assert_eq!(parsed.tahun, Some(2024));
    assert_eq!(parsed.perihal.as_deref(), Some("Undangan Rapat"));
    assert_eq!(parsed.jenis, Jenis::Masuk);
    assert_eq!(parsed.jenis_method, "model-fallback");
    assert!((parsed.jenis_confidence - 0.85).abs() < 1e-9);

    let stats = &parsed.extraction_stats;
    assert_eq!((stats.fields_extracted, stats.total_fields), (5, 5));
    assert_eq!(stats.text_length, LETTER.chars().count());
    assert_eq!(stats.jenis_method, parsed.jenis_method);
}

#[test]
fn outgoing_letters_never_carry_a_subject() {
    let parsed = engine().parse(OUTGOING, None);
    assert_eq!(parsed.jenis, Jenis::Keluar);
    assert_eq!(parsed.jenis_method, "kop-pela-mampang");
    assert_eq!(parsed.perihal, None);
    assert_eq!(parsed.extraction_stats.fields_extracted, 4);

    let json = serde_json::to_value(&parsed).unwrap();
    assert!(json.get("perihal").is_none());
    assert_eq!(json["jenis"], "keluar");
}

#[test]
fn rules_only_engine_still_extracts_fields() {
    let engine = MetadataEngine::new(HomeInstitution::default(), None).unwrap();
    assert!(!engine.classifier().has_model());
    let parsed = engine.parse(LETTER, None);
    assert_eq!(parsed.jenis, Jenis::Lainnya);
    assert_eq!(parsed.jenis_method, "default-fallback");
    assert_eq!(parsed.perihal.as_deref(), Some("Undangan Rapat"));
}

#[test]
fn incoming_record_quality() {
    let parsed = engine().parse(LETTER, None);
    // 30 + 20 + 10 + 10 + 15, less 15 for the short text
    let q = score(&parsed, LETTER.chars().count(), false, None);
    assert_eq!(q.score, 70);
}

#[test]
fn processed_text_file_lands_in_month_folder() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("surat.txt");
    fs::write(&path, LETTER).unwrap();

    let doc = processor().process(&path, "surat.txt").unwrap();
    assert_eq!(doc.mime_type, "text/plain");
    assert_eq!(doc.size_bytes, LETTER.len() as u64);
    assert_eq!(doc.sha256.len(), 64);
    assert_eq!(doc.nomor_final, "12/AB.01.02");
    assert_eq!(doc.bulan.as_deref(), Some("Mei"));
    assert_eq!(doc.folder.to_string(), "2024/masuk/Mei/12-ab-01-02");
    assert!(!doc.ocr_used);
    assert!(doc.ocr_stats.is_none());
    assert!(doc.extraction_error.is_none());
}

#[test]
fn letter_without_number_uses_sentinel() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("catatan.txt");
    fs::write(&path, "Catatan rapat warga tanpa apa pun").unwrap();

    let doc = processor().process(&path, "catatan.txt").unwrap();
    assert_eq!(doc.nomor_final, NO_NUMBER);
    assert_eq!(doc.parsed.jenis, Jenis::Lainnya);
    assert_eq!(doc.folder.to_string(), "lainnya/tanpa-nomor");
}

#[test]
fn year_only_date_has_no_month_folder() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("surat.txt");
    fs::write(&path, "Nomor : 45/SM/2023\nLaporan kegiatan tahun 2023").unwrap();

    let doc = processor().process(&path, "surat.txt").unwrap();
    assert_eq!(doc.parsed.tanggal_surat.as_deref(), Some("2023"));
    assert_eq!(doc.bulan, None);
    assert_eq!(doc.folder.to_string(), "2023/masuk/45-sm-2023");
}

#[test]
fn process_rejects_missing_and_unsupported_files() {
    let td = tempfile::tempdir().unwrap();
    let missing = processor().process(&td.path().join("absent.txt"), "absent.txt");
    assert!(matches!(missing, Err(ProcessError::FileNotFound(_))));

    let photo = td.path().join("foto.jpg");
    fs::write(&photo, b"\xFF\xD8").unwrap();
    assert!(matches!(processor().process(&photo, "foto.jpg"), Err(ProcessError::UnsupportedType(_))));
}

#[test]
fn oversized_input_is_rejected_before_reading() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("besar.txt");
    fs::File::create(&path).unwrap().set_len(MAX_INPUT_BYTES + 1).unwrap();

    match processor().process(&path, "besar.txt") {
        Err(ProcessError::TooLarge { size, max }) => {
            assert_eq!(size, MAX_INPUT_BYTES + 1);
            assert_eq!(max, MAX_INPUT_BYTES);
        }
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[test]
fn processor_from_default_config() {
    let processor = DocumentProcessor::from_config(&Config::default(), OcrMode::Off).unwrap();
    assert!(processor.engine().classifier().has_model());
    assert_eq!(processor.ocr_mode(), OcrMode::Off);
    assert!(Path::new(&Config::default().storage.root).is_relative());
}
