use std::fs;
use std::io::Write;
use std::path::Path;

use surat_extract::extract::{
    detect_suspect_pages, docx_text, extension_for_mime, MIME_DOCX, MIME_PDF, MIME_TEXT, SUSPECT_PAGE_MIN_CHARS,
};
use surat_extract::{extract_native, install_help_for, mime_for_path, needs_ocr, ExtractError, NativeText};

fn docx_with(document_xml: &str) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default()).unwrap();
    zip.write_all(document_xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

#[test]
fn missing_file_is_reported() {
    let err = extract_native(Path::new("/nonexistent/surat.pdf"), MIME_PDF).unwrap_err();
    assert!(matches!(err, ExtractError::FileNotFound(_)));
}

#[test]
fn mime_by_extension() {
    assert_eq!(mime_for_path(Path::new("a/surat.pdf")), Some(MIME_PDF));
    assert_eq!(mime_for_path(Path::new("SURAT.PDF")), Some(MIME_PDF));
    assert_eq!(mime_for_path(Path::new("surat.docx")), Some(MIME_DOCX));
    assert_eq!(mime_for_path(Path::new("surat.txt")), Some(MIME_TEXT));
    assert_eq!(mime_for_path(Path::new("surat.jpg")), None);
    assert_eq!(mime_for_path(Path::new("surat")), None);
    assert_eq!(extension_for_mime(MIME_DOCX), "docx");
}

#[test]
fn plain_text_files_are_read() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("surat.txt");
    fs::write(&path, "Nomor: 12/AB.01.02\nPerihal: Undangan Rapat\n").unwrap();
    let native = extract_native(&path, MIME_TEXT).unwrap();
    assert!(native.text.starts_with("Nomor: 12/AB.01.02"));
    assert_eq!(native.pages, 1);
    assert!(!native.is_scanned);
    assert_eq!(native.word_count(), 5);
}

#[test]
fn unsupported_mime_is_an_error() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("foto.jpg");
    fs::write(&path, b"\xFF\xD8").unwrap();
    assert!(matches!(extract_native(&path, "image/jpeg"), Err(ExtractError::UnsupportedType(_))));
}

#[test]
fn docx_paragraphs_become_lines() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Nomor : 12/AB.01.02</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Perihal : </w:t></w:r><w:r><w:t>Undangan Rapat</w:t></w:r></w:p>
</w:body></w:document>"#;
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("surat.docx");
    fs::write(&path, docx_with(xml)).unwrap();

    let native = extract_native(&path, MIME_DOCX).unwrap();
    assert_eq!(native.text, "Nomor : 12/AB.01.02\nPerihal : Undangan Rapat");
}

#[test]
fn docx_without_body_is_rejected() {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    zip.start_file("readme.txt", zip::write::SimpleFileOptions::default()).unwrap();
    zip.write_all(b"hello").unwrap();
    let bytes = zip.finish().unwrap().into_inner();
    assert!(matches!(docx_text(&bytes), Err(ExtractError::Docx(_))));
    assert!(matches!(docx_text(b"not a zip"), Err(ExtractError::Docx(_))));
}

#[test]
fn suspect_pages_by_character_count() {
    let full = "x".repeat(SUSPECT_PAGE_MIN_CHARS);
    let pages = vec![full.clone(), "   \n ".to_string(), "pendek".to_string(), full];
    assert_eq!(detect_suspect_pages(&pages, SUSPECT_PAGE_MIN_CHARS), vec![1, 2]);
}

#[test]
fn ocr_needed_only_for_thin_scans() {
    let scan = NativeText { text: "dua kata".into(), pages: 2, is_scanned: true, suspect_pages: vec![0, 1] };
    assert!(needs_ocr(&scan, 50));
    let born_digital = NativeText { is_scanned: false, ..scan.clone() };
    assert!(!needs_ocr(&born_digital, 50));
    let wordy_scan = NativeText { text: "kata ".repeat(60), ..scan };
    assert!(!needs_ocr(&wordy_scan, 50));
}

#[test]
fn install_hint_names_packages() {
    assert_eq!(install_help_for(&[]), "");
    let help = install_help_for(&["pdftoppm".to_string(), "tesseract".to_string()]);
    assert!(help.contains("poppler-utils"));
    assert!(help.contains("tesseract-ocr-ind"));
}
