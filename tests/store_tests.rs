use std::fs;
use std::path::Path;

use surat_extract::{
    sha256_hex, store_document, DocumentProcessor, HomeInstitution, MetadataEngine, OcrConfig, OcrMode,
    OcrPipeline, ProcessedDocument,
};

const LETTER: &str = "Nomor : 451/KS.02.00\nJakarta, 12 Maret 2024\nPerihal : Permohonan Data Warga\n\
                      Dengan hormat, bersama ini kami sampaikan permohonan data warga RW 03.";

fn processed(dir: &Path) -> (ProcessedDocument, Vec<u8>) {
    let path = dir.join("451-KS.02.00 Permohonan Data.txt");
    fs::write(&path, LETTER).unwrap();
    let engine = MetadataEngine::new(HomeInstitution::default(), None).unwrap();
    let processor =
        DocumentProcessor::new(engine, OcrPipeline::unavailable(OcrConfig::default(), "tesseract"), OcrMode::Off);
    let doc = processor.process(&path, "451-KS.02.00 Permohonan Data.txt").unwrap();
    (doc, LETTER.as_bytes().to_vec())
}

#[test]
fn files_original_text_and_metadata() {
    let td = tempfile::tempdir().unwrap();
    let (doc, bytes) = processed(td.path());
    let root = td.path().join("arsip");

    let paths = store_document(&root, &doc, &bytes).unwrap();
    let folder = root.join(doc.folder.to_string());
    assert_eq!(Path::new(&paths.folder), folder.as_path());
    assert_eq!(Path::new(&paths.original_path), folder.join("original.txt").as_path());
    assert_eq!(fs::read(&paths.original_path).unwrap(), bytes);
    assert_eq!(fs::read_to_string(paths.text_path.unwrap()).unwrap(), doc.text);

    let meta: serde_json::Value = serde_json::from_slice(&fs::read(&paths.meta_path).unwrap()).unwrap();
    assert_eq!(meta["file_original"], "original.txt");
    assert_eq!(meta["nomor"], "451/KS.02.00");
    assert_eq!(meta["tahun"], 2024);
    assert_eq!(meta["bulan"], "Maret");
    assert_eq!(meta["hash_sha256"], sha256_hex(&bytes));
    assert_eq!(meta["source_filename"], "451-KS.02.00 Permohonan Data.txt");
    assert_eq!(meta["ocr_used"], false);
    assert!(meta["metadata_quality"]["score"].is_u64());
    assert!(meta["uploaded_at"].is_string());

    // no temp files left behind
    let leftovers: Vec<_> = fs::read_dir(&folder)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn same_content_reuses_original_name() {
    let td = tempfile::tempdir().unwrap();
    let (doc, bytes) = processed(td.path());
    let root = td.path().join("arsip");

    let first = store_document(&root, &doc, &bytes).unwrap();
    let second = store_document(&root, &doc, &bytes).unwrap();
    assert_eq!(first.original_path, second.original_path);
}

#[test]
fn different_content_gets_timestamped_name() {
    let td = tempfile::tempdir().unwrap();
    let (doc, bytes) = processed(td.path());
    let root = td.path().join("arsip");

    let older = store_document(&root, &doc, b"isi lama yang berbeda").unwrap();
    let newer = store_document(&root, &doc, &bytes).unwrap();
    assert_ne!(older.original_path, newer.original_path);

    let name = Path::new(&newer.original_path).file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("original_") && name.ends_with(".txt"), "{name}");
    assert_eq!(fs::read(&older.original_path).unwrap(), b"isi lama yang berbeda");
}

#[test]
fn sha256_of_known_input() {
    assert_eq!(sha256_hex(b"abc"), "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
}
