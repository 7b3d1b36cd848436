use std::fs;
use std::path::PathBuf;

use surat_extract::{enumerate_documents, EnumerateError};

#[test]
fn enumerate_documents_finds_nested_files() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    let masuk = base.join("input/masuk");
    fs::create_dir_all(&masuk).unwrap();
    fs::write(masuk.join("451-KS.02.00.pdf"), b"%PDF-1.4\n").unwrap();
    fs::write(masuk.join("catatan.txt"), b"bukan pdf").unwrap();

    let pattern = format!("{}/input/**/*.pdf", base.display());
    let files = enumerate_documents(&pattern).expect("should find files");
    let files: Vec<PathBuf> = files.into_iter().map(|p| p.strip_prefix(base).unwrap().to_path_buf()).collect();
    assert_eq!(files, vec![PathBuf::from("input/masuk/451-KS.02.00.pdf")]);
}

#[test]
fn results_are_sorted() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    fs::create_dir_all(base.join("input/keluar")).unwrap();
    fs::create_dir_all(base.join("input/masuk")).unwrap();
    fs::write(base.join("input/masuk/b.pdf"), b"%PDF").unwrap();
    fs::write(base.join("input/keluar/a.pdf"), b"%PDF").unwrap();

    let files = enumerate_documents(&format!("{}/input/**/*.pdf", base.display())).unwrap();
    let names: Vec<String> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().into_owned()).collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf"]);
}

#[test]
fn empty_returns_error_with_guidance() {
    let td = tempfile::tempdir().unwrap();
    let pattern = format!("{}/input/**/*.pdf", td.path().display());
    let err = enumerate_documents(&pattern).err().expect("should be error");
    assert_eq!(err.to_string(), "NoFilesFound");
    let EnumerateError::NoFilesFound { guidance } = err;
    assert!(guidance.contains(&pattern));
}
