use std::path::Path;

use surat_extract::{resolve_path, slugify, slugify_nomor, Jenis};

#[test]
fn full_path_has_four_segments() {
    let path = resolve_path(Some(2024), Jenis::Masuk, Some("Mei"), "12-ab-01-02");
    assert_eq!(path.segments().len(), 4);
    assert_eq!(path.to_string(), "2024/masuk/Mei/12-ab-01-02");
}

#[test]
fn without_month() {
    let path = resolve_path(Some(2024), Jenis::Keluar, None, "005-pu-01");
    assert_eq!(path.to_string(), "2024/keluar/005-pu-01");
}

#[test]
fn without_year_the_month_is_ignored() {
    assert_eq!(resolve_path(None, Jenis::Masuk, None, "12-ab-01-02").to_string(), "masuk/12-ab-01-02");
    assert_eq!(resolve_path(None, Jenis::Lainnya, Some("Mei"), "x").to_string(), "lainnya/x");
}

#[test]
fn path_under_root() {
    let path = resolve_path(Some(2024), Jenis::Masuk, Some("Mei"), "12-ab-01-02");
    assert_eq!(path.under(Path::new("/arsip")), Path::new("/arsip/2024/masuk/Mei/12-ab-01-02"));
}

#[test]
fn serializes_as_a_string() {
    let path = resolve_path(None, Jenis::Masuk, None, "12-ab-01-02");
    assert_eq!(serde_json::to_string(&path).unwrap(), "\"masuk/12-ab-01-02\"");
}

#[test]
fn number_slugs() {
    assert_eq!(slugify_nomor("12/AB.01.02"), "12-ab-01-02");
    assert_eq!(slugify_nomor("B-123/PEM/2025"), "b-123-pem-2025");
    assert_eq!(slugify_nomor("TANPA-NOMOR"), "tanpa-nomor");
    assert_eq!(slugify_nomor(""), "tanpa-nomor");
    assert_eq!(slugify("Pela Mampang"), "pela-mampang");
}
