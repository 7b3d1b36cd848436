use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::classify::Jenis;

/// Registration number recorded for letters where none was found.
pub const NO_NUMBER: &str = "TANPA-NOMOR";

/// Storage location of a filed letter, relative to the archive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn under(&self, root: &Path) -> PathBuf {
        self.segments.iter().fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl Serialize for FolderPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `tahun/jenis/bulan/slug`, `tahun/jenis/slug` without a month, `jenis/slug` without a year.
pub fn resolve_path(tahun: Option<i32>, jenis: Jenis, bulan: Option<&str>, slug: &str) -> FolderPath {
    let mut segments = Vec::with_capacity(4);
    if let Some(tahun) = tahun {
        segments.push(tahun.to_string());
        segments.push(jenis.as_str().to_string());
        if let Some(bulan) = bulan {
            segments.push(bulan.to_string());
        }
    } else {
        segments.push(jenis.as_str().to_string());
    }
    segments.push(slug.to_string());
    FolderPath { segments }
}

/// Lower-case ASCII alphanumerics with single dashes between runs.
pub fn slugify(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut pending_dash = false;
    for ch in base.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Folder name for a registration number: `12/AB.01.02` → `12-ab-01-02`.
pub fn slugify_nomor(nomor: &str) -> String {
    let slug = slugify(nomor);
    if slug.is_empty() {
        return slugify(NO_NUMBER);
    }
    slug
}
