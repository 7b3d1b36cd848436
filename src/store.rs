//! Filing a processed document under the archive root.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::extract::extension_for_mime;
use crate::pipeline::ProcessedDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPaths {
    pub folder: String,
    pub original_path: String,
    pub text_path: Option<String>,
    pub meta_path: String,
}

/// Write the original, its text and `metadata.json` into the document's folder.
///
/// An existing original with other content is kept; the new one gets a
/// `original_<unix-seconds>.<ext>` name instead.
pub fn store_document(root: &Path, doc: &ProcessedDocument, original_bytes: &[u8]) -> Result<StoredPaths, StoreError> {
    let dir = doc.folder.under(root);
    std::fs::create_dir_all(&dir).map_err(|e| StoreError::WriteFailed(e.to_string()))?;

    let now = Utc::now();
    let ext = extension_for_mime(&doc.mime_type);
    let mut original_path = dir.join(format!("original.{ext}"));
    if original_path.exists() {
        let existing = std::fs::read(&original_path).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        if sha256_hex(&existing) != doc.sha256 {
            original_path = dir.join(format!("original_{}.{ext}", now.timestamp()));
        }
    }
    write_atomic(&original_path, original_bytes)?;

    let text_path = if doc.text.is_empty() {
        None
    } else {
        let path = dir.join("text.txt");
        write_atomic(&path, doc.text.as_bytes())?;
        Some(path)
    };

    let file_original = original_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let record = serde_json::json!({
        "uploaded_at": now.to_rfc3339(),
        "file_original": file_original,
        "mime_type": doc.mime_type,
        "size_bytes": doc.size_bytes,
        "hash_sha256": doc.sha256,
        "ocr_used": doc.ocr_used,
        "ocr_stats": doc.ocr_stats,
        "text_length": doc.text.chars().count(),
        "source_filename": doc.source_filename,
        "tahun": doc.parsed.tahun,
        "jenis": doc.parsed.jenis,
        "nomor": doc.nomor_final,
        "tanggal_surat": doc.parsed.tanggal_surat,
        "bulan": doc.bulan,
        "parsed": doc.parsed,
        "metadata_quality": doc.quality,
    });
    let meta_path = dir.join("metadata.json");
    let meta_bytes = serde_json::to_vec_pretty(&record).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
    write_atomic(&meta_path, &meta_bytes)?;

    info!(folder = %dir.display(), original = %file_original, "document filed");
    Ok(StoredPaths {
        folder: dir.to_string_lossy().to_string(),
        original_path: original_path.to_string_lossy().to_string(),
        text_path: text_path.map(|p| p.to_string_lossy().to_string()),
        meta_path: meta_path.to_string_lossy().to_string(),
    })
}

// write to a sibling temp file, then rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let tmp = tmp_path(path);
    std::fs::write(&tmp, bytes).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| StoreError::WriteFailed(e.to_string()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("{name}.tmp.{}", std::process::id()))
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
