//! Native text extraction: Poppler for PDFs, the OOXML body for DOCX, plain
//! reads for text files. Decides whether a document looks like a scan.

use std::io::Read;
use std::path::Path;
use std::process::Command;

use quick_xml::events::Event;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TEXT: &str = "text/plain";

/// Pages with fewer non-whitespace characters than this are suspect.
pub const SUSPECT_PAGE_MIN_CHARS: usize = 64;
/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("EncryptedPDF: {0}")]
    Encrypted(String),
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
    #[error("PopplerError: {0}")]
    Poppler(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Probe the external tools.
/// - Required: pdftotext (native PDF text)
/// - Optional: pdfinfo, pdftoppm, tesseract (OCR)
pub fn check_deps() -> DepsResult {
    let mut missing = Vec::new();
    let has_pdftotext = which::which("pdftotext").is_ok();
    if !has_pdftotext {
        missing.push("pdftotext".to_string());
    }
    for tool in ["pdfinfo", "pdftoppm", "tesseract"] {
        if which::which(tool).is_err() {
            missing.push(tool.to_string());
        }
    }
    DepsResult { ok: has_pdftotext, missing }
}

/// apt install hint for missing tools, empty when nothing is missing.
pub fn install_help_for(missing: &[String]) -> String {
    let mut pkgs: Vec<&str> = Vec::new();
    if missing.iter().any(|m| m.starts_with("pdf")) {
        pkgs.push("poppler-utils");
    }
    if missing.iter().any(|m| m == "tesseract") {
        pkgs.push("tesseract-ocr");
        pkgs.push("tesseract-ocr-ind");
    }
    if pkgs.is_empty() {
        return String::new();
    }
    format!("Dependency missing. Install via apt:\n  sudo apt install {}", pkgs.join(" "))
}

/// MIME type for the supported extensions.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(MIME_PDF),
        "docx" => Some(MIME_DOCX),
        "txt" => Some(MIME_TEXT),
        _ => None,
    }
}

/// File extension used when storing an original of this MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        MIME_PDF => "pdf",
        MIME_DOCX => "docx",
        _ => "txt",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeText {
    pub text: String,
    pub pages: usize,
    /// Most pages carry (almost) no text layer.
    pub is_scanned: bool,
    /// 0-based indices of pages under the character threshold.
    pub suspect_pages: Vec<usize>,
}

impl NativeText {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A scanned document whose text layer is too thin to trust.
pub fn needs_ocr(native: &NativeText, min_words: usize) -> bool {
    native.is_scanned && native.word_count() < min_words
}

/// Extract the text layer of `path` according to its MIME type.
pub fn extract_native(path: &Path, mime: &str) -> Result<NativeText, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.display().to_string()));
    }
    let native = match mime {
        MIME_PDF => {
            let pages = poppler_extract(path)?;
            let suspect_pages = detect_suspect_pages(&pages, SUSPECT_PAGE_MIN_CHARS);
            let text = pages.join("\n");
            let is_scanned = text.trim().is_empty() || suspect_pages.len() * 2 >= pages.len();
            NativeText { text, pages: pages.len(), is_scanned, suspect_pages }
        }
        MIME_DOCX => {
            let bytes = std::fs::read(path)?;
            NativeText { text: docx_text(&bytes)?, pages: 1, is_scanned: false, suspect_pages: Vec::new() }
        }
        MIME_TEXT => {
            let bytes = std::fs::read(path)?;
            let text = String::from_utf8_lossy(&bytes).into_owned();
            NativeText { text, pages: 1, is_scanned: false, suspect_pages: Vec::new() }
        }
        other => return Err(ExtractError::UnsupportedType(other.to_string())),
    };
    info!(
        file = %path.display(),
        pages = native.pages,
        words = native.word_count(),
        scanned = native.is_scanned,
        "native text extracted"
    );
    Ok(native)
}

/// Extract text pages using Poppler's `pdftotext -layout`.
/// Runs per page when `pdfinfo` reports a page count, otherwise one pass split on form feeds.
pub fn poppler_extract(path: &Path) -> Result<Vec<String>, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound(path.display().to_string()));
    }

    match pdfinfo_pages(path)? {
        Some(n_pages) => {
            let mut pages = Vec::with_capacity(n_pages);
            for i in 1..=n_pages {
                let page = i.to_string();
                let out = run_pdftotext(path, &["-layout", "-nopgbrk", "-q", "-f", &page, "-l", &page])?;
                pages.push(out);
            }
            Ok(pages)
        }
        None => {
            // no -nopgbrk, so the form feeds survive as page separators
            let out = run_pdftotext(path, &["-layout", "-q"])?;
            let mut pages: Vec<String> = out.split('\u{000C}').map(str::to_string).collect();
            while matches!(pages.last(), Some(last) if last.trim().is_empty()) {
                pages.pop();
            }
            Ok(pages)
        }
    }
}

fn pdfinfo_pages(path: &Path) -> Result<Option<usize>, ExtractError> {
    if which::which("pdfinfo").is_err() {
        return Ok(None);
    }
    let Ok(out) = Command::new("pdfinfo").arg(path).output() else {
        return Ok(None);
    };
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr).to_lowercase();
        if err.contains("encrypt") || err.contains("password") {
            return Err(ExtractError::Encrypted(path.display().to_string()));
        }
        return Ok(None);
    }
    let info = String::from_utf8_lossy(&out.stdout);
    Ok(info
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .and_then(|rest| rest.trim().parse::<usize>().ok()))
}

fn run_pdftotext(path: &Path, args: &[&str]) -> Result<String, ExtractError> {
    let out = Command::new("pdftotext")
        .args(args)
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| ExtractError::Poppler(e.to_string()))?;
    if !out.status.success() {
        let err = String::from_utf8_lossy(&out.stderr).to_lowercase();
        if err.contains("encrypt") || err.contains("password") {
            return Err(ExtractError::Encrypted(path.display().to_string()));
        }
        return Err(ExtractError::Poppler(format!("pdftotext failed: {}", err.trim())));
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}

/// Return 0-based indices of pages whose non-whitespace characters are less than min_chars.
pub fn detect_suspect_pages(pages: &[String], min_chars: usize) -> Vec<usize> {
    pages
        .iter()
        .enumerate()
        .filter(|(_, page)| page.chars().filter(|c| !c.is_whitespace()).count() < min_chars)
        .map(|(idx, _)| idx)
        .collect()
}

/// Body text of a DOCX archive, one line per paragraph.
pub fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive.by_name("word/document.xml").map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::Docx("word/document.xml exceeds size limit".into()));
    }
    paragraphs_text(&xml)
}

fn paragraphs_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut out = String::new();
    let mut in_run_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_run_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_run_text => {
                let text = te.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    debug!(chars = out.len(), "docx body read");
    Ok(out.trim_end().to_string())
}
