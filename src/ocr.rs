//! OCR page pipeline for scanned documents.
//!
//! Pages are rendered one at a time into their own scratch directory, enhanced,
//! and recognised. A page that fails is counted and skipped; it never aborts the
//! rest of the document.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{imageops, DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const MIN_DPI: u32 = 72;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("{0} not available")]
    NotAvailable(String),
    #[error("cannot open document: {0}")]
    Open(String),
    #[error("render failed on page {page}: {message}")]
    Render { page: u32, message: String },
    #[error("recognition failed: {0}")]
    Recognize(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub dpi: u32,
    /// Primary recognition language; recognition falls back to the default model.
    pub lang: String,
    /// 1.0 leaves the image unchanged; 1.5 is a 50% boost.
    pub contrast: f32,
    pub sharpness: f32,
    /// Scanned documents with fewer native words than this are sent to OCR.
    pub min_native_words: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { dpi: 300, lang: "ind".into(), contrast: 1.5, sharpness: 1.3, min_native_words: 50 }
    }
}

/// Audit trail of one OCR run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrStats {
    pub total_pages: u32,
    pub success_pages: u32,
    pub failed_pages: u32,
    pub total_chars: usize,
    pub dpi: u32,
    pub language: String,
    /// Percentage of pages that produced text, one decimal.
    pub success_rate: f64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrStats {
    fn empty(dpi: u32, language: &str, method: &str) -> Self {
        Self {
            total_pages: 0,
            success_pages: 0,
            failed_pages: 0,
            total_chars: 0,
            dpi,
            language: language.to_string(),
            success_rate: 0.0,
            method: method.to_string(),
            error: None,
        }
    }
}

/// A paged document that can be rasterised.
pub trait PageSource {
    fn name(&self) -> &str;
    fn page_count(&self) -> Result<u32, OcrError>;
    /// Render 1-based `page`. Temporary files go in `scratch`.
    fn render(&self, page: u32, dpi: u32, scratch: &Path) -> Result<DynamicImage, OcrError>;
}

/// Text recognition over an enhanced grayscale page.
pub trait Recognizer {
    fn name(&self) -> &str;
    /// `lang == None` runs the engine's default model.
    fn recognize(&self, image: &GrayImage, lang: Option<&str>, scratch: &Path) -> Result<String, OcrError>;
}

#[derive(Debug)]
pub enum PageOutcome {
    Recognized(String),
    Failed,
}

/// Grayscale, contrast and sharpness boost ahead of recognition.
pub fn enhance(image: &DynamicImage, contrast: f32, sharpness: f32) -> GrayImage {
    let gray = image.to_luma8();
    let gray = adjust_contrast(&gray, contrast);
    adjust_sharpness(&gray, sharpness)
}

/// Scale each pixel's distance from the mean luminance by `factor`.
fn adjust_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let raw = img.as_raw();
    if raw.is_empty() {
        return img.clone();
    }
    let sum: u64 = raw.iter().map(|&p| u64::from(p)).sum();
    let mean = (sum as f32 / raw.len() as f32 + 0.5).floor();
    let mut out = img.clone();
    for px in out.pixels_mut() {
        px.0[0] = blend(mean, f32::from(px.0[0]), factor);
    }
    out
}

/// Blend against a 3x3 smoothed copy; factors above 1.0 sharpen. Border pixels are kept.
fn adjust_sharpness(img: &GrayImage, factor: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    let smooth: GrayImage = imageops::filter3x3(img, &[1.0, 1.0, 1.0, 1.0, 5.0, 1.0, 1.0, 1.0, 1.0]);
    let mut out = img.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
            continue;
        }
        let degenerate = f32::from(smooth.get_pixel(x, y).0[0]);
        px.0[0] = blend(degenerate, f32::from(px.0[0]), factor);
    }
    out
}

fn blend(base: f32, value: f32, factor: f32) -> u8 {
    (base + (value - base) * factor).round().clamp(0.0, 255.0) as u8
}

/// Run every page of `source` through `recognizer`.
///
/// Returns the non-empty page texts joined by newlines and the run's stats.
/// Failing to open the document yields empty text with `error` set.
pub fn recognize_pages<S, R>(source: &S, recognizer: &R, config: &OcrConfig) -> (String, OcrStats)
where
    S: PageSource + ?Sized,
    R: Recognizer + ?Sized,
{
    let dpi = config.dpi.max(MIN_DPI);
    let method = format!("{} + {}", source.name(), recognizer.name());
    let mut stats = OcrStats::empty(dpi, &config.lang, &method);

    let total = match source.page_count() {
        Ok(n) => n,
        Err(err) => {
            warn!(error = %err, "ocr could not open document");
            stats.error = Some(err.to_string());
            return (String::new(), stats);
        }
    };
    stats.total_pages = total;
    info!(pages = total, dpi, "starting ocr");

    let mut chunks: Vec<String> = Vec::new();
    for page in 1..=total {
        match recognize_page(source, recognizer, config, page, dpi) {
            PageOutcome::Recognized(text) => {
                stats.success_pages += 1;
                chunks.push(text);
            }
            PageOutcome::Failed => stats.failed_pages += 1,
        }
    }

    let text = chunks.join("\n").trim().to_string();
    stats.total_chars = text.chars().count();
    stats.success_rate = if total > 0 {
        (f64::from(stats.success_pages) / f64::from(total) * 1000.0).round() / 10.0
    } else {
        0.0
    };
    info!(
        chars = stats.total_chars,
        success = stats.success_pages,
        pages = total,
        rate = stats.success_rate,
        "ocr completed"
    );
    (text, stats)
}

fn recognize_page<S, R>(source: &S, recognizer: &R, config: &OcrConfig, page: u32, dpi: u32) -> PageOutcome
where
    S: PageSource + ?Sized,
    R: Recognizer + ?Sized,
{
    // dropped at the end of this call, before the next page starts
    let scratch = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(err) => {
            warn!(page, error = %err, "no scratch directory for page");
            return PageOutcome::Failed;
        }
    };

    let image = match source.render(page, dpi, scratch.path()) {
        Ok(image) => image,
        Err(err) => {
            warn!(page, error = %err, "page render failed");
            return PageOutcome::Failed;
        }
    };
    let gray = enhance(&image, config.contrast, config.sharpness);

    let text = match recognizer.recognize(&gray, Some(config.lang.as_str()), scratch.path()) {
        Ok(text) => text,
        Err(err) => {
            debug!(page, lang = %config.lang, error = %err, "primary language failed, retrying with default model");
            match recognizer.recognize(&gray, None, scratch.path()) {
                Ok(text) => text,
                Err(err) => {
                    warn!(page, error = %err, "page recognition failed");
                    return PageOutcome::Failed;
                }
            }
        }
    };

    if text.trim().is_empty() {
        debug!(page, "page produced no text");
        return PageOutcome::Failed;
    }
    debug!(page, chars = text.chars().count(), "page recognised");
    PageOutcome::Recognized(text)
}

/// Pages of a PDF rendered with Poppler's `pdfinfo` and `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PopplerPages {
    path: PathBuf,
}

impl PopplerPages {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageSource for PopplerPages {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    fn page_count(&self) -> Result<u32, OcrError> {
        let out = Command::new("pdfinfo").arg(&self.path).output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OcrError::NotAvailable("pdfinfo".into()),
            _ => OcrError::Io(e),
        })?;
        if !out.status.success() {
            let err = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(OcrError::Open(format!("{}: {}", self.path.display(), err)));
        }
        let info = String::from_utf8_lossy(&out.stdout);
        info.lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|rest| rest.trim().parse::<u32>().ok())
            .ok_or_else(|| OcrError::Open(format!("{}: no page count", self.path.display())))
    }

    fn render(&self, page: u32, dpi: u32, scratch: &Path) -> Result<DynamicImage, OcrError> {
        let prefix = scratch.join(format!("page-{}", page));
        let out = Command::new("pdftoppm")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(&self.path)
            .arg(&prefix)
            .output()?;
        if !out.status.success() {
            let message = String::from_utf8_lossy(&out.stderr).trim().to_string();
            return Err(OcrError::Render { page, message });
        }
        let png = prefix.with_extension("png");
        if !png.is_file() {
            return Err(OcrError::Render { page, message: "image missing".into() });
        }
        Ok(image::open(&png)?)
    }
}

/// The `tesseract` command-line engine.
#[derive(Debug, Clone, Default)]
pub struct TesseractCli;

impl Recognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage, lang: Option<&str>, scratch: &Path) -> Result<String, OcrError> {
        let input = scratch.join("enhanced.png");
        image.save(&input)?;

        let mut cmd = Command::new("tesseract");
        cmd.arg(&input).arg("stdout");
        if let Some(lang) = lang {
            cmd.args(["-l", lang]);
        }
        let out = cmd.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => OcrError::NotAvailable("tesseract".into()),
            _ => OcrError::Io(e),
        })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(OcrError::Recognize(format!("tesseract failed: {}", stderr.trim())));
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }
}

/// OCR over the Poppler and Tesseract command-line tools, probed once.
#[derive(Debug, Clone)]
pub struct OcrPipeline {
    config: OcrConfig,
    missing: Option<String>,
}

impl OcrPipeline {
    pub const TOOLS: [&'static str; 3] = ["pdfinfo", "pdftoppm", "tesseract"];

    pub fn detect(config: OcrConfig) -> Self {
        let missing = Self::TOOLS.iter().find(|tool| which::which(tool).is_err()).map(|t| t.to_string());
        if let Some(tool) = &missing {
            warn!(tool = %tool, "ocr disabled: tool not found");
        }
        Self { config, missing }
    }

    /// A pipeline whose backend is known to be missing.
    pub fn unavailable(config: OcrConfig, tool: &str) -> Self {
        Self { config, missing: Some(tool.to_string()) }
    }

    pub fn is_available(&self) -> bool {
        self.missing.is_none()
    }

    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// OCR every page of the PDF at `path`. `dpi` is floored at 72.
    pub fn recognize(&self, path: &Path, dpi: u32) -> (String, OcrStats) {
        let config = OcrConfig { dpi, ..self.config.clone() };
        if let Some(tool) = &self.missing {
            let mut stats = OcrStats::empty(config.dpi.max(MIN_DPI), &config.lang, "pdftoppm + tesseract");
            stats.error = Some(OcrError::NotAvailable(tool.clone()).to_string());
            return (String::new(), stats);
        }
        recognize_pages(&PopplerPages::new(path), &TesseractCli, &config)
    }
}
