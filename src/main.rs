use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::json;
use surat_extract::{
    check_deps, enumerate_documents, install_help_for, load_config, mime_for_path, store_document, Config,
    DocumentProcessor, EnumerateError, OcrMode, ProcessedDocument, DEFAULT_CONFIG_FILE, MIME_PDF,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "surat2meta", version, about = "Extract and file metadata from scanned or digital letters")]
struct Cli {
    /// YAML config (defaults to ./surat.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// OCR for PDFs: auto (thin text layer only), on, off
    #[arg(long, global = true, default_value_t = OcrMode::Auto)]
    with_ocr: OcrMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report external tool availability
    Deps,
    /// Extract metadata and print one JSON document per file, writing nothing
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract metadata and file each document under the storage root
    Process {
        /// Defaults to the configured input glob
        files: Vec<PathBuf>,
    },
}

fn emit(event: serde_json::Value) {
    eprintln!("{}", event);
}

fn fail(event: serde_json::Value, code: i32) -> ! {
    emit(event);
    std::process::exit(code);
}

fn main() {
    let cli = Cli::parse();

    let config = read_config(cli.config.as_deref());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Command::Deps => {
            let deps = check_deps();
            println!("{}", json!({ "ok": deps.ok, "missing": deps.missing }));
            let help = install_help_for(&deps.missing);
            if !help.is_empty() {
                eprintln!("{}", help);
            }
            if !deps.ok {
                std::process::exit(2);
            }
        }
        Command::Analyze { files } => {
            let processor = build_processor(&config, cli.with_ocr, &files);
            for file in &files {
                let doc = process_one(&processor, file);
                println!(
                    "{}",
                    json!({
                        "filename": doc.source_filename,
                        "parsed": doc.parsed,
                        "metadata_quality": doc.quality,
                        "ocr_info": doc.ocr_stats,
                        "folder": doc.folder,
                    })
                );
            }
        }
        Command::Process { files } => {
            let files = if files.is_empty() { enumerate(&config.inputs.path) } else { files };
            let processor = build_processor(&config, cli.with_ocr, &files);
            let root = Path::new(&config.storage.root);
            for file in &files {
                let doc = process_one(&processor, file);
                let bytes = match std::fs::read(file) {
                    Ok(b) => b,
                    Err(e) => fail(json!({"tool":"store_document","file": file,"error": e.to_string(),"error_code": 1}), 1),
                };
                match store_document(root, &doc, &bytes) {
                    Ok(paths) => emit(json!({
                        "tool":"store_document",
                        "file": file,
                        "folder": paths.folder,
                        "original_path": paths.original_path,
                        "meta_path": paths.meta_path
                    })),
                    Err(e) => fail(json!({"tool":"store_document","file": file,"error": e.to_string(),"error_code": 6}), 6),
                }
            }
        }
    }
}

fn read_config(explicit: Option<&Path>) -> Config {
    let path = explicit.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let loaded = match explicit {
        Some(p) => load_config(p),
        None => Config::load_or_default(path),
    };
    match loaded {
        Ok(config) => {
            emit(json!({
                "tool":"load_config",
                "file": path,
                "status":"ok",
                "input_glob": config.inputs.path,
                "storage_root": config.storage.root
            }));
            config
        }
        Err(e) => fail(json!({"tool":"load_config","file": path,"error": e.to_string(),"error_code": 3}), 3),
    }
}

fn enumerate(pattern: &str) -> Vec<PathBuf> {
    match enumerate_documents(pattern) {
        Ok(files) => {
            emit(json!({"tool":"enumerate_documents","count": files.len()}));
            files
        }
        Err(EnumerateError::NoFilesFound { guidance }) => {
            emit(json!({"tool":"enumerate_documents","error":"NoFilesFound","error_code": 1}));
            eprintln!("{}", guidance);
            std::process::exit(1);
        }
    }
}

fn build_processor(config: &Config, ocr_mode: OcrMode, files: &[PathBuf]) -> DocumentProcessor {
    let deps = check_deps();
    let has_pdf = files.iter().any(|f| mime_for_path(f) == Some(MIME_PDF));
    if has_pdf && !deps.ok {
        emit(json!({"tool":"check_deps","missing": deps.missing,"error_code": 2}));
        let help = install_help_for(&deps.missing);
        if !help.is_empty() {
            eprintln!("{}", help);
        }
        std::process::exit(2);
    }
    emit(json!({"tool":"check_deps","status":"ok","missing": deps.missing}));

    match DocumentProcessor::from_config(config, ocr_mode) {
        Ok(p) => p,
        Err(e) => fail(json!({"tool":"classifier","error": e.to_string(),"error_code": 3}), 3),
    }
}

fn process_one(processor: &DocumentProcessor, file: &Path) -> ProcessedDocument {
    let source_filename = file.file_name().and_then(|s| s.to_str()).unwrap_or("document").to_string();
    match processor.process(file, &source_filename) {
        Ok(doc) => {
            emit(json!({
                "tool":"process",
                "file": file,
                "jenis": doc.parsed.jenis,
                "nomor": doc.nomor_final,
                "score": doc.quality.score,
                "ocr_used": doc.ocr_used,
                "extraction_error": doc.extraction_error
            }));
            doc
        }
        Err(e) => fail(json!({"tool":"process","file": file,"error": e.to_string(),"error_code": 1}), 1),
    }
}
