//! Scan a PDF's object headers or cross-reference table
//!
//! Prints a JSON report to stdout.
//!
//! Usage:
//!   cargo run --bin pdf_scan -- file.pdf
//!   cargo run --bin pdf_scan -- file.pdf --xref

use pdf_objects::document::PdfDocument;
use pdf_objects::scanner::scan_object_headers;
use pdf_objects::source::ByteSource;
use pdf_objects::xref::CrossRefEntry;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

struct ScanConfig {
    path: Option<PathBuf>,
    xref: bool,
}

impl ScanConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut path = None;
        let mut xref = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--xref" | "-x" => {
                    xref = true;
                },
                arg if !arg.starts_with('-') && path.is_none() => {
                    path = Some(PathBuf::from(arg));
                },
                other => {
                    eprintln!("Ignoring unknown argument {}", other);
                },
            }
            i += 1;
        }

        Self { path, xref }
    }
}

#[derive(Serialize)]
struct XRefReport {
    version: String,
    sections: Vec<u64>,
    size: u32,
    root: Option<String>,
    entries: Vec<XRefReportEntry>,
}

#[derive(Serialize)]
struct XRefReportEntry {
    object_num: u32,
    #[serde(flatten)]
    entry: CrossRefEntry,
}

fn xref_report(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let doc = PdfDocument::open(path)?;
    let (major, minor) = doc.version();

    let mut entries: Vec<XRefReportEntry> = doc
        .xref()
        .iter()
        .map(|(object_num, entry)| XRefReportEntry {
            object_num,
            entry: *entry,
        })
        .collect();
    entries.sort_by_key(|e| e.object_num);

    let report = XRefReport {
        version: format!("{}.{}", major, minor),
        sections: doc.xref().section_offsets().to_vec(),
        size: doc.trailer().size,
        root: doc.trailer().root.map(|r| r.to_string()),
        entries,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn headers_report(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let source = ByteSource::open(path)?;
    let headers = scan_object_headers(source.as_bytes());
    Ok(serde_json::to_string_pretty(&headers)?)
}

fn main() -> ExitCode {
    env_logger::init();

    let config = ScanConfig::from_args();
    let Some(path) = config.path else {
        eprintln!("Usage: pdf_scan <file.pdf> [--xref]");
        return ExitCode::from(2);
    };

    let result = if config.xref {
        xref_report(&path)
    } else {
        headers_report(&path)
    };

    match result {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            ExitCode::FAILURE
        },
    }
}
