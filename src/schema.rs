//! Data structures and types for print-cost estimation.
//!
//! This module defines the core types used throughout the estimator,
//! including the error type, the scan configuration, the per-page size
//! buckets, and the summary rows that end up in the spreadsheet.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while scanning a folder or writing the report.
///
/// Only document I/O and persistence can fail; page classification is total.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The target folder could not be listed.
    #[error("cannot read folder {path}: {source}")]
    FolderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A single document could not be opened or one of its pages could not be read.
    #[error("cannot read {file}: {reason}")]
    DocumentRead { file: String, reason: String },
    /// The rasterization backend could not be initialised.
    #[error("render backend error: {0}")]
    Render(String),
    /// The output directory or report file could not be written.
    #[error("cannot write report to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The workbook container or its XML parts could not be encoded.
    #[error("spreadsheet encoding error: {0}")]
    Spreadsheet(String),
    /// The configuration file was unreadable or malformed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Standard paper size bucket, ordered smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    A3,
    A2,
    A1,
}

impl PageSize {
    /// All buckets in ascending order.
    pub const ALL: [PageSize; 4] = [PageSize::A4, PageSize::A3, PageSize::A2, PageSize::A1];

    /// How many A4 sheets of printable area one page of this size is worth.
    pub fn a4_multiplier(self) -> u64 {
        match self {
            PageSize::A4 => 1,
            PageSize::A3 => 2,
            PageSize::A2 => 4,
            PageSize::A1 => 8,
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageSize::A4 => "A4",
            PageSize::A3 => "A3",
            PageSize::A2 => "A2",
            PageSize::A1 => "A1",
        };
        f.write_str(name)
    }
}

/// 1-based page index to size bucket. Keys are unique per document.
pub type PageSizeMap = BTreeMap<usize, PageSize>;

/// The three size maps gathered for one document.
///
/// `colored` and `monochrome` partition the keys of `all`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPages {
    pub all: PageSizeMap,
    pub colored: PageSizeMap,
    pub monochrome: PageSizeMap,
}

impl DocumentPages {
    /// Records one classified page into `all` and exactly one of the subsets.
    pub fn record(&mut self, page_number: usize, size: PageSize, colored: bool) {
        self.all.insert(page_number, size);
        if colored {
            self.colored.insert(page_number, size);
        } else {
            self.monochrome.insert(page_number, size);
        }
    }
}

/// One spreadsheet row: the classification result for a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub file_name: String,
    /// Total number of pages in the document.
    pub page_count: usize,
    pub a4: usize,
    pub a3: usize,
    pub a2: usize,
    pub a1: usize,
    /// A4-equivalent count over all pages.
    pub printed_pages: u64,
    /// A4-equivalent count over monochrome pages.
    pub monochrome_pages: u64,
    /// A4-equivalent count over colored pages.
    pub colored_pages: u64,
    /// 1-based indices of the colored pages, ascending.
    pub colored_page_numbers: Vec<usize>,
}

impl DocumentSummary {
    /// The colored page indices as they appear in the report, e.g. `"1,4,7"`.
    pub fn colored_page_list(&self) -> String {
        self.colored_page_numbers
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Summary rows in folder enumeration order.
pub type ResultTable = Vec<DocumentSummary>;

/// Spreadsheet header, in the order downstream consumers expect.
pub const REPORT_COLUMNS: [&str; 10] = [
    "File Name",
    "PDF",
    "A4",
    "A3",
    "A2",
    "A1",
    "인쇄 페이지수",
    "흑백 페이지수",
    "컬러 페이지수",
    "컬러 페이지",
];

/// A document that was skipped because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentFailure {
    pub file_name: String,
    pub reason: String,
}

/// Human-readable progress emitted while a scan runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A document is about to be processed. `index` is 1-based.
    Processing {
        index: usize,
        total: usize,
        file_name: String,
    },
    /// A document could not be read and was skipped.
    DocumentFailed { file_name: String, reason: String },
    /// The report has been written.
    Saved { path: PathBuf },
    /// The run was stopped by the user.
    Cancelled,
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Processing {
                index,
                total,
                file_name,
            } => write!(f, "{}/{} files processing... ({})", index, total, file_name),
            ProgressEvent::DocumentFailed { file_name, reason } => {
                write!(f, "failed to read {}: {}", file_name, reason)
            }
            ProgressEvent::Saved { path } => write!(f, "PDF info saved to {}.", path.display()),
            ProgressEvent::Cancelled => f.write_str("stopped"),
        }
    }
}

/// What a finished run handed back.
#[derive(Debug)]
pub enum ScanOutcome {
    /// Every document was visited and the report was persisted.
    Completed {
        table: ResultTable,
        output: PathBuf,
        failures: Vec<DocumentFailure>,
    },
    /// Cancellation was observed; `completed` holds only fully processed rows.
    /// Nothing is persisted for an aborted run.
    Aborted { completed: ResultTable },
}

/// Configuration options for a scan.
///
/// All fields are optional. When not provided, the defaults documented on
/// each accessor are used. The struct deserializes from JSON so it can be
/// kept in a config file next to the PDFs.
///
/// ```json
/// { "color_tolerance": 12, "render_dpi": 96 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanOptions {
    /// Maximum per-channel difference still treated as gray.
    pub color_tolerance: Option<u8>,
    /// Rasterization resolution used for color analysis.
    pub render_dpi: Option<f32>,
    /// Where the spreadsheet is written.
    pub output_dir: Option<PathBuf>,
    /// Directory containing the pdfium shared library.
    pub pdfium_library_dir: Option<PathBuf>,
}

impl ScanOptions {
    pub const DEFAULT_COLOR_TOLERANCE: u8 = 10;
    pub const DEFAULT_RENDER_DPI: f32 = 72.0;

    /// Parses options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        serde_json::from_str(json).map_err(|e| ScanError::Config(e.to_string()))
    }

    /// Defaults to 10.
    pub fn color_tolerance(&self) -> u8 {
        self.color_tolerance
            .unwrap_or(Self::DEFAULT_COLOR_TOLERANCE)
    }

    /// Defaults to 72 DPI (one pixel per point). Non-positive or non-finite
    /// values fall back to the default.
    pub fn render_dpi(&self) -> f32 {
        match self.render_dpi {
            Some(dpi) if dpi.is_finite() && dpi > 0.0 => dpi,
            _ => Self::DEFAULT_RENDER_DPI,
        }
    }

    /// Defaults to `<current working directory>/output`.
    pub fn output_dir(&self) -> Result<PathBuf, ScanError> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let cwd = std::env::current_dir().map_err(|source| ScanError::Persist {
                    path: PathBuf::from("."),
                    source,
                })?;
                Ok(cwd.join("output"))
            }
        }
    }
}
