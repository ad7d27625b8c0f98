//! Print-cost estimation for folders of PDF documents.
//!
//! Every page is bucketed by paper size (A4 to A1, by area) and checked for
//! colored content on a rasterized copy. Per-document counts are normalized
//! to A4 equivalents and written to a spreadsheet.
//!
//! ```no_run
//! use pdf_print_estimator::{DocumentScanner, PdfiumLoader, ScanOptions, XlsxReportWriter};
//!
//! let options = ScanOptions::default();
//! let loader = PdfiumLoader::bind(None, options.render_dpi())?;
//! let writer = XlsxReportWriter::new(options.output_dir()?);
//! let scanner = DocumentScanner::new("./drawings", options);
//! let _outcome = scanner.run(&loader, &writer, |event| println!("{}", event))?;
//! # Ok::<(), pdf_print_estimator::ScanError>(())
//! ```

pub mod color;
pub mod file_utils;
pub mod render;
pub mod scanner;
pub mod schema;
pub mod size_utils;
pub mod xlsx;

pub use color::{RasterPage, is_colored};
pub use render::{DocumentLoader, PagedDocument, PdfiumLoader};
pub use scanner::{CancelToken, DocumentScanner, ScanHandle, summarize};
pub use schema::{
    DocumentFailure, DocumentPages, DocumentSummary, PageSize, PageSizeMap, ProgressEvent,
    REPORT_COLUMNS, ResultTable, ScanError, ScanOptions, ScanOutcome,
};
pub use size_utils::{a4_equivalent, classify_page_size};
pub use xlsx::{ReportWriter, XlsxReportWriter};
