//! Page access and rasterization.
//!
//! The scanner only talks to the [`DocumentLoader`] and [`PagedDocument`]
//! traits. [`PdfiumLoader`] is the production backend; it binds to the
//! pdfium shared library at runtime.
//!
//! Note: pdfium must be installed or shipped next to the binary.
//! On macOS: brew install pdfium
//! On Linux: apt install libpdfium-dev
//! On Windows: download from https://github.com/bblanchon/pdfium-binaries

use crate::color::RasterPage;
use crate::schema::ScanError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Opens documents for page-by-page inspection.
pub trait DocumentLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PagedDocument + 'a>, ScanError>;
}

/// An opened document. Page indices are 0-based.
pub trait PagedDocument {
    fn page_count(&self) -> usize;

    /// Media-box width and height in points.
    fn media_box(&self, index: usize) -> Result<(f64, f64), ScanError>;

    /// Renders the full visible page content (vector and image) at the
    /// loader's fixed resolution.
    fn render(&self, index: usize) -> Result<RasterPage, ScanError>;
}

/// pdfium-backed loader.
pub struct PdfiumLoader {
    pdfium: Pdfium,
    scale: f32,
}

impl PdfiumLoader {
    /// Binds to pdfium, either from `library_dir` or the system search path,
    /// rendering at `dpi` for every page of every document.
    pub fn bind(library_dir: Option<&Path>, dpi: f32) -> Result<Self, ScanError> {
        let bindings = match library_dir {
            Some(dir) => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            }
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ScanError::Render(format!("failed to bind pdfium: {}", e)))?;

        tracing::info!("pdfium bound, rendering at {} dpi", dpi);
        Ok(Self {
            pdfium: Pdfium::new(bindings),
            scale: dpi / 72.0,
        })
    }
}

impl DocumentLoader for PdfiumLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PagedDocument + 'a>, ScanError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| document_error(path, e))?;
        Ok(Box::new(PdfiumDocument {
            path: path.to_path_buf(),
            document,
            scale: self.scale,
        }))
    }
}

struct PdfiumDocument<'a> {
    path: PathBuf,
    document: PdfDocument<'a>,
    scale: f32,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, ScanError> {
        let index = PdfPageIndex::try_from(index).map_err(|_| ScanError::DocumentRead {
            file: self.path.display().to_string(),
            reason: format!("page index {} out of range", index),
        })?;
        self.document
            .pages()
            .get(index)
            .map_err(|e| document_error(&self.path, e))
    }
}

impl PagedDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn media_box(&self, index: usize) -> Result<(f64, f64), ScanError> {
        let page = self.page(index)?;
        // An inherited MediaBox is not resolved per page; page width and
        // height are the crop box, which can be smaller than the sheet.
        let (width, height) = match page.boundaries().media() {
            Ok(media) => (media.bounds.width(), media.bounds.height()),
            Err(e) => {
                tracing::warn!(
                    "no media box on page {} of {}: {}, classifying by crop box",
                    index + 1,
                    self.path.display(),
                    e
                );
                (page.width(), page.height())
            }
        };
        Ok((f64::from(width.value), f64::from(height.value)))
    }

    fn render(&self, index: usize) -> Result<RasterPage, ScanError> {
        let page = self.page(index)?;
        let config = PdfRenderConfig::new()
            .scale_page_by_factor(self.scale)
            .render_form_data(true)
            .render_annotations(true);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| document_error(&self.path, e))?;

        Ok(RasterPage::new(
            bitmap.width().max(0) as usize,
            bitmap.height().max(0) as usize,
            4,
            bitmap.as_rgba_bytes(),
        ))
    }
}

fn document_error(path: &Path, err: PdfiumError) -> ScanError {
    ScanError::DocumentRead {
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        reason: err.to_string(),
    }
}
