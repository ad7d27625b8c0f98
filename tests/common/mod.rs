//! Test helpers: an in-memory document backend and folder fixtures.

#![allow(dead_code)]

use pdf_print_estimator::{CancelToken, DocumentLoader, PagedDocument, RasterPage, ScanError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::Receiver;
use tempfile::TempDir;

pub const A4_PT: (f64, f64) = (595.0, 842.0);
pub const A3_PT: (f64, f64) = (842.0, 1191.0);
pub const A1_PT: (f64, f64) = (1684.0, 2384.0);

#[derive(Clone, Copy, Debug)]
pub struct FakePage {
    pub size: (f64, f64),
    pub colored: bool,
}

pub fn mono(size: (f64, f64)) -> FakePage {
    FakePage {
        size,
        colored: false,
    }
}

pub fn color(size: (f64, f64)) -> FakePage {
    FakePage {
        size,
        colored: true,
    }
}

#[derive(Clone, Debug)]
enum FakeEntry {
    Pages {
        pages: Vec<FakePage>,
        unreadable_page: Option<usize>,
    },
    Corrupt,
}

/// Serves documents by file name instead of parsing PDFs.
#[derive(Default)]
pub struct FakeLoader {
    documents: HashMap<String, FakeEntry>,
    /// File names in the order they were opened.
    pub opened: RefCell<Vec<String>>,
    cancel_on_open: Option<(usize, CancelToken)>,
    hold_first_render: Mutex<Option<Receiver<()>>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, pages: Vec<FakePage>) -> Self {
        self.documents.insert(
            name.to_owned(),
            FakeEntry::Pages {
                pages,
                unreadable_page: None,
            },
        );
        self
    }

    pub fn with_corrupt(mut self, name: &str) -> Self {
        self.documents.insert(name.to_owned(), FakeEntry::Corrupt);
        self
    }

    /// A document whose page at 0-based `index` fails to load.
    pub fn with_unreadable_page(mut self, name: &str, pages: Vec<FakePage>, index: usize) -> Self {
        self.documents.insert(
            name.to_owned(),
            FakeEntry::Pages {
                pages,
                unreadable_page: Some(index),
            },
        );
        self
    }

    /// Requests cancellation when the `nth` (1-based) document is opened.
    pub fn cancel_on_open(mut self, nth: usize, token: CancelToken) -> Self {
        self.cancel_on_open = Some((nth, token));
        self
    }

    /// Blocks the first page render until `release` receives a message.
    pub fn hold_first_render(self, release: Receiver<()>) -> Self {
        *self.hold_first_render.lock().unwrap() = Some(release);
        self
    }

    /// Creates a placeholder file for every registered document.
    pub fn populate(&self, dir: &Path) {
        for name in self.documents.keys() {
            fs::write(dir.join(name), b"%PDF-1.7\n").unwrap();
        }
    }
}

impl DocumentLoader for FakeLoader {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PagedDocument + 'a>, ScanError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.opened.borrow_mut().push(name.clone());
        if let Some((nth, token)) = &self.cancel_on_open {
            if self.opened.borrow().len() == *nth {
                token.cancel();
            }
        }
        match self.documents.get(&name) {
            Some(FakeEntry::Pages {
                pages,
                unreadable_page,
            }) => Ok(Box::new(FakeDocument {
                name,
                pages: pages.clone(),
                unreadable_page: *unreadable_page,
                hold: &self.hold_first_render,
            })),
            Some(FakeEntry::Corrupt) => Err(ScanError::DocumentRead {
                file: name,
                reason: "no trailer found".into(),
            }),
            None => Err(ScanError::DocumentRead {
                file: name,
                reason: "unknown document".into(),
            }),
        }
    }
}

struct FakeDocument<'a> {
    name: String,
    pages: Vec<FakePage>,
    unreadable_page: Option<usize>,
    hold: &'a Mutex<Option<Receiver<()>>>,
}

impl FakeDocument<'_> {
    fn page(&self, index: usize) -> Result<&FakePage, ScanError> {
        if self.unreadable_page == Some(index) {
            return Err(ScanError::DocumentRead {
                file: self.name.clone(),
                reason: format!("page {} is damaged", index + 1),
            });
        }
        Ok(&self.pages[index])
    }
}

impl PagedDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn media_box(&self, index: usize) -> Result<(f64, f64), ScanError> {
        Ok(self.page(index)?.size)
    }

    fn render(&self, index: usize) -> Result<RasterPage, ScanError> {
        let page = self.page(index)?;
        let release = self.hold.lock().unwrap().take();
        if let Some(release) = release {
            let _ = release.recv();
        }
        // 2x2 RGBA: white paper, black text, mid gray, and one ink pixel
        let ink = if page.colored {
            [200, 30, 30, 255]
        } else {
            [90, 90, 90, 255]
        };
        let mut samples = Vec::new();
        for px in [[255, 255, 255, 255], [0, 0, 0, 255], [128, 128, 128, 255], ink] {
            samples.extend_from_slice(&px);
        }
        Ok(RasterPage::new(2, 2, 4, samples))
    }
}

pub fn folder_with(loader: &FakeLoader, extra_files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    loader.populate(dir.path());
    for name in extra_files {
        fs::write(dir.path().join(name), b"not a pdf").unwrap();
    }
    dir
}
