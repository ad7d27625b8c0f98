//! # Folder Scanner
//!
//! Drives a whole run: lists the PDFs in a folder, classifies every page by
//! size and color, builds one summary row per document and hands the
//! finished table to a [`ReportWriter`].
//!
//! ## Cancellation
//!
//! The only state shared with the caller is a [`CancelToken`]. The scanner
//! polls it before every page, so a stop request takes effect within one
//! page's worth of work. The flag is consumed (reset) at the moment the
//! abort is observed, never at run start, so the next run begins clean
//! without racing a stale request.
//!
//! ## Failures
//!
//! A document that cannot be opened or read is reported through the
//! progress stream and skipped; the rest of the batch still runs. Only
//! folder listing and report persistence end a run with an error.

use crate::color::is_colored;
use crate::file_utils::list_pdf_files;
use crate::render::{DocumentLoader, PagedDocument};
use crate::schema::{
    DocumentFailure, DocumentPages, DocumentSummary, ProgressEvent, ResultTable, ScanError,
    ScanOptions, ScanOutcome,
};
use crate::size_utils::{a4_equivalent, classify_page_size, size_counts};
use crate::xlsx::ReportWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// One-shot stop request shared between the worker and whoever drives it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the running scan stop before its next page.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop request is pending.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Consumes a pending request, returning whether there was one.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

enum DocumentScan {
    Done(DocumentPages),
    Aborted,
}

/// Scans one folder. Reusable: call [`DocumentScanner::run`] again after a
/// run finishes or aborts.
pub struct DocumentScanner {
    folder: PathBuf,
    options: ScanOptions,
    cancel: CancelToken,
}

impl DocumentScanner {
    pub fn new(folder: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            folder: folder.into(),
            options,
            cancel: CancelToken::new(),
        }
    }

    /// A handle that can stop this scanner from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Requests cancellation of the current run.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Runs the scan to completion or cancellation, reporting progress
    /// through `progress` as it goes.
    ///
    /// # Returns
    ///
    /// - `ScanOutcome::Completed` once every document was visited and the
    ///   table was written by `writer`
    /// - `ScanOutcome::Aborted` if cancellation was observed; nothing is
    ///   written and the in-flight document contributes no row
    ///
    /// # Errors
    ///
    /// Returns `ScanError::FolderRead` if the folder cannot be listed, or the
    /// writer's error if the table cannot be persisted.
    pub fn run<L, W, P>(
        &self,
        loader: &L,
        writer: &W,
        mut progress: P,
    ) -> Result<ScanOutcome, ScanError>
    where
        L: DocumentLoader + ?Sized,
        W: ReportWriter + ?Sized,
        P: FnMut(ProgressEvent),
    {
        let file_names = list_pdf_files(&self.folder)?;
        let total = file_names.len();
        tracing::info!("{} PDF files found in {}", total, self.folder.display());

        let mut table = ResultTable::with_capacity(total);
        let mut failures = Vec::new();

        for (i, file_name) in file_names.into_iter().enumerate() {
            progress(ProgressEvent::Processing {
                index: i + 1,
                total,
                file_name: file_name.clone(),
            });

            let path = self.folder.join(&file_name);
            let scanned = loader
                .open(&path)
                .and_then(|document| self.scan_document(document.as_ref(), &file_name));

            match scanned {
                Ok(DocumentScan::Done(pages)) => {
                    let summary = summarize(&file_name, &pages);
                    tracing::info!(
                        "{}: {} pages, {} A4-equivalent ({} colored)",
                        file_name,
                        summary.page_count,
                        summary.printed_pages,
                        summary.colored_pages
                    );
                    table.push(summary);
                }
                Ok(DocumentScan::Aborted) => {
                    tracing::warn!("scan cancelled while processing {}", file_name);
                    progress(ProgressEvent::Cancelled);
                    return Ok(ScanOutcome::Aborted { completed: table });
                }
                Err(err) => {
                    let reason = match err {
                        ScanError::DocumentRead { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    tracing::warn!("skipping {}: {}", file_name, reason);
                    progress(ProgressEvent::DocumentFailed {
                        file_name: file_name.clone(),
                        reason: reason.clone(),
                    });
                    failures.push(DocumentFailure { file_name, reason });
                }
            }
        }

        let output = writer.write(&table)?;
        progress(ProgressEvent::Saved {
            path: output.clone(),
        });
        Ok(ScanOutcome::Completed {
            table,
            output,
            failures,
        })
    }

    fn scan_document(
        &self,
        document: &dyn PagedDocument,
        file_name: &str,
    ) -> Result<DocumentScan, ScanError> {
        let tolerance = self.options.color_tolerance();
        let mut pages = DocumentPages::default();

        for index in 0..document.page_count() {
            if self.cancel.take() {
                return Ok(DocumentScan::Aborted);
            }
            let page_number = index + 1;
            let (width, height) = document.media_box(index)?;
            let size = classify_page_size(width, height);
            let colored = is_colored(&document.render(index)?, tolerance);
            tracing::debug!(
                "{}: page {} is {}{}",
                file_name,
                page_number,
                size,
                if colored { ", colored" } else { "" }
            );
            pages.record(page_number, size, colored);
        }
        Ok(DocumentScan::Done(pages))
    }
}

/// Builds the report row for one fully classified document.
pub fn summarize(file_name: &str, pages: &DocumentPages) -> DocumentSummary {
    let [a4, a3, a2, a1] = size_counts(&pages.all);
    DocumentSummary {
        file_name: file_name.to_owned(),
        page_count: pages.all.len(),
        a4,
        a3,
        a2,
        a1,
        printed_pages: a4_equivalent(&pages.all),
        monochrome_pages: a4_equivalent(&pages.monochrome),
        colored_pages: a4_equivalent(&pages.colored),
        colored_page_numbers: pages.colored.keys().copied().collect(),
    }
}

/// A scan running on its own worker thread.
///
/// Progress events arrive on a channel so the consumer (a terminal, a UI
/// event loop) never blocks the worker and is never blocked by it.
pub struct ScanHandle {
    events: Receiver<ProgressEvent>,
    cancel: CancelToken,
    worker: JoinHandle<Result<ScanOutcome, ScanError>>,
}

impl ScanHandle {
    /// Starts `scanner` on a new thread.
    ///
    /// `make_loader` runs on the worker thread, so the loader itself never
    /// has to cross threads.
    pub fn spawn<F, L, W>(scanner: DocumentScanner, make_loader: F, writer: W) -> Self
    where
        F: FnOnce() -> Result<L, ScanError> + Send + 'static,
        L: DocumentLoader,
        W: ReportWriter + Send + 'static,
    {
        let (tx, events) = mpsc::channel();
        let cancel = scanner.cancel_token();
        let worker = thread::spawn(move || {
            let loader = make_loader()?;
            scanner.run(&loader, &writer, |event| {
                // a dropped receiver only means nobody is listening anymore
                let _ = tx.send(event);
            })
        });
        Self {
            events,
            cancel,
            worker,
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks for each progress event until the worker finishes.
    pub fn events(&self) -> mpsc::Iter<'_, ProgressEvent> {
        self.events.iter()
    }

    /// Waits for the worker and returns its outcome.
    pub fn join(self) -> Result<ScanOutcome, ScanError> {
        match self.worker.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PageSize;

    #[test]
    fn cancel_token_is_consumed_once() {
        let token = CancelToken::new();
        assert!(!token.take());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.take());
        assert!(!token.take());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.take());
        assert!(!other.is_cancelled());
    }

    #[test]
    fn summary_counts_balance() {
        let mut pages = DocumentPages::default();
        pages.record(1, PageSize::A4, false);
        pages.record(2, PageSize::A3, true);
        pages.record(3, PageSize::A1, false);
        pages.record(4, PageSize::A4, true);

        let summary = summarize("mix.pdf", &pages);
        assert_eq!(summary.page_count, 4);
        assert_eq!(
            summary.a4 + summary.a3 + summary.a2 + summary.a1,
            summary.page_count
        );
        assert_eq!((summary.a4, summary.a3, summary.a2, summary.a1), (2, 1, 0, 1));
        assert_eq!(summary.printed_pages, 1 + 2 + 8 + 1);
        assert_eq!(summary.colored_pages, 3);
        assert_eq!(summary.monochrome_pages, 9);
        assert_eq!(
            summary.printed_pages,
            summary.colored_pages + summary.monochrome_pages
        );
        assert_eq!(summary.colored_page_numbers, vec![2, 4]);
    }

    #[test]
    fn empty_document_summarizes_to_zero() {
        let summary = summarize("blank.pdf", &DocumentPages::default());
        assert_eq!(summary.page_count, 0);
        assert_eq!(summary.printed_pages, 0);
        assert_eq!(summary.colored_page_list(), "");
    }
}
