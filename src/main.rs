use anyhow::{Context, Result};
use clap::Parser;
use pdf_print_estimator::{
    CancelToken, DocumentScanner, PdfiumLoader, ScanHandle, ScanOptions, ScanOutcome,
    XlsxReportWriter,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdf-print-estimator",
    about = "Estimate printing cost for a folder of PDFs",
    version
)]
struct Cli {
    /// Folder containing the PDF files
    folder: PathBuf,

    /// JSON file with scan options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Channel difference above which a pixel counts as colored
    #[arg(long)]
    tolerance: Option<u8>,

    /// Rasterization resolution for color detection
    #[arg(long)]
    dpi: Option<f32>,

    /// Directory for the generated spreadsheet (defaults to ./output)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory containing the pdfium library
    #[arg(long)]
    pdfium_dir: Option<PathBuf>,

    /// Also print the result table as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn scan_options(&self) -> Result<ScanOptions> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => ScanOptions::default(),
        };
        if self.tolerance.is_some() {
            options.color_tolerance = self.tolerance;
        }
        if self.dpi.is_some() {
            options.render_dpi = self.dpi;
        }
        if self.output_dir.is_some() {
            options.output_dir = self.output_dir.clone();
        }
        if self.pdfium_dir.is_some() {
            options.pdfium_library_dir = self.pdfium_dir.clone();
        }
        Ok(options)
    }
}

fn load_options(path: &Path) -> Result<ScanOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let options = ScanOptions::from_json(&text)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(options)
}

#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    Stop,
    Exit,
}

/// The first Ctrl-C stops the scan between pages; any later one exits,
/// since a document read stuck inside the renderer never reaches the next
/// page check.
fn on_interrupt(count: usize, cancel: &CancelToken) -> Interrupt {
    if count > 1 {
        return Interrupt::Exit;
    }
    tracing::info!("stop requested");
    cancel.cancel();
    Interrupt::Stop
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "pdf_print_estimator=debug"
    } else {
        "pdf_print_estimator=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = cli.scan_options()?;
    let writer = XlsxReportWriter::new(options.output_dir()?);
    let library_dir = options.pdfium_library_dir.clone();
    let dpi = options.render_dpi();

    let scanner = DocumentScanner::new(&cli.folder, options);
    let handle = ScanHandle::spawn(
        scanner,
        move || PdfiumLoader::bind(library_dir.as_deref(), dpi),
        writer,
    );

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        let mut interrupts = 0;
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupts += 1;
            match on_interrupt(interrupts, &cancel) {
                Interrupt::Stop => {
                    eprintln!("stopping after the current page, press Ctrl-C again to quit")
                }
                Interrupt::Exit => {
                    eprintln!("interrupted");
                    std::process::exit(130);
                }
            }
        }
    });

    let outcome = tokio::task::spawn_blocking(move || {
        for event in handle.events() {
            println!("{}", event);
        }
        handle.join()
    })
    .await
    .context("scan worker panicked")?
    .with_context(|| format!("scan of {} failed", cli.folder.display()))?;

    match outcome {
        ScanOutcome::Completed {
            table,
            output,
            failures,
        } => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            }
            if !failures.is_empty() {
                eprintln!("{} file(s) could not be read", failures.len());
            }
            tracing::info!("done: {}", output.display());
        }
        ScanOutcome::Aborted { completed } => {
            tracing::info!("stopped after {} completed file(s)", completed.len());
        }
    }
    Ok(())
}
