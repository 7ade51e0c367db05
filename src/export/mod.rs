//! The boundary between the invoice preview and the programs that turn it into paper: a PDF
//! converter and the host print command.
//!
//! Both are traits so that the whole app can run, top-to-bottom, without either program
//! installed. See `Mode`.

mod converter;
mod print;
mod test_exporter;

use crate::error::{Error, ErrorType, IntoResult, Res, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use converter::ProcessExporter;
pub use print::{CommandPrinter, Printer, TestPrinter};
pub use test_exporter::TestExporter;

/// When this environment variable is set and non-empty, the in-memory exporter and printer are
/// used instead of external programs.
pub const TEST_MODE_VAR: &str = "INVOICE_IN_TEST_MODE";

/// Selects the real external programs or in-memory stand-ins.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    External,
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_VAR) {
            Ok(val) if !val.is_empty() => Mode::Test,
            _ => Mode::External,
        }
    }
}

/// A fully laid-out invoice, ready to be handed to a converter or a printer unchanged.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RenderedDocument {
    title: String,
    html: String,
}

impl RenderedDocument {
    pub fn new(title: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            html: html.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// The name converters expect on their command line.
    pub fn as_arg(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_arg(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

/// Page and raster settings passed to the converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PdfOptions {
    /// The converter program. It is invoked as
    /// `<converter> [page options] <input.html> <output.pdf>`.
    pub converter: String,
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub margin_mm: u32,
    /// JPEG quality for embedded images, between 0 and 1.
    pub image_quality: f64,
    /// Raster scale relative to 96 dpi.
    pub scale: u32,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            converter: "wkhtmltopdf".to_string(),
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            margin_mm: 0,
            image_quality: 0.98,
            scale: 2,
        }
    }
}

/// Converts rendered documents to PDF.
#[async_trait::async_trait]
pub trait Exporter: Send + Sync {
    /// Checks once, at startup, that the converter can be used at all.
    async fn probe(&self) -> Res<()>;

    /// Writes `document` as a PDF at `output`.
    async fn export(
        &self,
        document: &RenderedDocument,
        options: &PdfOptions,
        output: &Path,
    ) -> Res<()>;
}

/// Creates the exporter for `mode`.
pub fn exporter(mode: Mode, options: &PdfOptions) -> Arc<dyn Exporter> {
    match mode {
        Mode::External => Arc::new(ProcessExporter::new(&options.converter)),
        Mode::Test => Arc::new(TestExporter::default()),
    }
}

/// Creates the printer for `mode`.
pub fn printer(mode: Mode, print_command: &str) -> Arc<dyn Printer> {
    match mode {
        Mode::External => Arc::new(CommandPrinter::new(print_command)),
        Mode::Test => Arc::new(TestPrinter::default()),
    }
}

/// Whether the converter can be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterStatus {
    /// The one-time probe has not finished.
    Loading,
    Ready,
    /// The probe failed. This is permanent for the session.
    Unavailable(String),
}

/// Starts the one-time availability probe in the background. The returned receiver reports
/// `Loading` until the probe finishes. There is no retry and no timeout.
pub fn spawn_probe(exporter: Arc<dyn Exporter>) -> watch::Receiver<ExporterStatus> {
    let (tx, rx) = watch::channel(ExporterStatus::Loading);
    tokio::spawn(async move {
        let status = match exporter.probe().await {
            Ok(()) => {
                debug!("PDF converter is ready");
                ExporterStatus::Ready
            }
            Err(e) => {
                warn!("PDF export is disabled: {e:#}");
                ExporterStatus::Unavailable(format!("{e:#}"))
            }
        };
        // Nobody listening is fine; the session has ended.
        let _ = tx.send(status);
    });
    rx
}

/// Refuses the export unless the converter is `Ready`.
pub fn ensure_ready(status: &ExporterStatus) -> Result<()> {
    match status {
        ExporterStatus::Ready => Ok(()),
        ExporterStatus::Loading => Err(Error::msg(
            ErrorType::ExporterUnavailable,
            "The PDF converter is still loading, try again in a moment",
        )),
        ExporterStatus::Unavailable(reason) => Err(Error::msg(
            ErrorType::ExporterUnavailable,
            format!("PDF export is unavailable: {reason}"),
        )),
    }
}

/// Hands `document` to `exporter` unchanged and returns the path of the written PDF.
pub async fn export_to_pdf(
    exporter: &dyn Exporter,
    document: &RenderedDocument,
    options: &PdfOptions,
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf> {
    let output = output_dir.join(file_name);
    debug!("Exporting '{}' to {}", document.title(), output.display());
    exporter
        .export(document, options, &output)
        .await
        .pub_result(ErrorType::Export)?;
    info!("Saved {}", output.display());
    Ok(output)
}

/// Hands the document at `path` to the host print command unchanged.
pub async fn print_document(printer: &dyn Printer, path: &Path) -> Result<()> {
    printer.print(path).await.pub_result(ErrorType::Print)?;
    info!("Sent {} to the printer", path.display());
    Ok(())
}
