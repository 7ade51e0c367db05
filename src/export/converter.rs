//! Implements the `Exporter` trait by running an external HTML-to-PDF converter.

use crate::error::Res;
use crate::export::{Exporter, PdfOptions, RenderedDocument};
use crate::utils;
use anyhow::{bail, Context};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// The dpi a scale of 1 corresponds to.
const BASE_DPI: u32 = 96;

/// Runs `<program> [options] <input.html> <output.pdf>`. The command line follows `wkhtmltopdf`.
pub struct ProcessExporter {
    program: String,
}

impl ProcessExporter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(options: &PdfOptions, input: &Path, output: &Path) -> Vec<String> {
        let margin = format!("{}mm", options.margin_mm);
        let quality = (options.image_quality.clamp(0.0, 1.0) * 100.0).round() as u32;
        let mut args = vec![
            "--quiet".to_string(),
            "--page-size".to_string(),
            options.page_size.as_arg().to_string(),
            "--orientation".to_string(),
            options.orientation.as_arg().to_string(),
        ];
        for side in ["--margin-top", "--margin-right", "--margin-bottom", "--margin-left"] {
            args.push(side.to_string());
            args.push(margin.clone());
        }
        args.extend([
            "--image-quality".to_string(),
            quality.to_string(),
            "--dpi".to_string(),
            (BASE_DPI * options.scale.max(1)).to_string(),
            input.to_string_lossy().to_string(),
            output.to_string_lossy().to_string(),
        ]);
        args
    }
}

#[async_trait::async_trait]
impl Exporter for ProcessExporter {
    async fn probe(&self) -> Res<()> {
        trace!("Probing {} --version", self.program);
        let out = Command::new(&self.program)
            .arg("--version")
            .output()
            .await
            .with_context(|| format!("Unable to run the PDF converter '{}'", self.program))?;
        if !out.status.success() {
            bail!(
                "The PDF converter '{}' exited with {}",
                self.program,
                out.status
            )
        }
        debug!(
            "Found PDF converter: {}",
            String::from_utf8_lossy(&out.stdout).trim()
        );
        Ok(())
    }

    async fn export(
        &self,
        document: &RenderedDocument,
        options: &PdfOptions,
        output: &Path,
    ) -> Res<()> {
        let input = std::env::temp_dir().join(format!("invoice-{}.html", Uuid::new_v4()));
        utils::write(&input, document.html()).await?;

        let args = Self::args(options, &input, output);
        debug!("Running {} {}", self.program, args.join(" "));
        let result = Command::new(&self.program).args(&args).output().await;

        if let Err(e) = utils::remove(&input).await {
            warn!("{e:#}");
        }

        let out = result.with_context(|| format!("Unable to run '{}'", self.program))?;
        if !out.status.success() {
            bail!(
                "'{}' failed with {}: {}",
                self.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_args_follow_options() {
        let args = ProcessExporter::args(
            &PdfOptions::default(),
            &PathBuf::from("in.html"),
            &PathBuf::from("out.pdf"),
        );
        let joined = args.join(" ");
        assert!(joined.contains("--page-size A4"));
        assert!(joined.contains("--orientation Portrait"));
        assert!(joined.contains("--margin-left 0mm"));
        assert!(joined.contains("--image-quality 98"));
        assert!(joined.contains("--dpi 192"));
        assert!(joined.ends_with("in.html out.pdf"));
    }

    #[tokio::test]
    async fn test_probe_missing_program() {
        let exporter = ProcessExporter::new("definitely-not-a-real-pdf-converter-4f1c");
        let err = exporter.probe().await.unwrap_err();
        assert!(err.to_string().contains("Unable to run the PDF converter"));
    }

    #[tokio::test]
    async fn test_export_missing_program_cleans_up() {
        let dir = tempfile::TempDir::new().unwrap();
        let exporter = ProcessExporter::new("definitely-not-a-real-pdf-converter-4f1c");
        let document = RenderedDocument::new("Invoice", "<html></html>");
        let output = dir.path().join("out.pdf");
        let result = exporter
            .export(&document, &PdfOptions::default(), &output)
            .await;
        assert!(result.is_err());
        assert!(!output.exists());
    }
}
