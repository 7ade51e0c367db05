//! Implements the `Exporter` trait in memory for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a PDF converter installed.

use crate::error::Res;
use crate::export::{Exporter, PdfOptions, RenderedDocument};
use crate::utils;
use anyhow::bail;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// An `Exporter` that writes the HTML it is given to the output path instead of converting it,
/// and remembers what it exported.
#[derive(Default)]
pub struct TestExporter {
    unavailable: Option<String>,
    failure: Option<String>,
    /// When set, each export waits for a permit before finishing.
    gate: Option<Arc<Semaphore>>,
    exported: Mutex<Vec<PathBuf>>,
}

impl TestExporter {
    /// An exporter whose probe fails with `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// An exporter whose exports fail with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// An exporter whose exports block until a permit is added to the returned semaphore.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let exporter = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (exporter, gate)
    }

    /// The paths written so far, in order.
    pub fn exported(&self) -> Vec<PathBuf> {
        self.exported
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Exporter for TestExporter {
    async fn probe(&self) -> Res<()> {
        match &self.unavailable {
            Some(reason) => bail!("{reason}"),
            None => Ok(()),
        }
    }

    async fn export(
        &self,
        document: &RenderedDocument,
        _options: &PdfOptions,
        output: &Path,
    ) -> Res<()> {
        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }
        if let Some(reason) = &self.failure {
            bail!("{reason}");
        }
        utils::write(output, document.html()).await?;
        if let Ok(mut exported) = self.exported.lock() {
            exported.push(output.to_path_buf());
        }
        Ok(())
    }
}
