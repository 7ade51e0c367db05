use crate::error::Res;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::process::Command;
use tracing::debug;

/// Sends a rendered document to the host print flow.
#[async_trait::async_trait]
pub trait Printer: Send + Sync {
    async fn print(&self, document: &Path) -> Res<()>;
}

/// Prints by running `<program> <document>`, e.g. `lp preview.html`.
pub struct CommandPrinter {
    program: String,
}

impl CommandPrinter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait::async_trait]
impl Printer for CommandPrinter {
    async fn print(&self, document: &Path) -> Res<()> {
        debug!("Running {} {}", self.program, document.display());
        let status = Command::new(&self.program)
            .arg(document)
            .status()
            .await
            .with_context(|| format!("Unable to run the print command '{}'", self.program))?;
        if !status.success() {
            bail!("The print command '{}' exited with {status}", self.program)
        }
        Ok(())
    }
}

/// Remembers what it was asked to print.
#[derive(Default)]
pub struct TestPrinter {
    printed: Mutex<Vec<PathBuf>>,
}

impl TestPrinter {
    pub fn printed(&self) -> Vec<PathBuf> {
        self.printed.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Printer for TestPrinter {
    async fn print(&self, document: &Path) -> Res<()> {
        if let Ok(mut printed) = self.printed.lock() {
            printed.push(document.to_path_buf());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_print_command() {
        let printer = CommandPrinter::new("definitely-not-a-real-print-command-9a2e");
        let err = printer.print(Path::new("x.html")).await.unwrap_err();
        assert!(err.to_string().contains("Unable to run the print command"));
    }
}
