use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{format_currency, CustomerId};
use crate::session::{Action, Reply, Session};
use crate::{Config, Mode, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

/// What a finished session leaves behind.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub reference: String,
    pub items: usize,
    pub total: String,
    pub preview: PathBuf,
    pub exported: Vec<PathBuf>,
}

/// Runs an interactive editing session on stdin and stdout until `quit` or end of input.
///
/// # Arguments
/// - `customer` - Bill this customer instead of the first configured one.
/// - `files` - Seed the invoice with one receipt item per file name.
pub async fn session(
    config: Config,
    mode: Mode,
    customer: Option<CustomerId>,
    files: Vec<PathBuf>,
) -> Result<Out<SessionReport>> {
    let mut session = Session::new(config, mode);
    if let Some(id) = customer {
        session.apply(Action::Customer(id)).await?;
    }
    if !files.is_empty() {
        session.apply(Action::Files(files)).await?;
    }

    let mut stdout = tokio::io::stdout();
    run_session(&mut session, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    let report = report(&session);
    Ok(Out::new(
        format!(
            "Invoice {} has {} item(s) totalling {}",
            report.reference, report.items, report.total
        ),
        report,
    ))
}

/// Reads one action per line from `input` and writes replies to `output`. Export completions
/// are reported as soon as they happen, between lines. When the input ends, any in-flight export
/// is waited for.
pub async fn run_session<R, W>(session: &mut Session, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    session.refresh().await?;
    emit(
        output,
        &format!(
            "Preview: {}\n{}Type 'help' for a list of commands.",
            session.config().preview_path().display(),
            crate::preview::render_summary(session.invoice())
        ),
    )
    .await?;

    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line
                    .context("Unable to read the next command")
                    .pub_result(ErrorType::Io)?;
                let Some(line) = line else {
                    debug!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match line.parse::<Action>() {
                    Ok(action) => session.apply(action).await,
                    Err(e) => Err(e),
                };
                match reply {
                    Ok(Reply::Continue(message)) => emit(output, &message).await?,
                    Ok(Reply::Quit) => break,
                    Err(e) => {
                        warn!("{e}");
                        emit(output, &format!("Error: {e}")).await?
                    }
                }
            }
            Some(result) = session.wait_export(), if session.is_exporting() => {
                emit(output, &export_message(result)).await?
            }
        }
    }

    if session.is_exporting() {
        emit(output, "Waiting for the export to finish").await?;
        if let Some(result) = session.wait_export().await {
            emit(output, &export_message(result)).await?;
        }
    }
    Ok(())
}

fn export_message(result: Result<PathBuf>) -> String {
    match result {
        Ok(path) => format!("Saved {}", path.display()),
        Err(e) => format!("Export failed: {e}"),
    }
}

async fn emit<W>(output: &mut W, message: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        output.write_all(message.trim_end().as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    };
    write
        .await
        .context("Unable to write to the terminal")
        .pub_result(ErrorType::Io)
}

fn report(session: &Session) -> SessionReport {
    let invoice = session.invoice();
    SessionReport {
        reference: invoice.reference().to_string(),
        items: invoice.items().len(),
        total: format_currency(invoice.totals().gross),
        preview: session.config().preview_path(),
        exported: session.exported().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{TestExporter, TestPrinter};
    use crate::test::TestEnv;
    use std::sync::Arc;

    async fn run(env: &TestEnv, exporter: TestExporter, script: &str) -> (Session, String) {
        let mut session = Session::with_boundary(
            env.config(),
            Arc::new(exporter),
            Arc::new(TestPrinter::default()),
        );
        session.wait_for_probe().await;
        let mut output = Vec::new();
        run_session(&mut session, script.as_bytes(), &mut output)
            .await
            .unwrap();
        (session, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_scripted_session() {
        let env = TestEnv::new().await;
        let script = "add\nset 1 amount 143.48\n\nbogus\ncustomer 9\nexport\nquit\nadd\n";
        let (session, output) = run(&env, TestExporter::default(), script).await;

        assert!(output.contains("Preview: "));
        assert!(output.contains("Total $143.48  (GST $13.04, net $130.44)"));
        assert!(output.contains("Error: Unknown command 'bogus'"));
        assert!(output.contains("Error: No customer with id 9"));
        assert!(output.contains("Exporting the invoice to PDF"));
        assert!(output.contains("Saved "));
        // Nothing after quit is applied.
        assert_eq!(session.invoice().items().len(), 1);
        assert_eq!(session.exported().len(), 1);

        let report = report(&session);
        assert_eq!(report.items, 1);
        assert_eq!(report.total, "$143.48");
    }

    #[tokio::test]
    async fn test_end_of_input_waits_for_export() {
        let env = TestEnv::new().await;
        let script = "files a.pdf b.pdf\nexport";
        let (session, output) = run(&env, TestExporter::default(), script).await;
        assert!(output.contains("Added 2 receipt item(s)"));
        assert!(output.contains("Saved "));
        assert!(!session.is_exporting());
        assert_eq!(session.exported().len(), 1);
    }

    #[tokio::test]
    async fn test_export_refused_notice() {
        let env = TestEnv::new().await;
        let exporter = TestExporter::unavailable("not installed");
        let (session, output) = run(&env, exporter, "export\n").await;
        assert!(output.contains("Error: PDF export is unavailable: not installed"));
        assert!(session.exported().is_empty());
    }

    #[tokio::test]
    async fn test_export_failure_is_reported() {
        let env = TestEnv::new().await;
        let (session, output) = run(&env, TestExporter::failing("boom"), "export\n").await;
        assert!(output.contains("Export failed: boom"));
        assert!(!session.is_exporting());
    }
}
