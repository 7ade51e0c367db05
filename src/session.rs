//! The editing session: owns the invoice, applies one user action at a time, keeps the preview
//! file current and runs exports in the background.

use crate::config::Config;
use crate::error::{Error, ErrorType, IntoResult, Result};
use crate::export::{self, Exporter, ExporterStatus, Mode, Printer, RenderedDocument};
use crate::model::{CustomerId, Invoice, ItemField, ItemId, Logo};
use crate::preview::{self, Letterhead};
use crate::utils;
use chrono::{Local, Utc};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

pub const HELP: &str = "\
Commands:
  add                          add an item with the customer's default description
  remove <item>                remove an item
  set <item> <field> <value>   set description, date, reference or amount
  files <path>...              add one receipt item per file name
  customer <id>                select a customer
  customers                    list customers
  logo <path>                  use an image file as the logo
  logo clear                   remove the logo
  show                         show the invoice
  export                       save the invoice as a PDF
  print                        send the preview to the printer
  help                         show this help
  quit                         end the session";

/// One user action, parsed from a line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add,
    Remove(ItemId),
    Set {
        id: ItemId,
        field: ItemField,
        value: String,
    },
    Files(Vec<PathBuf>),
    Customer(CustomerId),
    Customers,
    Logo(PathBuf),
    ClearLogo,
    Show,
    Export,
    Print,
    Help,
    Quit,
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(ix) => (&s[..ix], s[ix..].trim_start()),
        None => (s, ""),
    }
}

fn input_error(message: impl std::fmt::Display) -> Error {
    Error::msg(ErrorType::Input, message)
}

fn parse_item_id(s: &str) -> Result<ItemId> {
    ItemId::from_str(s).map_err(|_| input_error(format!("'{s}' is not an item number")))
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let (command, rest) = split_word(line.trim());
        let action = match command {
            "add" => Action::Add,
            "remove" | "rm" => Action::Remove(parse_item_id(rest)?),
            "set" => {
                let (id, rest) = split_word(rest);
                let (field, value) = split_word(rest);
                if field.is_empty() {
                    return Err(input_error("Usage: set <item> <field> <value>"));
                }
                let field = ItemField::from_str(field).map_err(|_| {
                    input_error(format!(
                        "Unknown field '{field}', expected description, date, reference or amount"
                    ))
                })?;
                Action::Set {
                    id: parse_item_id(id)?,
                    field,
                    value: value.to_string(),
                }
            }
            "files" => {
                let files: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if files.is_empty() {
                    return Err(input_error("Usage: files <path>..."));
                }
                Action::Files(files)
            }
            "customer" => Action::Customer(
                CustomerId::from_str(rest)
                    .map_err(|_| input_error(format!("'{rest}' is not a customer id")))?,
            ),
            "customers" => Action::Customers,
            "logo" => match rest {
                "" => return Err(input_error("Usage: logo <path> | logo clear")),
                "clear" => Action::ClearLogo,
                path => Action::Logo(PathBuf::from(path)),
            },
            "show" => Action::Show,
            "export" => Action::Export,
            "print" => Action::Print,
            "help" | "?" => Action::Help,
            "quit" | "exit" => Action::Quit,
            other => {
                return Err(input_error(format!(
                    "Unknown command '{other}', type 'help' for a list of commands"
                )))
            }
        };
        Ok(action)
    }
}

/// What the session loop should do after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Show the message and keep going.
    Continue(String),
    Quit,
}

pub struct Session {
    config: Config,
    invoice: Invoice,
    exporter: Arc<dyn Exporter>,
    printer: Arc<dyn Printer>,
    status: watch::Receiver<ExporterStatus>,
    export: Option<JoinHandle<Result<PathBuf>>>,
    exported: Vec<PathBuf>,
}

impl Session {
    /// Starts a session with the exporter and printer selected by `mode`. Must be called from
    /// within a tokio runtime because the converter probe is spawned immediately.
    pub fn new(config: Config, mode: Mode) -> Self {
        let exporter = export::exporter(mode, config.pdf());
        let printer = export::printer(mode, config.print_command());
        Self::with_boundary(config, exporter, printer)
    }

    pub fn with_boundary(
        config: Config,
        exporter: Arc<dyn Exporter>,
        printer: Arc<dyn Printer>,
    ) -> Self {
        let status = export::spawn_probe(exporter.clone());
        let invoice = Invoice::new(config.customers().clone(), Local::now());
        debug!("Started invoice {}", invoice.reference());
        Self {
            config,
            invoice,
            exporter,
            printer,
            status,
            export: None,
            exported: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    pub fn exporter_status(&self) -> ExporterStatus {
        self.status.borrow().clone()
    }

    /// Waits for the one-time converter probe to finish.
    pub async fn wait_for_probe(&mut self) -> ExporterStatus {
        let finished = self
            .status
            .wait_for(|s| *s != ExporterStatus::Loading)
            .await
            .map(|status| status.clone());
        // An error means the probe task is gone, so whatever it last published is final.
        finished.unwrap_or_else(|_| self.exporter_status())
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    /// The PDFs successfully written during this session.
    pub fn exported(&self) -> &[PathBuf] {
        &self.exported
    }

    /// Applies one action. Errors are meant to be reported; none of them end the session.
    pub async fn apply(&mut self, action: Action) -> Result<Reply> {
        trace!("apply {action:?}");
        let message = match action {
            Action::Add => {
                let id = self.invoice.add_item();
                self.changed(format!("Added item {id}")).await?
            }
            Action::Remove(id) => {
                if !self.invoice.remove_item(id) {
                    return Ok(Reply::Continue(unchanged(id)));
                }
                self.changed(format!("Removed item {id}")).await?
            }
            Action::Set { id, field, value } => {
                if !self.invoice.update_item(id, field, value) {
                    return Ok(Reply::Continue(unchanged(id)));
                }
                self.changed(format!("Updated item {id}")).await?
            }
            Action::Files(files) => {
                let ids = self.invoice.bulk_add_from_files(&files);
                self.changed(format!("Added {} receipt item(s)", ids.len()))
                    .await?
            }
            Action::Customer(id) => {
                let name = self.invoice.select_customer(id)?.display_name().to_string();
                self.changed(format!("Billing {name}")).await?
            }
            Action::Customers => self.customer_list(),
            Action::Logo(path) => {
                let logo = Logo::upload(&path).await.pub_result(ErrorType::Io)?;
                self.invoice.set_logo(logo);
                self.changed(format!("Using {} as the logo", path.display()))
                    .await?
            }
            Action::ClearLogo => {
                self.invoice.clear_logo();
                self.changed("Removed the logo".to_string()).await?
            }
            Action::Show => preview::render_summary(&self.invoice),
            Action::Export => self.start_export().await?,
            Action::Print => {
                self.refresh().await?;
                let path = self.config.preview_path();
                export::print_document(self.printer.as_ref(), &path).await?;
                format!("Sent {} to the printer", path.display())
            }
            Action::Help => HELP.to_string(),
            Action::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Continue(message))
    }

    /// Renders the invoice and rewrites the preview file.
    pub async fn refresh(&self) -> Result<RenderedDocument> {
        let document = self.render().await;
        let path = self.config.preview_path();
        utils::write(&path, document.html())
            .await
            .pub_result(ErrorType::Io)?;
        trace!("Rewrote {}", path.display());
        Ok(document)
    }

    /// Waits for the in-flight export, if any, and returns its outcome. Either way the export
    /// gate is idle afterwards. Dropping the returned future leaves the export running.
    pub async fn wait_export(&mut self) -> Option<Result<PathBuf>> {
        let handle = self.export.as_mut()?;
        let joined = handle.await;
        self.export = None;
        let result = match joined {
            Ok(result) => result,
            Err(e) => Err(Error::msg(
                ErrorType::Export,
                format!("The export task failed: {e}"),
            )),
        };
        match &result {
            Ok(path) => self.exported.push(path.clone()),
            Err(e) => warn!("Export failed: {e}"),
        }
        Some(result)
    }

    async fn render(&self) -> RenderedDocument {
        let logo = match self.invoice.logo() {
            Some(logo) => match logo.load(self.config.root()).await {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("The logo is left off the invoice: {e:#}");
                    None
                }
            },
            None => None,
        };
        let letterhead = Letterhead {
            issuer: self.config.issuer(),
            bank: self.config.bank(),
            logo: logo.as_ref(),
        };
        preview::render_html(&self.invoice, letterhead)
    }

    async fn changed(&self, message: String) -> Result<String> {
        self.refresh().await?;
        Ok(format!(
            "{message}\n{}",
            preview::render_summary(&self.invoice)
        ))
    }

    async fn start_export(&mut self) -> Result<String> {
        if self.is_exporting() {
            return Err(Error::msg(
                ErrorType::ExportBusy,
                "An export is already in progress",
            ));
        }
        export::ensure_ready(&self.status.borrow())?;

        let document = self.refresh().await?;
        let file_name = self.invoice.pdf_file_name(Utc::now());
        let exporter = self.exporter.clone();
        let options = self.config.pdf().clone();
        let output_dir = self.config.output_dir().to_path_buf();
        info!("Exporting {file_name}");
        self.export = Some(tokio::spawn(async move {
            export::export_to_pdf(
                exporter.as_ref(),
                &document,
                &options,
                &output_dir,
                &file_name,
            )
            .await
        }));
        Ok("Exporting the invoice to PDF".to_string())
    }

    fn customer_list(&self) -> String {
        let selected = self.invoice.customer().id();
        self.invoice
            .customers()
            .iter()
            .map(|c| {
                format!(
                    "{} {}: {}{}",
                    if c.id() == selected { "*" } else { " " },
                    c.id(),
                    c.display_name(),
                    if c.gst_exempt() { " (no GST)" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn unchanged(id: ItemId) -> String {
    format!("No item {id}, nothing changed")
}
