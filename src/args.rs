//! These structs provide the CLI interface for the invoice CLI.

use crate::model::CustomerId;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// invoice: build a tax invoice line by line and save it as a PDF.
///
/// Run `invoice init` once to create the invoice home directory, edit the issuer and bank details
/// in its config.json, then run `invoice session` to build an invoice. The session keeps an HTML
/// preview of the invoice up to date in the output directory while you type.
///
/// PDF export runs an external HTML-to-PDF converter (wkhtmltopdf by default) and printing runs
/// the host print command (lp by default). Both can be changed in config.json.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the invoice home directory and an initial config.json.
    ///
    /// The config is populated with the default customers and placeholder issuer and bank
    /// details. An existing config.json is never overwritten.
    Init,
    /// List the configured customers.
    Customers,
    /// Start an interactive invoice editing session.
    ///
    /// Each line you type is one action, e.g. `add`, `set 1 amount 143.48`, `customer 2`,
    /// `export`. Type `help` in the session for the full list.
    Session(SessionArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the invoice configuration and output are held. Defaults to ~/invoice
    #[arg(long, env = "INVOICE_HOME", default_value_t = default_invoice_home())]
    invoice_home: DisplayPath,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn invoice_home(&self) -> &DisplayPath {
        &self.invoice_home
    }
}

/// (Not shown): Args for the `invoice session` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SessionArgs {
    /// Bill the customer with this id instead of the first one in config.json.
    #[arg(long)]
    customer: Option<CustomerId>,

    /// Receipt files to seed the invoice with, one item per file. Only the names are used.
    files: Vec<PathBuf>,
}

impl SessionArgs {
    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

fn default_invoice_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("invoice"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --invoice-home or INVOICE_HOME instead of relying on the \
                default invoice home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("invoice")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
