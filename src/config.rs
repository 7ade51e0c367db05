//! Configuration file handling.
//!
//! The configuration file is stored at `$INVOICE_HOME/config.json` and contains the static data
//! that appears on every invoice (issuer and bank details), the customer list, PDF page settings,
//! and the commands used for PDF conversion and printing.

use crate::error::{ErrorType, IntoResult, Res, Result};
use crate::export::PdfOptions;
use crate::model::Customers;
use crate::utils;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "invoice";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const OUTPUT: &str = "output";
const DEFAULT_PRINT_COMMAND: &str = "lp";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$INVOICE_HOME` and from there it loads `$INVOICE_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    output_dir: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the invoice home directory, the output directory and an initial `config.json`
    /// populated with the default customers and placeholder issuer and bank details.
    ///
    /// # Errors
    /// - Returns an error if `config.json` already exists, so a hand-edited config is never
    ///   overwritten.
    /// - Returns an error if any file operations fail.
    pub(crate) async fn create(dir: impl Into<PathBuf>) -> Res<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the invoice home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            )
        }

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let output_dir = root.join(OUTPUT);
        utils::make_dir(&output_dir).await?;

        Ok(Self {
            root,
            config_path,
            output_dir,
            config_file,
        })
    }

    /// This will
    /// - validate that `invoice_home` and the config file exist
    /// - load and validate the config file
    /// - create the output directory if needed
    ///
    /// # Errors
    /// Any failure is reported as `ErrorType::Config`.
    pub async fn load(invoice_home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_home(invoice_home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_home(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Invoice Home is missing, run 'invoice init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let output_dir = match &config_file.output_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(OUTPUT),
        };
        utils::make_dir(&output_dir).await?;

        Ok(Self {
            root,
            config_path,
            output_dir,
            config_file,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where the preview and exported PDFs are written.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The path of the live preview document.
    pub fn preview_path(&self) -> PathBuf {
        self.output_dir.join("preview.html")
    }

    pub fn issuer(&self) -> &Issuer {
        &self.config_file.issuer
    }

    pub fn bank(&self) -> &BankDetails {
        &self.config_file.bank
    }

    pub fn customers(&self) -> &Customers {
        &self.config_file.customers
    }

    pub fn pdf(&self) -> &PdfOptions {
        &self.config_file.pdf
    }

    /// The program handed the preview when printing. Defaults to `lp`.
    pub fn print_command(&self) -> &str {
        self.config_file
            .print_command
            .as_deref()
            .unwrap_or(DEFAULT_PRINT_COMMAND)
    }
}

/// Who the invoice is from.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Issuer {
    pub name: String,
    pub address_line_1: String,
    pub address_line_2: String,
}

/// Remittance details printed in the footer.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BankDetails {
    pub account_name: String,
    pub abn: String,
    pub bsb: String,
    pub account_number: String,
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration (customers abbreviated):
/// ```json
/// {
///   "app_name": "invoice",
///   "config_version": 1,
///   "issuer": { "name": "...", "address_line_1": "...", "address_line_2": "..." },
///   "bank": { "account_name": "...", "abn": "...", "bsb": "...", "account_number": "..." },
///   "customers": [ { "id": 1, "display_name": "...", "subject_line": "...", ... } ],
///   "pdf": { "converter": "wkhtmltopdf", "page_size": "a4", "orientation": "portrait",
///            "margin_mm": 0, "image_quality": 0.98, "scale": 2 },
///   "print_command": "lp"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "invoice"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    issuer: Issuer,

    bank: BankDetails,

    /// The customers that can be billed. The first one is selected when a session starts.
    customers: Customers,

    #[serde(default)]
    pdf: PdfOptions,

    /// Defaults to `lp` if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    print_command: Option<String>,

    /// Output directory, relative to the invoice home or absolute. Defaults to
    /// `$INVOICE_HOME/output`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            issuer: Issuer {
                name: "Your Name".to_string(),
                address_line_1: "Street Address".to_string(),
                address_line_2: "Suburb STATE 0000".to_string(),
            },
            bank: BankDetails {
                account_name: "Account Name".to_string(),
                abn: "00 000 000 000".to_string(),
                bsb: "000-000".to_string(),
                account_number: "0000 0000".to_string(),
            },
            customers: Customers::defaults(),
            pdf: PdfOptions::default(),
            print_command: None,
            output_dir: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it fails validation.
    async fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Res<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}
