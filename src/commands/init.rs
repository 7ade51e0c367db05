use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the invoice home directory, its output directory and an initial `config.json` with
/// the default customers and placeholder issuer and bank details.
///
/// # Arguments
/// - `invoice_home` - The directory that will hold the configuration, e.g. `$HOME/invoice`
///
/// # Errors
/// - Returns an error if a `config.json` already exists there.
/// - Returns an error if any file operations fail.
pub async fn init(invoice_home: &Path) -> Result<Out<()>> {
    let config = Config::create(invoice_home)
        .await
        .context("Unable to create the invoice home directory and config")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Created {}. Edit the issuer and bank details there before sending invoices.",
        config.config_path().display()
    )
    .into())
}
