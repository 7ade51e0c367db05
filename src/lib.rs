//! invoice-pad: a single-invoice editor for tax invoices.
//!
//! An `Invoice` holds the selected customer and the line items. Totals, GST and the subject line
//! are derived from them on read. A `Session` applies user actions to the invoice, keeps an HTML
//! preview current and hands it to an external PDF converter or print command on request.

pub mod args;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod model;
pub mod preview;
pub mod session;
mod utils;

#[cfg(test)]
mod test;

pub use config::{BankDetails, Config, Issuer};
pub use error::{Error, ErrorType, Result};
pub use export::Mode;
