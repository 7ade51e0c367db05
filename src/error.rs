//! Error types for the public API.
//!
//! Internally we use `anyhow` everywhere (`Res<T>`). At the public boundary the error is wrapped
//! together with an `ErrorType` so callers (the CLI and the session loop) can decide how to report
//! it without string matching.

use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies a public error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration file or the invoice home directory is missing or invalid.
    Config,
    /// A referenced entity (e.g. a customer id) does not exist.
    NotFound,
    /// The external PDF converter is still loading or failed to load.
    ExporterUnavailable,
    /// An export was requested while another one was in flight.
    ExportBusy,
    /// The PDF conversion itself failed.
    Export,
    /// The host print command failed.
    Print,
    /// A filesystem operation failed.
    Io,
    /// The user typed something we could not understand.
    Input,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// A public error: an `anyhow::Error` chain tagged with an `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub(crate) fn msg(error_type: ErrorType, message: impl Display) -> Self {
        Self::new(error_type, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain.
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal `Res<T>` into a public `Result<T>`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T> IntoResult<T> for Res<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_context_chain() {
        let res: Res<()> = Err(anyhow::anyhow!("disk on fire")).context("Unable to write preview");
        let err = res.pub_result(ErrorType::Io).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Io);
        let message = err.to_string();
        assert!(message.contains("Unable to write preview"));
        assert!(message.contains("disk on fire"));
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::NotFound.to_string(), "not_found");
        assert_eq!(ErrorType::ExporterUnavailable.to_string(), "exporter_unavailable");
    }
}
