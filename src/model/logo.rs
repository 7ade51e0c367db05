//! Letterhead logos.
//!
//! A logo is either a static asset assigned by the selected customer, or an image the user
//! uploaded, which is read into memory straight away. Both end up as a `LogoImage` that the
//! preview embeds as a `data:` URI.

use crate::error::Res;
use anyhow::Context;
use base64::engine::general_purpose;
use base64::Engine as _;
use std::path::{Path, PathBuf};

/// The logo currently attached to an invoice.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Logo {
    /// A customer's default letterhead. Relative paths are resolved against the invoice home.
    Asset(PathBuf),
    /// An image uploaded by the user.
    Upload(LogoImage),
}

impl Logo {
    /// Reads the image at `path` into memory as an uploaded logo.
    pub async fn upload(path: impl AsRef<Path>) -> Res<Self> {
        Ok(Self::Upload(LogoImage::read(path.as_ref()).await?))
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, Logo::Upload(_))
    }

    /// Produces the displayable image, reading asset files relative to `home`.
    pub async fn load(&self, home: &Path) -> Res<LogoImage> {
        match self {
            Logo::Asset(path) => LogoImage::read(&home.join(path)).await,
            Logo::Upload(image) => Ok(image.clone()),
        }
    }
}

/// An image held in memory, ready for embedding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LogoImage {
    name: String,
    mime_type: &'static str,
    data: Vec<u8>,
}

impl LogoImage {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            mime_type: mime_type(&name),
            name,
            data,
        }
    }

    async fn read(path: &Path) -> Res<Self> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Unable to read logo image {}", path.display()))?;
        anyhow::ensure!(!data.is_empty(), "The logo image {} is empty", path.display());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self::new(name, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        self.mime_type
    }

    /// The image as a `data:` URI.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.data)
        )
    }
}

fn mime_type(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".svg") {
        "image/svg+xml"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        "image/png"
    }
}
