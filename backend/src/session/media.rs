//! Inline image references
//!
//! Images travel through the data model as `data:<mime>;base64,<payload>`
//! strings. This module converts files into that form and splits it back
//! into the pieces the API wants.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

/// MIME type assumed when a data URL does not carry one
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// A decoded-enough view of a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// MIME type, e.g. "image/png"
    pub mime_type: String,
    /// Base64 payload without the header
    pub data: String,
}

impl DataUrl {
    /// Split a data URL. A bare base64 string is accepted as the payload.
    pub fn parse(reference: &str) -> Self {
        let (header, payload) = match reference.split_once(',') {
            Some((header, payload)) if !payload.is_empty() => (Some(header), payload),
            _ => (None, reference),
        };

        let mime_type = header
            .and_then(|h| h.split(';').next())
            .and_then(|h| h.strip_prefix("data:"))
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_MIME_TYPE);

        Self {
            mime_type: mime_type.to_string(),
            data: payload.to_string(),
        }
    }

    /// Encode raw bytes
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data: STANDARD.encode(bytes),
        }
    }

    /// Read an image file and encode it; the MIME type comes from the extension
    pub async fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(mime_for_path(path), &bytes))
    }

    /// Render back into `data:<mime>;base64,<payload>`
    pub fn to_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Whether an avatar/image reference is inline image data rather than an emoji or URL
pub fn is_inline_image(reference: &str) -> bool {
    reference.starts_with("data:image")
}

fn mime_for_path(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME_TYPE)
}
