//! Image attachments and their base64 encoding

use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

use crate::types::EncodedImage;

/// Why a single attachment could not be encoded
#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("attachment is empty")]
    Empty,
}

/// An image supplied by the caller, not yet encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Already-decoded image bytes
    Bytes { data: Vec<u8>, mime_type: String },
    /// Image file on disk, read at submission time
    File(PathBuf),
}

impl Attachment {
    /// JPEG bytes, the format the picker hands over
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self::Bytes {
            data,
            mime_type: "image/jpeg".to_string(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Read (if needed) and base64-encode this attachment
    pub async fn encode(&self) -> Result<EncodedImage, AttachmentError> {
        let (bytes, mime_type) = match self {
            Attachment::Bytes { data, mime_type } => (data.clone(), mime_type.clone()),
            Attachment::File(path) => {
                let data = tokio::fs::read(path)
                    .await
                    .map_err(|source| AttachmentError::Io {
                        path: path.clone(),
                        source,
                    })?;
                (data, mime_type_for(path).to_string())
            }
        };

        if bytes.is_empty() {
            return Err(AttachmentError::Empty);
        }

        Ok(EncodedImage::new(mime_type, STANDARD.encode(bytes)))
    }
}

/// Encode each attachment independently.
///
/// An attachment that fails to encode is logged and left out; the rest
/// still go through.
pub async fn encode_all(attachments: &[Attachment]) -> Vec<EncodedImage> {
    let mut encoded = Vec::with_capacity(attachments.len());
    for (index, attachment) in attachments.iter().enumerate() {
        match attachment.encode().await {
            Ok(image) => encoded.push(image),
            Err(e) => {
                tracing::warn!("Dropping attachment {}: {}", index, e);
            }
        }
    }
    encoded
}

fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
