//! Local image files embedded as self-contained `data:` references.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::debug;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Which input path supplied the draft's image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url,
    EmbeddedFile { filename: Option<String> },
}

impl ImageSource {
    pub fn for_reference(reference: &str) -> Self {
        if is_data_url(reference) {
            Self::EmbeddedFile { filename: None }
        } else {
            Self::Url
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub filename: String,
    pub mime_type: String,
    pub data_url: String,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to read image file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image file is empty")]
    Empty,
    #[error("image file is too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: usize },
}

pub fn is_data_url(reference: &str) -> bool {
    reference.trim_start().starts_with("data:")
}

pub fn mime_for_path(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
        .to_string()
}

pub fn encode_data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

pub async fn read_image_file(path: &Path, max_bytes: usize) -> Result<EmbeddedImage, ImageError> {
    let read_err = |source: std::io::Error| ImageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(read_err)?.len();
    if size > max_bytes as u64 {
        return Err(ImageError::TooLarge {
            size,
            max: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path).await.map_err(read_err)?;
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    let mime_type = mime_for_path(path);
    debug!(%filename, %mime_type, size = bytes.len(), "embedding local image");

    Ok(EmbeddedImage {
        data_url: encode_data_url(&bytes, &mime_type),
        filename,
        mime_type,
    })
}
