//! Converts a selected image file into a payload the model accepts.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use verdant_model::ImagePayload;

/// Error type for [`encode_image`].
#[derive(Debug)]
pub enum ImageError {
    /// The file could not be read.
    Unreadable(io::Error),
    /// The file extension does not map to a supported image type.
    UnsupportedType(String),
}

impl Display for ImageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(err) => {
                write!(f, "failed to read the image file: {err}")
            }
            Self::UnsupportedType(ext) => {
                write!(f, "unsupported image type: {ext:?}")
            }
        }
    }
}

impl StdError for ImageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Unreadable(err) => Some(err),
            Self::UnsupportedType(_) => None,
        }
    }
}

/// Reads an image file and produces its base64 payload plus MIME type.
///
/// A file that itself contains a textual `data:` URL is recognized:
/// the prefix is stripped and only the payload bytes are retained.
/// No side effects beyond reading the file.
pub async fn encode_image(path: &Path) -> Result<ImagePayload, ImageError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(ImageError::Unreadable)?;

    if let Some(payload) = parse_data_url(&bytes) {
        debug!("image at {} was a data URL", path.display());
        return Ok(payload);
    }

    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let Some(mime_type) = mime_for_extension(&ext) else {
        return Err(ImageError::UnsupportedType(ext));
    };

    Ok(ImagePayload {
        data: STANDARD.encode(&bytes),
        mime_type: mime_type.to_owned(),
    })
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn parse_data_url(bytes: &[u8]) -> Option<ImagePayload> {
    let text = str::from_utf8(bytes).ok()?;
    let rest = text.strip_prefix("data:")?;
    let (mime_type, payload) = rest.split_once(";base64,")?;
    if !mime_type.starts_with("image/") {
        return None;
    }
    Some(ImagePayload {
        data: payload.trim_end().to_owned(),
        mime_type: mime_type.to_owned(),
    })
}
