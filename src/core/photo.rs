//! Photo encoding - uploads are embedded in the inventory as `data:` URIs.
//!
//! Item photos and background images travel inside the stored JSON and the
//! sync code, so binary uploads are converted to base64 `data:` URIs before
//! they are attached to anything.

use crate::errors::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// A binary upload waiting to be embedded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    /// Original file name, used to guess the type
    pub filename: String,
    /// Content type declared by the uploader, if any
    pub content_type: Option<String>,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Encodes the upload as a `data:` URI
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        to_data_uri(
            &self.bytes,
            &mime_for(&self.filename, self.content_type.as_deref()),
        )
    }
}

/// Picks the MIME type of an upload: the declared type when present,
/// otherwise a guess from the file extension.
#[must_use]
pub fn mime_for(filename: &str, declared: Option<&str>) -> String {
    declared
        .map(|ct| ct.split(';').next().unwrap_or_default().trim())
        .filter(|ct| !ct.is_empty())
        .map_or_else(
            || {
                mime_guess::from_path(filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            },
            str::to_string,
        )
}

/// `data:<mime>;base64,<payload>`
#[must_use]
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Splits a base64 `data:` URI back into its MIME type and bytes.
///
/// # Errors
/// Returns [`Error::Photo`] if the text is not a base64 `data:` URI.
pub fn from_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri.strip_prefix("data:").ok_or_else(|| Error::Photo {
        message: "not a data: URI".to_string(),
    })?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| Error::Photo {
        message: "data: URI has no payload".to_string(),
    })?;
    let mime = header.strip_suffix(";base64").ok_or_else(|| Error::Photo {
        message: "data: URI is not base64 encoded".to_string(),
    })?;

    let bytes = STANDARD.decode(payload).map_err(|e| Error::Photo {
        message: format!("data: URI payload is not base64: {e}"),
    })?;
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    Ok((mime.to_string(), bytes))
}

/// File extension to use when sending a stored photo back as an attachment
#[must_use]
pub fn extension_for(mime: &str) -> &'static str {
    mime_guess::get_mime_extensions_str(mime)
        .and_then(|extensions| extensions.first().copied())
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_data_uri_round_trip() {
        let bytes = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 255];
        let uri = to_data_uri(&bytes, "image/png");

        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(from_data_uri(&uri).unwrap(), ("image/png".to_string(), bytes));
    }

    #[test]
    fn test_mime_prefers_declared_type() {
        assert_eq!(mime_for("cow.bin", Some("image/webp")), "image/webp");
        assert_eq!(
            mime_for("cow.jpg", Some("image/jpeg; charset=binary")),
            "image/jpeg"
        );
        assert_eq!(mime_for("cow.png", None), "image/png");
        assert_eq!(mime_for("cow", Some("")), "application/octet-stream");
    }

    #[test]
    fn test_upload_to_data_uri() {
        let upload = PhotoUpload {
            filename: "vaca.jpeg".to_string(),
            content_type: None,
            bytes: b"abc".to_vec(),
        };
        assert_eq!(upload.to_data_uri(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_from_data_uri_rejects_other_text() {
        assert!(from_data_uri("https://example.com/cow.jpg").is_err());
        assert!(from_data_uri("data:image/png,plain").is_err());
        assert!(from_data_uri("data:image/png;base64").is_err());
    }

    #[test]
    fn test_extension_for_known_and_unknown_types() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("application/x-made-up"), "bin");
    }
}
