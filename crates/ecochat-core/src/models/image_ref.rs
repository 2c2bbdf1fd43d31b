use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MIME: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum ImageRefError {
    #[error("Not a base64 data URI")]
    NotDataUri,

    #[error("Invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Locally resolvable handle to generated image bytes.
///
/// Stored as a `data:<mime>;base64,<payload>` URI so a persisted snapshot
/// stays self-contained and any front end can display it directly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap raw image bytes. When `content_type` is missing or not an image
    /// type, the media type is sniffed from the leading bytes.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
            .filter(|ct| ct.starts_with("image/"))
            .map(str::to_string)
            .unwrap_or_else(|| sniff_mime(bytes).to_string());

        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
    }

    pub fn as_uri(&self) -> &str {
        &self.0
    }

    pub fn mime_type(&self) -> &str {
        self.0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(mime, _)| mime)
            .unwrap_or(DEFAULT_MIME)
    }

    /// Decode the reference back into the original bytes.
    pub fn resolve(&self) -> Result<Vec<u8>, ImageRefError> {
        let payload = self
            .0
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, payload)| payload)
            .ok_or(ImageRefError::NotDataUri)?;

        Ok(STANDARD.decode(payload)?)
    }

    /// File extension matching the media type, for exports.
    pub fn extension(&self) -> &'static str {
        match self.mime_type() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => DEFAULT_MIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    #[test]
    fn test_resolves_to_original_bytes() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        let image = ImageRef::from_bytes(&bytes, Some("image/jpeg"));

        assert!(image.as_uri().starts_with("data:image/jpeg;base64,"));
        assert_eq!(image.resolve().unwrap(), bytes);
    }

    #[test]
    fn test_content_type_parameters_are_dropped() {
        let image = ImageRef::from_bytes(PNG_HEADER, Some("image/png; charset=binary"));
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!(image.extension(), "png");
    }

    #[test]
    fn test_sniffs_when_content_type_is_not_an_image() {
        let image = ImageRef::from_bytes(PNG_HEADER, Some("application/octet-stream"));
        assert_eq!(image.mime_type(), "image/png");

        let unknown = ImageRef::from_bytes(b"????", None);
        assert_eq!(unknown.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_resolve_rejects_foreign_uris() {
        let image: ImageRef = serde_json::from_str(r#""blob:http://localhost/1234""#).unwrap();
        assert!(matches!(image.resolve(), Err(ImageRefError::NotDataUri)));
    }
}
