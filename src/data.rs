use anyhow::{Context, Result};
use std::path::Path;

use crate::session::SessionError;

pub const PNG_MIME: &str = "image/png";
pub const JPEG_MIME: &str = "image/jpeg";
pub const JSON_MIME: &str = "application/json";

/// Image bytes accepted for OCR.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub name: Option<String>,
}

pub fn load_image(path: &Path) -> Result<ImageAttachment> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read image file: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .map(|value| value.to_string());
    load_image_from_bytes(bytes, name.as_deref())
}

/// Rejects anything whose content is not a recognizable image.
pub fn load_image_from_bytes(bytes: Vec<u8>, name: Option<&str>) -> Result<ImageAttachment> {
    let Some(mime) = sniff_image_mime(&bytes) else {
        tracing::debug!(name = ?name, len = bytes.len(), "rejected non-image input");
        return Err(SessionError::UnsupportedInput.into());
    };
    Ok(ImageAttachment {
        bytes,
        mime: mime.to_string(),
        name: name.map(|value| value.to_string()),
    })
}

pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    let kind = infer::get(bytes)?;
    let detected = kind.mime_type();
    detected.starts_with("image/").then_some(detected)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn png_bytes_are_accepted() {
        let image = load_image_from_bytes(PNG_HEADER.to_vec(), Some("shot.png")).expect("png");
        assert_eq!(image.mime, PNG_MIME);
        assert_eq!(image.name.as_deref(), Some("shot.png"));
    }

    #[test]
    fn jpeg_is_sniffed() {
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10]), Some(JPEG_MIME));
    }

    #[test]
    fn text_is_rejected_as_unsupported() {
        let err = load_image_from_bytes(b"Welcome Home!".to_vec(), None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SessionError>(),
            Some(SessionError::UnsupportedInput)
        ));
        assert_eq!(err.to_string(), "Only image files (PNG, JPG, JPEG) are allowed.");
    }

    #[test]
    fn pdf_is_rejected() {
        assert_eq!(sniff_image_mime(b"%PDF-1.7\n"), None);
    }

    #[test]
    fn load_image_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ui.png");
        std::fs::write(&path, PNG_HEADER).expect("write");
        let image = load_image(&path).expect("load");
        assert_eq!(image.name.as_deref(), Some("ui.png"));
        assert!(load_image(&dir.path().join("missing.png")).is_err());
    }
}
