use base64::{Engine, engine::general_purpose::STANDARD};

use crate::errors::{AppError, AppResult};

pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Image reçue en multipart, ré-encodée en data URI (`data:image/png;base64,....`)
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDataUri {
    pub mime_type: String,
    pub size: usize,
    raw: String,
}

impl ImageDataUri {
    /// Fichier brut + type MIME annoncé par le client
    pub fn from_upload(content_type: Option<&str>, bytes: &[u8]) -> AppResult<Self> {
        let mime_type = content_type.unwrap_or("application/octet-stream").trim();

        if !mime_type.starts_with("image/") {
            return Err(AppError::Validation(format!("Unsupported image type: {}", mime_type)));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("Image is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation("Image is too large".to_string()));
        }

        Ok(Self {
            mime_type: mime_type.to_string(),
            size: bytes.len(),
            raw: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_upload_becomes_data_uri() {
        let image = ImageDataUri::from_upload(Some("image/png"), b"\x89PNG fake").unwrap();

        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.size, 9);
        assert_eq!(image.as_str(), format!("data:image/png;base64,{}", STANDARD.encode(b"\x89PNG fake")));
    }

    #[test]
    fn test_rejects_non_image_empty_and_oversized() {
        assert!(ImageDataUri::from_upload(Some("application/pdf"), b"%PDF").is_err());
        assert!(ImageDataUri::from_upload(None, b"bytes").is_err());
        assert!(ImageDataUri::from_upload(Some("image/png"), b"").is_err());

        let huge = vec![0u8; MAX_IMAGE_BYTES + 1];
        assert!(matches!(
            ImageDataUri::from_upload(Some("image/jpeg"), &huge),
            Err(AppError::Validation(_))
        ));
    }
}
