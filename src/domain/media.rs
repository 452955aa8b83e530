//! Media asset references and upload validation rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard ceiling for a single uploaded image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Content types an entity image may declare.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

/// A stored binary's public reference plus the handle needed to delete it.
///
/// `deletion_handle` is populated only by backends that delete by an opaque
/// identifier (e.g. a cloud asset store). The local-disk backend deletes by
/// the path embedded in `url` and leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    #[serde(rename = "image_url")]
    pub url: String,
    #[serde(rename = "image_handle", skip_serializing_if = "Option::is_none")]
    pub deletion_handle: Option<String>,
}

impl MediaAsset {
    pub fn from_columns(url: Option<String>, handle: Option<String>) -> Option<Self> {
        url.filter(|u| !u.is_empty()).map(|url| Self {
            url,
            deletion_handle: handle,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadValidationError {
    #[error("unsupported image type `{content_type}`")]
    UnsupportedType { content_type: String },
    #[error("image exceeds the {max} byte limit ({actual} bytes)")]
    TooLarge { actual: usize, max: usize },
    #[error("uploaded image is empty")]
    Empty,
}

/// Check an inbound binary against the image allow-list and size ceiling.
pub fn validate_image(content_type: &str, size: usize) -> Result<(), UploadValidationError> {
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();

    if !ALLOWED_IMAGE_TYPES.contains(&normalized.as_str()) {
        return Err(UploadValidationError::UnsupportedType {
            content_type: content_type.to_string(),
        });
    }

    if size == 0 {
        return Err(UploadValidationError::Empty);
    }

    if size > MAX_IMAGE_BYTES {
        return Err(UploadValidationError::TooLarge {
            actual: size,
            max: MAX_IMAGE_BYTES,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_types_within_limit() {
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(validate_image("image/jpeg; charset=binary", 1024).is_ok());
        assert!(validate_image("IMAGE/WEBP", MAX_IMAGE_BYTES).is_ok());
    }

    #[test]
    fn rejects_non_image_types() {
        let err = validate_image("application/pdf", 10).expect_err("must reject");
        assert!(matches!(err, UploadValidationError::UnsupportedType { .. }));
    }

    #[test]
    fn rejects_oversized_and_empty_payloads() {
        assert_eq!(
            validate_image("image/png", MAX_IMAGE_BYTES + 1),
            Err(UploadValidationError::TooLarge {
                actual: MAX_IMAGE_BYTES + 1,
                max: MAX_IMAGE_BYTES,
            })
        );
        assert_eq!(
            validate_image("image/png", 0),
            Err(UploadValidationError::Empty)
        );
    }

    #[test]
    fn media_asset_from_columns_ignores_blank_urls() {
        assert!(MediaAsset::from_columns(None, None).is_none());
        assert!(MediaAsset::from_columns(Some(String::new()), None).is_none());
        let asset =
            MediaAsset::from_columns(Some("/uploads/a.png".into()), Some("h1".into())).unwrap();
        assert_eq!(asset.url, "/uploads/a.png");
        assert_eq!(asset.deletion_handle.as_deref(), Some("h1"));
    }
}
