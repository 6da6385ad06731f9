//! Helpers for reading multipart form fields.

use axum::extract::multipart::Field;
use tracing::debug;

use crate::core::error::{AppError, Result};
use crate::features::reports::models::UploadedPhoto;
use crate::shared::constants::MAX_PHOTO_SIZE;

/// Image types accepted as evidence
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

pub fn is_image_type_allowed(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type.to_lowercase().as_str())
}

pub async fn read_text(field: Field<'_>) -> Result<String> {
    let name = field.name().unwrap_or("").to_string();
    field.text().await.map_err(|e| {
        debug!("Failed to read field {}: {}", name, e);
        AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
    })
}

/// Read a photo field, enforcing type and size limits
pub async fn read_photo(field: Field<'_>) -> Result<UploadedPhoto> {
    let content_type = field
        .content_type()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let file_name = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unnamed".to_string());

    if !is_image_type_allowed(&content_type) {
        return Err(AppError::Validation(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            content_type,
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    let data = field.bytes().await.map_err(|e| {
        debug!("Failed to read file bytes: {}", e);
        AppError::BadRequest(format!("Failed to read file data: {}", e))
    })?;

    if data.len() > MAX_PHOTO_SIZE {
        return Err(AppError::Validation(format!(
            "Photo '{}' is too large. Maximum size is {} MB",
            file_name,
            MAX_PHOTO_SIZE / 1024 / 1024
        )));
    }

    Ok(UploadedPhoto {
        file_name,
        content_type,
        data: data.to_vec(),
    })
}

/// Parse an optional numeric form value; blank means absent
pub fn parse_optional_id(raw: &str, field: &str) -> Result<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("Invalid {}: '{}'", field, raw)))
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "on" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_types() {
        assert!(is_image_type_allowed("image/jpeg"));
        assert!(is_image_type_allowed("IMAGE/PNG"));
        assert!(!is_image_type_allowed("application/pdf"));
    }

    #[test]
    fn test_parse_optional_id() {
        assert_eq!(parse_optional_id("", "category_id").unwrap(), None);
        assert_eq!(parse_optional_id(" 7 ", "category_id").unwrap(), Some(7));
        assert!(parse_optional_id("x", "category_id").is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
