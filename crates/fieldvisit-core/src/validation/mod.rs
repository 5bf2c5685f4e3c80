//! Caller-side validation of picked photo files.
//!
//! The recorder trusts its input; the form layer uses these checks before building
//! an [`AttachmentSet`](crate::models::AttachmentSet).

use std::path::Path;

use crate::constants::ALLOWED_IMAGE_EXTENSIONS;

/// Validation errors for picked photo files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file: {0}")]
    EmptyFile(String),
}

impl From<ValidationError> for crate::AppError {
    fn from(err: ValidationError) -> Self {
        crate::AppError::InvalidInput(err.to_string())
    }
}

/// Check that a picked file looks like a JPEG or PNG photo by its extension.
pub fn validate_image_filename(filename: &str) -> Result<(), ValidationError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

    if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ValidationError::InvalidExtension {
            extension,
            allowed: ALLOWED_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        });
    }

    Ok(())
}

/// Reject zero-byte photos.
pub fn validate_image_size(filename: &str, size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::EmptyFile(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_jpeg_and_png_any_case() {
        assert!(validate_image_filename("fachada.JPG").is_ok());
        assert!(validate_image_filename("porta.jpeg").is_ok());
        assert!(validate_image_filename("digital.png").is_ok());
    }

    #[test]
    fn rejects_other_extensions() {
        assert!(matches!(
            validate_image_filename("scan.heic"),
            Err(ValidationError::InvalidExtension { .. })
        ));
        assert!(matches!(
            validate_image_filename("noextension"),
            Err(ValidationError::InvalidFilename(_))
        ));
    }

    #[test]
    fn rejects_empty_file() {
        assert!(validate_image_size("a.jpg", 0).is_err());
        assert!(validate_image_size("a.jpg", 10).is_ok());
    }
}
