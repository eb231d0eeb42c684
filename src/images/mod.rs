//! Product image processing.
//!
//! Every upload is turned into three derivatives sharing one UUID filename:
//!
//! | Kind | Bucket | Geometry | JPEG quality |
//! |---|---|---|---|
//! | thumbnail | `thumbnails/` | 200x200 center crop | 85 |
//! | main | `main/` | fit within 600x400 | 90 |
//! | original | `original/` | fit within 800x600 | 95 |
//!
//! [`ImagePipeline::process`] writes all three or none; [`ImagePipeline::delete`]
//! removes a stored set and ignores files that are already gone.

pub mod pipeline;
pub mod storage;
pub mod transform;

pub use pipeline::{ImagePipeline, Variant, VARIANTS};
pub use storage::{DerivativeKind, ImageStore};

/// Failure of the image pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The declared filename does not carry an accepted extension.
    #[error(
        "Invalid image format for '{}'. Supported formats: {}",
        .filename,
        supported_formats()
    )]
    UnsupportedFormat { filename: String },

    /// Decoding, transforming or writing failed.
    #[error("Error processing image: {0}")]
    Processing(String),
}

/// Accepted extensions for error messages, e.g. `JPG, JPEG, PNG`.
fn supported_formats() -> String {
    storefront_common::paths::image_extensions()
        .iter()
        .map(|ext| ext.to_uppercase())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        Self::Processing(e.to_string())
    }
}

impl From<std::io::Error> for ImageError {
    fn from(e: std::io::Error) -> Self {
        Self::Processing(e.to_string())
    }
}

impl From<ImageError> for storefront_common::Error {
    fn from(e: ImageError) -> Self {
        storefront_common::Error::invalid_input(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = ImageError::UnsupportedFormat {
            filename: "art.bmp".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid image format for 'art.bmp'. Supported formats: JPG, JPEG, PNG, GIF, WEBP"
        );
    }

    #[test]
    fn test_image_errors_are_client_errors() {
        let err: storefront_common::Error = ImageError::Processing("truncated".to_string()).into();
        assert_eq!(err.http_status(), 400);
        assert_eq!(err.to_string(), "Error processing image: truncated");
    }
}
