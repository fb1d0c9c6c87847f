//! Source image decoding with content-based format detection.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::PipelineError;

/// Result of decoding a source image.
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Detected container format, if recognized
    pub format: Option<ImageFormat>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Source file size in bytes
    pub file_size: u64,
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<DecodedImage, PipelineError> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: format!("Cannot read file: {}", e),
    })?;
    decode_bytes(bytes, path)
}

/// Decode an in-memory buffer. The format is sniffed from the content, so a
/// PNG saved with a `.jpg` extension is still reported as PNG.
pub fn decode_bytes(bytes: Vec<u8>, path: &Path) -> Result<DecodedImage, PipelineError> {
    let file_size = bytes.len() as u64;
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;
    let format = reader.format();
    let image = reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let (width, height) = image.dimensions();
    Ok(DecodedImage {
        image,
        format,
        width,
        height,
        file_size,
    })
}

/// Reject sources whose dimensions exceed the configured limit.
pub fn check_dimensions(
    decoded: &DecodedImage,
    path: &Path,
    max_dim: u32,
) -> Result<(), PipelineError> {
    if decoded.width > max_dim || decoded.height > max_dim {
        return Err(PipelineError::ImageTooLarge {
            path: path.to_path_buf(),
            width: decoded.width,
            height: decoded.height,
            max_dim,
        });
    }
    Ok(())
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: Option<ImageFormat>) -> String {
    match format {
        Some(ImageFormat::Jpeg) => "jpeg".to_string(),
        Some(ImageFormat::Png) => "png".to_string(),
        Some(ImageFormat::WebP) => "webp".to_string(),
        Some(ImageFormat::Gif) => "gif".to_string(),
        Some(ImageFormat::Tiff) => "tiff".to_string(),
        Some(ImageFormat::Bmp) => "bmp".to_string(),
        Some(ImageFormat::Ico) => "ico".to_string(),
        Some(ImageFormat::Pnm) => "pnm".to_string(),
        Some(ImageFormat::Avif) => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}
