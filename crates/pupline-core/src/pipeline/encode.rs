//! Derivative encoders: lossy WebP via libwebp, progressive JPEG via
//! `jpeg-encoder`.

use image::RgbaImage;

use crate::config::{CodecConfig, JpegConfig, WebpConfig};
use crate::types::OutputFormat;

/// Encode an RGBA buffer in the requested format.
///
/// `quality` is the effective quality for this derivative (size preset
/// override or codec default).
pub fn encode(
    image: &RgbaImage,
    format: OutputFormat,
    quality: u8,
    codec: &CodecConfig,
) -> Result<Vec<u8>, String> {
    match format {
        OutputFormat::WebP => encode_webp(image, quality, &codec.webp),
        OutputFormat::Jpeg => encode_jpeg(image, quality, &codec.jpeg),
    }
}

/// Effective quality for a format: the preset override wins over the codec.
pub fn effective_quality(preset_quality: Option<u8>, format: OutputFormat, codec: &CodecConfig) -> u8 {
    preset_quality.unwrap_or(match format {
        OutputFormat::WebP => codec.webp.quality,
        OutputFormat::Jpeg => codec.jpeg.quality,
    })
}

fn encode_webp(image: &RgbaImage, quality: u8, settings: &WebpConfig) -> Result<Vec<u8>, String> {
    let mut config =
        webp::WebPConfig::new().map_err(|_| "failed to initialize WebP config".to_string())?;
    config.quality = quality.min(100) as f32;
    config.method = settings.effort.min(6) as i32;
    if settings.near_lossless {
        config.lossless = 1;
        config.near_lossless = quality.min(100) as i32;
    }

    let encoder = webp::Encoder::from_rgba(image.as_raw(), image.width(), image.height());
    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| format!("WebP encoding failed: {e:?}"))?;
    Ok(memory.to_vec())
}

fn encode_jpeg(image: &RgbaImage, quality: u8, settings: &JpegConfig) -> Result<Vec<u8>, String> {
    let width = u16::try_from(image.width())
        .map_err(|_| format!("width {} exceeds the JPEG limit", image.width()))?;
    let height = u16::try_from(image.height())
        .map_err(|_| format!("height {} exceeds the JPEG limit", image.height()))?;

    let rgb = flatten_on_white(image);
    let mut buffer = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buffer, quality.clamp(1, 100));
    encoder.set_progressive(settings.progressive);
    encoder.set_optimized_huffman_tables(settings.optimize_coding);
    encoder
        .encode(&rgb, width, height, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| format!("JPEG encoding failed: {e}"))?;
    Ok(buffer)
}

/// JPEG has no alpha channel: composite onto white.
fn flatten_on_white(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() as usize * image.height() as usize * 3);
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        let alpha = a as u32;
        for c in [r, g, b] {
            let blended = (c as u32 * alpha + 255 * (255 - alpha) + 127) / 255;
            out.push(blended as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba};

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 5) as u8, 128, 255]))
    }

    #[test]
    fn test_webp_output_is_riff() {
        let bytes = encode(&gradient(64, 48), OutputFormat::WebP, 80, &CodecConfig::default()).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_webp_decodes_to_same_size() {
        let bytes = encode(&gradient(64, 48), OutputFormat::WebP, 80, &CodecConfig::default()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_near_lossless_webp_encodes() {
        let mut codec = CodecConfig::default();
        codec.webp.near_lossless = true;
        let bytes = encode(&gradient(32, 32), OutputFormat::WebP, 60, &codec).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_progressive_jpeg_decodes() {
        let bytes = encode(&gradient(64, 48), OutputFormat::Jpeg, 85, &CodecConfig::default()).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_baseline_jpeg_when_progressive_disabled() {
        let mut codec = CodecConfig::default();
        codec.jpeg.progressive = false;
        codec.jpeg.optimize_coding = false;
        let bytes = encode(&gradient(16, 16), OutputFormat::Jpeg, 90, &codec).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_flatten_transparent_to_white() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0]));
        assert_eq!(flatten_on_white(&img), vec![255, 255, 255]);
        let img = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        assert_eq!(flatten_on_white(&img), vec![10, 20, 30]);
    }

    #[test]
    fn test_effective_quality_prefers_preset() {
        let codec = CodecConfig::default();
        assert_eq!(effective_quality(Some(70), OutputFormat::Jpeg, &codec), 70);
        assert_eq!(effective_quality(None, OutputFormat::Jpeg, &codec), 85);
        assert_eq!(effective_quality(None, OutputFormat::WebP, &codec), 85);
    }
}
