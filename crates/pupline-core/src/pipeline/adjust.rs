//! Color correction: brightness, saturation, linear contrast, unsharp mask.

use image::{DynamicImage, RgbaImage};

use crate::config::ColorConfig;

/// Apply the configured color correction. Alpha is left untouched.
pub fn apply(image: &DynamicImage, color: &ColorConfig) -> RgbaImage {
    let mut rgba = image.to_rgba8();

    let brightness = color.brightness as f32;
    let saturation = color.saturation as f32;
    let contrast = color.contrast as f32;

    for px in rgba.pixels_mut() {
        let mut c = [px[0] as f32, px[1] as f32, px[2] as f32];

        for v in &mut c {
            *v *= brightness;
        }

        let luma = 0.2126 * c[0] + 0.7152 * c[1] + 0.0722 * c[2];
        for v in &mut c {
            *v = luma + (*v - luma) * saturation;
        }

        for (i, v) in c.iter().enumerate() {
            px[i] = (v * contrast).round().clamp(0.0, 255.0) as u8;
        }
    }

    if color.sharpen_sigma > 0.0 {
        image::imageops::unsharpen(&rgba, color.sharpen_sigma as f32, 0)
    } else {
        rgba
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn identity() -> ColorConfig {
        ColorConfig {
            brightness: 1.0,
            saturation: 1.0,
            contrast: 1.0,
            sharpen_sigma: 0.0,
        }
    }

    fn solid(px: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba(px)))
    }

    #[test]
    fn test_identity_is_noop() {
        let out = apply(&solid([10, 120, 240, 200]), &identity());
        assert_eq!(out.get_pixel(2, 2).0, [10, 120, 240, 200]);
    }

    #[test]
    fn test_brightness_and_contrast_multiply() {
        let config = ColorConfig {
            brightness: 1.5,
            contrast: 2.0,
            ..identity()
        };
        let out = apply(&solid([20, 20, 20, 255]), &config);
        assert_eq!(out.get_pixel(0, 0).0, [60, 60, 60, 255]);
    }

    #[test]
    fn test_values_clamp_at_white() {
        let config = ColorConfig {
            brightness: 3.0,
            ..identity()
        };
        let out = apply(&solid([200, 100, 50, 255]), &config);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 150, 255]);
    }

    #[test]
    fn test_saturation_keeps_gray_and_spreads_color() {
        let config = ColorConfig {
            saturation: 1.5,
            ..identity()
        };
        let gray = apply(&solid([90, 90, 90, 255]), &config);
        assert_eq!(gray.get_pixel(0, 0).0, [90, 90, 90, 255]);

        let colored = apply(&solid([150, 100, 100, 255]), &config);
        let [r, g, b, _] = colored.get_pixel(0, 0).0;
        assert!(r > 150);
        assert!(g < 100 && b < 100);
    }

    #[test]
    fn test_sharpen_keeps_dimensions() {
        let config = ColorConfig::default();
        let out = apply(&DynamicImage::new_rgb8(33, 17), &config);
        assert_eq!(out.dimensions(), (33, 17));
    }
}
