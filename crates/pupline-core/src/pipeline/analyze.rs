//! Pre-flight quality analysis of source images.
//!
//! The analyzer never fails: anything it cannot read becomes a
//! `wrong_format` error in the report. Its verdict is advisory; callers
//! decide whether to gate processing on `passed`.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use std::path::Path;

use crate::config::QualityThresholds;
use crate::types::{ImageStats, IssueKind, QualityIssue, QualityReport};

use super::decode::{decode_file, format_to_string};

/// Longest edge the sharpness check works at.
const SHARPNESS_MAX_EDGE: u32 = 512;

/// Container formats accepted as sources.
const ACCEPTED_FORMATS: [&str; 3] = ["jpeg", "png", "webp"];

/// Scores source images against the configured thresholds.
pub struct QualityAnalyzer {
    thresholds: QualityThresholds,
}

impl QualityAnalyzer {
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    /// Analyze one source image.
    pub fn analyze(&self, path: &Path) -> QualityReport {
        let decoded = match decode_file(path) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!("Quality analysis could not decode {:?}: {}", path, e);
                return QualityReport::unreadable(path, &e.to_string());
            }
        };

        let stats = ImageStats {
            width: decoded.width,
            height: decoded.height,
            format: format_to_string(decoded.format),
            byte_size: decoded.file_size,
            brightness: Some(mean_brightness(&decoded.image)),
            sharpness: sharpness_score(&decoded.image),
        };
        let report = self.assess(path, stats);
        tracing::debug!(
            "Analyzed {:?}: passed={} issues={}",
            path,
            report.passed,
            report.issues.len()
        );
        report
    }

    /// Turn measurements into a report. Pure: all checks run independently
    /// and in a fixed order.
    pub fn assess(&self, path: &Path, stats: ImageStats) -> QualityReport {
        let t = &self.thresholds;
        let mut issues = Vec::new();

        if stats.width < t.min_width || stats.height < t.min_height {
            issues.push(QualityIssue::error(
                IssueKind::LowResolution,
                format!(
                    "Resolution {}x{} is below the minimum {}x{}",
                    stats.width, stats.height, t.min_width, t.min_height
                ),
            ));
        }

        if stats.byte_size > t.max_file_size_bytes.saturating_mul(2) {
            issues.push(QualityIssue::warning(
                IssueKind::LargeFile,
                format!(
                    "File is {:.0} KB, more than twice the {:.0} KB target",
                    stats.byte_size as f64 / 1024.0,
                    t.max_file_size_bytes as f64 / 1024.0
                ),
            ));
        }

        if let Some(brightness) = stats.brightness {
            if brightness < t.brightness_min {
                issues.push(QualityIssue::warning(
                    IssueKind::Underexposed,
                    format!(
                        "Image is too dark (brightness {:.0}, minimum {:.0})",
                        brightness, t.brightness_min
                    ),
                ));
            } else if brightness > t.brightness_max {
                issues.push(QualityIssue::warning(
                    IssueKind::Overexposed,
                    format!(
                        "Image is too bright (brightness {:.0}, maximum {:.0})",
                        brightness, t.brightness_max
                    ),
                ));
            }
        }

        match stats.sharpness {
            Some(score) if score < t.blur_variance_floor => {
                issues.push(QualityIssue::warning(
                    IssueKind::Blur,
                    format!(
                        "Image looks blurry (sharpness {:.1}, minimum {:.1})",
                        score, t.blur_variance_floor
                    ),
                ));
            }
            Some(_) => {}
            None => {
                issues.push(QualityIssue::info(
                    IssueKind::Blur,
                    "Sharpness could not be measured (image too small)",
                ));
            }
        }

        if !ACCEPTED_FORMATS.contains(&stats.format.as_str()) {
            issues.push(QualityIssue::error(
                IssueKind::WrongFormat,
                format!(
                    "Format '{}' is not accepted (use JPEG, PNG or WebP)",
                    stats.format
                ),
            ));
        }

        QualityReport::from_issues(path, issues, stats)
    }
}

/// Mean brightness on a 0-255 scale: the average of the red, green and blue
/// channel means, or the luma mean for grayscale sources. Alpha is ignored.
pub fn mean_brightness(image: &DynamicImage) -> f64 {
    let pixel_count = image.width() as u64 * image.height() as u64;
    if pixel_count == 0 {
        return 0.0;
    }

    if image.color().has_color() {
        let rgb = image.to_rgb8();
        let mut sums = [0u64; 3];
        for px in rgb.pixels() {
            sums[0] += px[0] as u64;
            sums[1] += px[1] as u64;
            sums[2] += px[2] as u64;
        }
        let channel_means: f64 = sums.iter().map(|s| *s as f64 / pixel_count as f64).sum();
        channel_means / 3.0
    } else {
        let luma = image.to_luma8();
        let sum: u64 = luma.pixels().map(|px| px[0] as u64).sum();
        sum as f64 / pixel_count as f64
    }
}

/// Sharpness of an image: grayscale, downscaled to fit 512x512 (never
/// upscaled), then scored with [`laplacian_variance`].
pub fn sharpness_score(image: &DynamicImage) -> Option<f64> {
    let gray = image.to_luma8();
    let (w, h) = gray.dimensions();
    if w > SHARPNESS_MAX_EDGE || h > SHARPNESS_MAX_EDGE {
        let (nw, nh) = fit_within(w, h, SHARPNESS_MAX_EDGE);
        let small = image::imageops::resize(&gray, nw, nh, FilterType::Lanczos3);
        laplacian_variance(&small)
    } else {
        laplacian_variance(&gray)
    }
}

/// Mean squared response of the 4-neighbour Laplacian
/// `|4c - (top + bottom + left + right)|` over interior pixels.
///
/// Returns `None` when there are no interior pixels (either side < 3).
pub fn laplacian_variance(gray: &GrayImage) -> Option<f64> {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return None;
    }

    let raw = gray.as_raw();
    let width = w as usize;
    let mut sum = 0.0f64;
    let mut count = 0u64;

    for y in 1..(h as usize - 1) {
        let row = y * width;
        for x in 1..(width - 1) {
            let i = row + x;
            let center = raw[i] as f64;
            let neighbours =
                raw[i - width] as f64 + raw[i + width] as f64 + raw[i - 1] as f64 + raw[i + 1] as f64;
            let l = (4.0 * center - neighbours).abs();
            sum += l * l;
            count += 1;
        }
    }

    Some(sum / count as f64)
}

/// Scale `(w, h)` down so both sides fit in `max_edge`, keeping aspect.
fn fit_within(w: u32, h: u32, max_edge: u32) -> (u32, u32) {
    let scale = (max_edge as f64 / w as f64).min(max_edge as f64 / h as f64);
    let nw = ((w as f64 * scale).round() as u32).clamp(1, max_edge);
    let nh = ((h as f64 * scale).round() as u32).clamp(1, max_edge);
    (nw, nh)
}
