//! Sub-configuration structs with the stock listing-photo policy as defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{OutputFormat, SizeName};

/// One output size. Every preset is rendered in both WebP and JPEG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizePreset {
    pub name: SizeName,
    pub width: u32,
    pub height: u32,

    /// Overrides the codec quality for this size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,

    /// Format the web frontend prefers for this size (informational)
    #[serde(default = "default_preferred_format")]
    pub preferred_format: OutputFormat,
}

fn default_preferred_format() -> OutputFormat {
    OutputFormat::WebP
}

impl SizePreset {
    pub fn new(name: SizeName, width: u32, height: u32) -> Self {
        Self {
            name,
            width,
            height,
            quality: None,
            preferred_format: OutputFormat::WebP,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// The stock size set used by the listing pages.
pub fn default_sizes() -> Vec<SizePreset> {
    vec![
        SizePreset::new(SizeName::Thumbnail, 300, 300).with_quality(75),
        SizePreset::new(SizeName::Card, 600, 600).with_quality(80),
        SizePreset::new(SizeName::Hero, 1200, 900).with_quality(85),
    ]
}

/// Color correction applied to every derivative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Brightness multiplier (1.0 = unchanged)
    pub brightness: f64,

    /// Saturation multiplier (1.0 = unchanged)
    pub saturation: f64,

    /// Linear contrast gain applied as `gain * x`
    pub contrast: f64,

    /// Unsharp mask sigma (0 disables sharpening)
    pub sharpen_sigma: f64,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            brightness: 1.05,
            saturation: 1.1,
            contrast: 1.05,
            sharpen_sigma: 0.5,
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub webp: WebpConfig,
    pub jpeg: JpegConfig,
}

/// WebP encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebpConfig {
    /// Quality 0-100
    pub quality: u8,

    /// Compression effort 0 (fast) to 6 (slowest, smallest)
    pub effort: u8,

    /// Use near-lossless encoding with `quality` as the preprocessing level
    pub near_lossless: bool,
}

impl Default for WebpConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            effort: 6,
            near_lossless: false,
        }
    }
}

/// JPEG encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JpegConfig {
    /// Quality 1-100
    pub quality: u8,

    /// Emit a progressive JPEG
    pub progressive: bool,

    /// Compute optimized Huffman tables (smaller files, slower encode)
    pub optimize_coding: bool,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            quality: 85,
            progressive: true,
            optimize_coding: true,
        }
    }
}

/// How the crop window is chosen when the source aspect differs from the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStrategy {
    /// Keep the most salient region (edges, saturated color, skin tones)
    Attention,
    /// Keep the region with the most luminance detail
    Entropy,
    /// Keep the region selected by the anchor
    Centered,
}

/// Anchor for the centered strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropAnchor {
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

/// Crop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    pub strategy: CropStrategy,
    pub anchor: CropAnchor,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            strategy: CropStrategy::Attention,
            anchor: CropAnchor::Center,
        }
    }
}

/// Thresholds for the pre-flight quality analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub min_width: u32,
    pub min_height: u32,

    /// Files above twice this size get a warning
    pub max_file_size_bytes: u64,

    /// Laplacian score below which an image is flagged as blurry
    pub blur_variance_floor: f64,

    /// Mean brightness bounds on a 0-255 scale
    pub brightness_min: f64,
    pub brightness_max: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_width: 500,
            min_height: 500,
            max_file_size_bytes: 1024 * 1024,
            blur_variance_floor: 100.0,
            brightness_min: 40.0,
            brightness_max: 220.0,
        }
    }
}

/// Input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory with one subfolder per item
    pub input_root: PathBuf,

    /// Directory receiving `{slug}/` derivative folders
    pub output_root: PathBuf,

    /// URL prefix the output root is served under
    pub public_base_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_root: PathBuf::from("raw-images"),
            output_root: PathBuf::from("public/puppies"),
            public_base_url: "/puppies".to_string(),
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of items processed concurrently
    pub parallel_workers: usize,

    /// Per-image time budget (analysis + all derivatives)
    pub image_timeout_ms: u64,

    /// Maximum source dimension (width or height)
    pub max_image_dimension: u32,

    /// Source file extensions picked up by discovery
    pub supported_extensions: Vec<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            image_timeout_ms: 60_000,
            max_image_dimension: 12_000,
            supported_extensions: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

/// Object storage (Supabase Storage) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Upload derivatives after processing
    pub enabled: bool,

    /// Project URL, e.g. `https://xyz.supabase.co`
    pub endpoint: String,

    /// Service key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Bucket name
    pub bucket: String,

    /// `cache-control: max-age` sent with uploads
    pub cache_control_secs: u64,

    /// Per-request timeout
    pub timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "${SUPABASE_URL}".to_string(),
            api_key: "${SUPABASE_SERVICE_ROLE_KEY}".to_string(),
            bucket: "puppies".to_string(),
            cache_control_secs: 31_536_000,
            timeout_ms: 30_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
