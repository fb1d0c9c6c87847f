//! Configuration validation with range checks.

use std::collections::HashSet;

use crate::error::ConfigError;

use super::Policy;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

impl Policy {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizes.is_empty() {
            return Err(invalid("sizes must contain at least one preset"));
        }
        let mut seen = HashSet::new();
        for preset in &self.sizes {
            if !seen.insert(preset.name) {
                return Err(invalid(format!("sizes: duplicate preset '{}'", preset.name)));
            }
            if preset.width == 0 || preset.height == 0 {
                return Err(invalid(format!(
                    "sizes.{}: width and height must be > 0",
                    preset.name
                )));
            }
            if let Some(q) = preset.quality {
                if q == 0 || q > 100 {
                    return Err(invalid(format!(
                        "sizes.{}: quality must be between 1 and 100",
                        preset.name
                    )));
                }
            }
        }

        let color = &self.color;
        for (name, value) in [
            ("color.brightness", color.brightness),
            ("color.saturation", color.saturation),
            ("color.contrast", color.contrast),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be a positive number")));
            }
        }
        if !color.sharpen_sigma.is_finite() || color.sharpen_sigma < 0.0 {
            return Err(invalid("color.sharpen_sigma must be >= 0"));
        }

        if self.codec.webp.quality > 100 {
            return Err(invalid("codec.webp.quality must be between 0 and 100"));
        }
        if self.codec.webp.effort > 6 {
            return Err(invalid("codec.webp.effort must be between 0 and 6"));
        }
        if self.codec.jpeg.quality == 0 || self.codec.jpeg.quality > 100 {
            return Err(invalid("codec.jpeg.quality must be between 1 and 100"));
        }

        let q = &self.quality;
        if q.max_file_size_bytes == 0 {
            return Err(invalid("quality.max_file_size_bytes must be > 0"));
        }
        if !q.blur_variance_floor.is_finite() || q.blur_variance_floor < 0.0 {
            return Err(invalid("quality.blur_variance_floor must be >= 0"));
        }
        if !(0.0..=255.0).contains(&q.brightness_min) || !(0.0..=255.0).contains(&q.brightness_max)
        {
            return Err(invalid("quality brightness bounds must be between 0 and 255"));
        }
        if q.brightness_min >= q.brightness_max {
            return Err(invalid(
                "quality.brightness_min must be below quality.brightness_max",
            ));
        }

        if self.processing.parallel_workers == 0 {
            return Err(invalid("processing.parallel_workers must be > 0"));
        }
        if self.processing.image_timeout_ms == 0 {
            return Err(invalid("processing.image_timeout_ms must be > 0"));
        }
        if self.processing.max_image_dimension == 0 {
            return Err(invalid("processing.max_image_dimension must be > 0"));
        }

        if self.storage.enabled {
            if self.storage.endpoint.trim().is_empty() {
                return Err(invalid("storage.endpoint must be set when storage is enabled"));
            }
            if self.storage.bucket.trim().is_empty() {
                return Err(invalid("storage.bucket must be set when storage is enabled"));
            }
        }
        if self.storage.timeout_ms == 0 {
            return Err(invalid("storage.timeout_ms must be > 0"));
        }

        Ok(())
    }
}
