//! Turns one source image into every (size x format) derivative.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::DynamicImage;

use crate::config::{Policy, SizePreset};
use crate::error::PipelineError;
use crate::types::{validate_slug, Derivative, ItemIdentity, OutputFormat, ProcessResult};

use super::decode::{check_dimensions, decode_file};
use super::encode::{effective_quality, encode};
use super::naming::{derivative_file_name, unique_suffix};
use super::sink::{ArtifactSink, FsSink};
use super::{adjust, crop};

/// Renders derivatives according to a shared, read-only policy.
///
/// Only a decode failure (or an unusable output directory) aborts a run;
/// every (size, format) pair is otherwise isolated and reported in
/// [`ProcessResult::errors`].
pub struct Processor {
    policy: Arc<Policy>,
    sink: Arc<dyn ArtifactSink>,
}

impl Processor {
    /// Create a processor writing to the local filesystem.
    pub fn new(policy: Arc<Policy>) -> Self {
        Self::with_sink(policy, Arc::new(FsSink))
    }

    /// Create a processor with a custom artifact sink.
    pub fn with_sink(policy: Arc<Policy>, sink: Arc<dyn ArtifactSink>) -> Self {
        Self { policy, sink }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Process one source image for the given item.
    pub fn process(&self, source: &Path, identity: &ItemIdentity) -> ProcessResult {
        self.process_until(source, identity, &AtomicBool::new(false))
    }

    /// Like [`process`](Self::process), but stops before the next
    /// (size, format) pair once `cancel` is set. Anything written so far is
    /// removed and the result is fatal.
    pub fn process_until(
        &self,
        source: &Path,
        identity: &ItemIdentity,
        cancel: &AtomicBool,
    ) -> ProcessResult {
        let start = std::time::Instant::now();
        tracing::debug!("Processing {:?} for {}", source, identity.slug());

        let decoded = match decode_file(source).and_then(|d| {
            check_dimensions(&d, source, self.policy.processing.max_image_dimension)?;
            Ok(d)
        }) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("{e}");
                return ProcessResult::fatal(source, e.to_string());
            }
        };

        if cancel.load(Ordering::Relaxed) {
            return self.cancelled(source, &[]);
        }

        let item_dir = self.policy.item_dir(identity.slug());
        if let Err(e) = self.sink.ensure_dir(&item_dir) {
            let err = PipelineError::Write {
                path: item_dir,
                message: e.to_string(),
            };
            tracing::warn!("{err}");
            return ProcessResult::fatal(source, err.to_string());
        }

        let mut derivatives = Vec::with_capacity(self.policy.sizes.len() * OutputFormat::ALL.len());
        let mut errors = Vec::new();

        for preset in &self.policy.sizes {
            let rendered = self.render(&decoded.image, preset);
            for format in OutputFormat::ALL {
                if cancel.load(Ordering::Relaxed) {
                    return self.cancelled(source, &derivatives);
                }
                match self.emit(&rendered, preset, format, identity, &item_dir) {
                    Ok(derivative) => derivatives.push(derivative),
                    Err(e) => {
                        tracing::warn!("{e}");
                        errors.push(e.to_string());
                    }
                }
            }
        }

        tracing::debug!(
            "Processed {:?} in {:?}: {} derivative(s), {} error(s)",
            source,
            start.elapsed(),
            derivatives.len(),
            errors.len()
        );

        ProcessResult {
            source_path: source.to_path_buf(),
            success: errors.is_empty(),
            derivatives,
            errors,
        }
    }

    fn cancelled(&self, source: &Path, written: &[Derivative]) -> ProcessResult {
        self.discard(written);
        let err = PipelineError::Cancelled(source.to_path_buf());
        tracing::warn!("{err}");
        ProcessResult::fatal(source, err.to_string())
    }

    /// Delete derivative files that will not be reported.
    pub fn discard(&self, derivatives: &[Derivative]) {
        for d in derivatives {
            match self.sink.remove(&d.file_path) {
                Ok(()) => tracing::debug!("Discarded {:?}", d.file_path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Could not discard {:?}: {e}", d.file_path),
            }
        }
    }

    /// Crop to the preset size and apply color correction.
    pub fn render(&self, image: &DynamicImage, preset: &SizePreset) -> image::RgbaImage {
        let crop = &self.policy.crop;
        let fitted = crop::cover(image, preset.width, preset.height, crop.strategy, crop.anchor);
        adjust::apply(&fitted, &self.policy.color)
    }

    fn emit(
        &self,
        rendered: &image::RgbaImage,
        preset: &SizePreset,
        format: OutputFormat,
        identity: &ItemIdentity,
        item_dir: &Path,
    ) -> Result<Derivative, PipelineError> {
        let codec = &self.policy.codec;
        let quality = effective_quality(preset.quality, format, codec);
        let bytes = encode(rendered, format, quality, codec).map_err(|message| {
            PipelineError::Encode {
                format: format.to_string(),
                size: preset.name.to_string(),
                message,
            }
        })?;

        let file_name = derivative_file_name(identity, preset.name, format, &unique_suffix());
        let file_path = item_dir.join(&file_name);
        self.sink
            .write(&file_path, &bytes)
            .map_err(|e| PipelineError::Write {
                path: file_path.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!("  {} {} -> {:?} ({} bytes)", preset.name, format, file_path, bytes.len());

        Ok(Derivative {
            size: preset.name,
            format,
            public_url: self.policy.public_url(identity.slug(), &file_name),
            file_path,
            width: rendered.width(),
            height: rendered.height(),
            byte_size: bytes.len() as u64,
        })
    }

    /// Remove every previous derivative of an item. A missing directory is
    /// not an error. The slug must be valid, so only one item directory
    /// below the output root can be removed.
    pub fn cleanup_old_images(&self, slug: &str) -> Result<(), PipelineError> {
        validate_slug(slug)?;
        let dir = self.policy.item_dir(slug);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!("Removed previous output {:?}", dir);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::Cleanup {
                path: dir,
                message: e.to_string(),
            }),
        }
    }
}
