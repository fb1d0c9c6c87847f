//! Image processing pipeline components.
//!
//! - **discovery**: Find source images, one folder per item
//! - **decode**: Load and decode source images
//! - **analyze**: Advisory quality checks
//! - **crop**: Content-aware cover crops
//! - **adjust**: Color correction and sharpening
//! - **encode**: WebP and JPEG encoding
//! - **naming**: Slugs and derivative file names
//! - **sink**: Where encoded bytes are written
//! - **processor**: One source image to every derivative
//! - **batch**: Bounded, slug-keyed batch runs

pub mod adjust;
pub mod analyze;
pub mod batch;
pub mod crop;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod naming;
pub mod processor;
pub mod sink;

// Re-exports for convenient access
pub use analyze::QualityAnalyzer;
pub use batch::{BatchOptions, BatchRunner, BatchSummary, ItemOutcome, OutcomeStatus};
pub use decode::DecodedImage;
pub use discovery::{SourceDiscovery, SourceImage};
pub use processor::Processor;
pub use sink::{ArtifactSink, FsSink};
