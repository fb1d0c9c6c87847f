//! Pupline Core - image pipeline for animal listing photos.
//!
//! Pupline takes raw photos organized one folder per animal and produces
//! cropped, color-corrected WebP and JPEG derivatives at a fixed set of
//! sizes, with an advisory quality report per source image.
//!
//! # Architecture
//!
//! ```text
//! Discover → Analyze (advisory) → Decode → Crop → Adjust → Encode → Write → Upload
//! ```
//!
//! Everything is driven by one immutable [`Policy`] shared across tasks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pupline_core::{ItemIdentity, Policy, Processor, QualityAnalyzer};
//! use std::sync::Arc;
//!
//! let policy = Arc::new(Policy::load()?);
//! let analyzer = QualityAnalyzer::new(policy.quality.clone());
//! let report = analyzer.analyze("raw-images/spitz-branco-macho/1.jpg".as_ref());
//!
//! let processor = Processor::new(policy);
//! let identity = ItemIdentity::new("spitz-branco-macho")?;
//! let result = processor.process("raw-images/spitz-branco-macho/1.jpg".as_ref(), &identity);
//! println!("{} derivative(s)", result.derivatives.len());
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod types;

// Re-exports for convenient access
pub use config::Policy;
pub use error::{
    ConfigError, PipelineError, PipelineResult, PuplineError, Result, StorageError,
};
pub use output::{render_quality_report, OutputWriter, ReportFormat};
pub use pipeline::{
    BatchOptions, BatchRunner, BatchSummary, ItemOutcome, OutcomeStatus, Processor,
    QualityAnalyzer, SourceDiscovery, SourceImage,
};
pub use storage::{DisabledStore, ObjectStore, SupabaseStore, UploadResult};
pub use types::{
    Derivative, ImageStats, IssueKind, ItemIdentity, OutputFormat, ProcessResult, QualityIssue,
    QualityReport, Severity, Sex, SizeName,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_policy_is_valid() {
        let policy = Policy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.processing.parallel_workers, 4);
        assert_eq!(policy.sizes.len(), 3);
    }
}
