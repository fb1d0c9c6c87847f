//! Bounded batch runner keyed by item slug.
//!
//! Images are grouped by slug. Each group runs as one task, with at most
//! `parallel` groups in flight, so a slug's output directory is never
//! touched by two tasks at once while different slugs proceed in parallel.

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::Policy;
use crate::error::PipelineError;
use crate::storage::{ObjectStore, UploadResult};
use crate::types::{ProcessResult, QualityReport};

use super::analyze::QualityAnalyzer;
use super::discovery::SourceImage;
use super::processor::Processor;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Max slugs processed concurrently
    pub parallel: usize,
    /// Per-image time budget in milliseconds
    pub timeout_ms: u64,
    /// Remove previous derivatives once per slug before processing it
    pub clean: bool,
    /// Skip processing images whose quality report did not pass
    pub gate: bool,
}

impl BatchOptions {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            parallel: policy.processing.parallel_workers,
            timeout_ms: policy.processing.image_timeout_ms,
            clean: true,
            gate: false,
        }
    }
}

/// Final state of one image in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Everything that happened to one source image.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub source_path: PathBuf,
    pub slug: String,
    pub status: OutcomeStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<QualityReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ProcessResult>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uploads: Vec<UploadResult>,

    /// Failure outside the processor (timeout, panicked task)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    /// Human-readable reasons this image did not fully succeed.
    pub fn failure_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if let Some(error) = &self.error {
            reasons.push(error.clone());
        }
        if let Some(result) = &self.result {
            reasons.extend(result.errors.iter().cloned());
        }
        for upload in &self.uploads {
            if let UploadResult::Failed { key, error } = upload {
                reasons.push(format!("upload {key}: {error}"));
            }
        }
        reasons
    }
}

/// Totals for a finished batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub derivatives: usize,
    pub uploaded: usize,
    pub outcomes: Vec<ItemOutcome>,
}

impl BatchSummary {
    fn from_outcomes(outcomes: Vec<ItemOutcome>) -> Self {
        let mut summary = BatchSummary::default();
        for outcome in &outcomes {
            match outcome.status {
                OutcomeStatus::Succeeded => summary.succeeded += 1,
                OutcomeStatus::Failed => summary.failed += 1,
                OutcomeStatus::Skipped => summary.skipped += 1,
            }
            if let Some(result) = &outcome.result {
                summary.derivatives += result.derivatives.len();
            }
            summary.uploaded += outcome.uploads.iter().filter(|u| u.is_uploaded()).count();
        }
        summary.outcomes = outcomes;
        summary
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Shared state handed to every slug task.
#[derive(Clone)]
struct Worker {
    processor: Arc<Processor>,
    analyzer: Arc<QualityAnalyzer>,
    store: Option<Arc<dyn ObjectStore>>,
    options: BatchOptions,
}

/// Runs analysis, processing and optional uploads over a set of images.
pub struct BatchRunner {
    worker: Worker,
}

impl BatchRunner {
    /// Create a runner writing derivatives to the local filesystem.
    pub fn new(policy: Arc<Policy>, options: BatchOptions) -> Self {
        let analyzer = Arc::new(QualityAnalyzer::new(policy.quality.clone()));
        let processor = Arc::new(Processor::new(policy));
        Self::with_processor(processor, analyzer, options)
    }

    pub fn with_processor(
        processor: Arc<Processor>,
        analyzer: Arc<QualityAnalyzer>,
        options: BatchOptions,
    ) -> Self {
        Self {
            worker: Worker {
                processor,
                analyzer,
                store: None,
                options,
            },
        }
    }

    /// Upload every derivative to `store` after processing.
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.worker.store = Some(store);
        self
    }

    /// Process a batch of images.
    ///
    /// Calls `on_outcome` as each image finishes so the CLI can drive a
    /// progress bar. Outcomes in the summary are ordered by slug (first
    /// appearance) and then by input order within a slug.
    pub async fn run<F>(&self, images: Vec<SourceImage>, on_outcome: F) -> BatchSummary
    where
        F: Fn(&ItemOutcome) + Send + Sync + 'static,
    {
        let groups = group_by_slug(images);
        tracing::info!(
            "Processing {} item(s) with up to {} in parallel",
            groups.len(),
            self.worker.options.parallel
        );

        let semaphore = Arc::new(Semaphore::new(self.worker.options.parallel.max(1)));
        let on_outcome = Arc::new(on_outcome);
        let mut handles = Vec::with_capacity(groups.len());

        for (slug, images) in groups {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Batch semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let worker = self.worker.clone();
            let on_outcome = on_outcome.clone();
            let handle = tokio::spawn(async move {
                let outcomes = worker.run_slug(&slug, images, on_outcome.as_ref()).await;
                drop(permit);
                outcomes
            });
            handles.push(handle);
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(group) => outcomes.extend(group),
                Err(e) => tracing::error!("Batch task panicked: {e}"),
            }
        }

        BatchSummary::from_outcomes(outcomes)
    }
}

impl Worker {
    async fn run_slug<F>(&self, slug: &str, images: Vec<SourceImage>, on_outcome: &F) -> Vec<ItemOutcome>
    where
        F: Fn(&ItemOutcome) + Send + Sync,
    {
        if self.options.clean {
            self.clean_slug(slug).await;
        }

        let mut outcomes = Vec::with_capacity(images.len());
        for image in images {
            let outcome = self.run_image(slug, image).await;
            on_outcome(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn clean_slug(&self, slug: &str) {
        let processor = self.processor.clone();
        let owned = slug.to_string();
        match tokio::task::spawn_blocking(move || processor.cleanup_old_images(&owned)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("{e}"),
            Err(e) => tracing::warn!("Cleanup task for {slug} failed: {e}"),
        }

        if let Some(store) = &self.store {
            match store.delete_all(slug).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Removed {n} remote object(s) for {slug}"),
                Err(e) => tracing::warn!("Remote cleanup for {slug} failed: {e}"),
            }
        }
    }

    async fn run_image(&self, slug: &str, image: SourceImage) -> ItemOutcome {
        let path = image.path.clone();
        let analyzer = self.analyzer.clone();
        let processor = self.processor.clone();
        let gate = self.options.gate;
        let cancel = Arc::new(AtomicBool::new(false));
        let stop = cancel.clone();

        let mut work = tokio::task::spawn_blocking(move || {
            let report = analyzer.analyze(&image.path);
            if gate && !report.passed {
                return (report, None);
            }
            let result = processor.process_until(&image.path, &image.identity, &stop);
            (report, Some(result))
        });

        let mut outcome = ItemOutcome {
            source_path: path.clone(),
            slug: slug.to_string(),
            status: OutcomeStatus::Failed,
            report: None,
            result: None,
            uploads: Vec::new(),
            error: None,
        };

        match tokio::time::timeout(Duration::from_millis(self.options.timeout_ms), &mut work).await {
            Ok(Ok((report, result))) => {
                outcome.report = Some(report);
                outcome.result = result;
            }
            Ok(Err(e)) => {
                outcome.error = Some(format!("Processing task failed: {e}"));
            }
            Err(_) => {
                // The slug directory stays owned by this task until the
                // blocking work has stopped writing into it.
                cancel.store(true, Ordering::Relaxed);
                match work.await {
                    Ok((_, Some(late))) => self.processor.discard(&late.derivatives),
                    Ok((_, None)) => {}
                    Err(e) => tracing::warn!("Timed-out task for {:?} failed: {e}", path),
                }
                outcome.error = Some(
                    PipelineError::Timeout {
                        path: path.clone(),
                        stage: "process".to_string(),
                        timeout_ms: self.options.timeout_ms,
                    }
                    .to_string(),
                );
            }
        }

        if let (Some(store), Some(result)) = (&self.store, &outcome.result) {
            for derivative in &result.derivatives {
                outcome.uploads.push(store.upload(derivative, slug).await);
            }
        }

        outcome.status = match (&outcome.result, &outcome.report) {
            _ if outcome.error.is_some() => OutcomeStatus::Failed,
            (None, Some(_)) => OutcomeStatus::Skipped,
            (Some(result), _)
                if result.success && outcome.uploads.iter().all(|u| u.is_uploaded()) =>
            {
                OutcomeStatus::Succeeded
            }
            _ => OutcomeStatus::Failed,
        };

        match outcome.status {
            OutcomeStatus::Succeeded => tracing::info!("Processed {:?}", path),
            OutcomeStatus::Skipped => {
                tracing::info!("Skipped {:?}: quality check did not pass", path)
            }
            OutcomeStatus::Failed => tracing::warn!("Failed {:?}", path),
        }
        outcome
    }
}

/// Group images by slug, keeping first-seen slug order and input order
/// within a slug.
fn group_by_slug(images: Vec<SourceImage>) -> Vec<(String, Vec<SourceImage>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<SourceImage>)> = Vec::new();
    for image in images {
        let slug = image.identity.slug().to_string();
        match index.get(&slug) {
            Some(&i) => groups[i].1.push(image),
            None => {
                index.insert(slug.clone(), groups.len());
                groups.push((slug, vec![image]));
            }
        }
    }
    groups
}
