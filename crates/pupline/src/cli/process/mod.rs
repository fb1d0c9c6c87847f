//! The `pupline process` command: discover, analyze, render and publish.

mod batch;
mod setup;
pub mod types;

pub use types::OutputFormat;

use clap::Args;
use pupline_core::{BatchRunner, Policy, SourceDiscovery};
use std::path::PathBuf;
use std::sync::Arc;

use batch::run_batch;
use setup::setup_runner;

/// Arguments for the `process` command.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Input root with one folder per item (defaults to paths.input_root)
    pub input: Option<PathBuf>,

    /// Output root for derivatives (defaults to paths.output_root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of items processed in parallel
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Upload derivatives to object storage after rendering
    #[arg(long)]
    pub upload: bool,

    /// Skip images whose quality report has errors
    #[arg(long)]
    pub gate: bool,

    /// Keep previous derivatives instead of replacing them
    #[arg(long)]
    pub no_clean: bool,

    /// Exit with an error if any image failed
    #[arg(long)]
    pub strict: bool,

    /// Write per-image outcomes to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Processing context assembled by setup_runner().
pub(crate) struct ProcessContext {
    pub policy: Arc<Policy>,
    pub runner: BatchRunner,
    pub input: PathBuf,
    pub uploading: bool,
}

/// Execute the process command.
pub async fn execute(args: ProcessArgs, policy: Policy) -> anyhow::Result<()> {
    let ctx = setup_runner(&args, policy)?;

    let images = SourceDiscovery::new(&ctx.policy.processing).discover(&ctx.input)?;
    if images.is_empty() {
        tracing::warn!("No supported image files found under {:?}", ctx.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to process", images.len());

    let summary = run_batch(ctx, &args, images).await?;

    if args.strict && summary.failed > 0 {
        anyhow::bail!("{} of {} image(s) failed", summary.failed, summary.total());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn policy_for(dir: &Path) -> Policy {
        let mut policy = Policy::default();
        policy.paths.input_root = dir.join("raw");
        policy.paths.output_root = dir.join("out");
        policy
    }

    #[test]
    fn process_args_default_flags() {
        let args = ProcessArgs::default();
        assert!(args.input.is_none());
        assert!(args.parallel.is_none());
        assert!(!args.upload && !args.gate && !args.no_clean && !args.strict);
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[tokio::test]
    async fn test_empty_root_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("raw")).unwrap();
        let result = execute(ProcessArgs::default(), policy_for(dir.path())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = execute(ProcessArgs::default(), policy_for(dir.path())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_strict_turns_failures_into_error() {
        let dir = tempfile::tempdir().unwrap();
        let item = dir.path().join("raw").join("spitz-branco-macho");
        std::fs::create_dir_all(&item).unwrap();
        std::fs::write(item.join("1.jpg"), b"not an image").unwrap();

        let lenient = execute(ProcessArgs::default(), policy_for(dir.path())).await;
        assert!(lenient.is_ok());

        let report = dir.path().join("report.jsonl");
        let strict = execute(
            ProcessArgs {
                strict: true,
                report: Some(report.clone()),
                format: OutputFormat::Jsonl,
                ..ProcessArgs::default()
            },
            policy_for(dir.path()),
        )
        .await;
        assert!(strict.unwrap_err().to_string().contains("1 of 1 image(s) failed"));

        let written = std::fs::read_to_string(report).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.contains("\"status\":\"failed\""));
    }
}
