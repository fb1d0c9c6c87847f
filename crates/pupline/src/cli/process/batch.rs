//! Batch execution with a progress bar, failure listing and report output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use pupline_core::{BatchSummary, ItemOutcome, OutcomeStatus, OutputWriter, SourceImage};

use super::types::OutputFormat;
use super::{ProcessArgs, ProcessContext};

/// Run the batch, then report failures, the summary and the optional report
/// file.
pub async fn run_batch(
    ctx: ProcessContext,
    args: &ProcessArgs,
    images: Vec<SourceImage>,
) -> anyhow::Result<BatchSummary> {
    let progress = create_progress_bar(images.len() as u64);
    let start_time = std::time::Instant::now();

    let bar = progress.clone();
    let summary = ctx
        .runner
        .run(images, move |outcome: &ItemOutcome| {
            bar.inc(1);
            let elapsed = start_time.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                let rate = bar.position() as f64 / elapsed;
                bar.set_message(format!("{} ({:.1} img/sec)", outcome.slug, rate));
            }
        })
        .await;

    progress.finish_and_clear();
    let elapsed = start_time.elapsed();

    for line in failure_lines(&summary) {
        eprintln!("{line}");
    }

    if let Some(report_path) = &args.report {
        write_report(report_path, args.format, &summary.outcomes)?;
        tracing::info!("Report written to {:?}", report_path);
    }

    print_summary(&summary, elapsed, ctx.uploading);
    tracing::debug!("Output root: {:?}", ctx.policy.output_root());

    Ok(summary)
}

/// One line per failed image, followed by its reasons.
fn failure_lines(summary: &BatchSummary) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &summary.outcomes {
        if outcome.status != OutcomeStatus::Failed {
            continue;
        }
        lines.push(format!("  ✗ {}", outcome.source_path.display()));
        for reason in outcome.failure_reasons() {
            lines.push(format!("      {reason}"));
        }
    }
    lines
}

/// Write every outcome to `path` as a JSON array or JSON Lines.
fn write_report(path: &Path, format: OutputFormat, outcomes: &[ItemOutcome]) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = OutputWriter::new(BufWriter::new(file), format.into(), true);
    writer.write_all(outcomes)?;
    writer.flush()?;
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(summary: &BatchSummary, elapsed: std::time::Duration, uploading: bool) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        summary.total() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    eprintln!("    Derivatives:  {:>8}", summary.derivatives);
    if uploading {
        eprintln!("    Uploaded:     {:>8}", summary.uploaded);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
