//! The `pupline analyze` command: quality reports without rendering.

use clap::Args;
use pupline_core::{
    render_quality_report, OutputWriter, Policy, QualityAnalyzer, QualityReport, ReportFormat,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image files to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Print reports as a JSON array instead of text
    #[arg(long)]
    pub json: bool,
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, policy: Policy) -> anyhow::Result<()> {
    let analyzer = Arc::new(QualityAnalyzer::new(policy.quality));
    let reports = analyze_all(analyzer, args.paths).await?;

    if args.json {
        let stdout = std::io::stdout();
        let mut writer = OutputWriter::new(stdout.lock(), ReportFormat::Json, true);
        writer.write_all(&reports)?;
        writer.flush()?;
    } else {
        for report in &reports {
            println!("{}", render_quality_report(report));
        }
    }

    let failed = reports.iter().filter(|r| !r.passed).count();
    tracing::info!("{} of {} image(s) passed", reports.len() - failed, reports.len());
    Ok(())
}

async fn analyze_all(
    analyzer: Arc<QualityAnalyzer>,
    paths: Vec<PathBuf>,
) -> anyhow::Result<Vec<QualityReport>> {
    let mut reports = Vec::with_capacity(paths.len());
    for path in paths {
        let analyzer = analyzer.clone();
        let report = tokio::task::spawn_blocking(move || analyzer.analyze(&path)).await?;
        reports.push(report);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pupline_core::IssueKind;

    #[tokio::test]
    async fn test_unreadable_files_get_reports() {
        let dir = tempfile::tempdir().unwrap();
        let garbage = dir.path().join("x.jpg");
        std::fs::write(&garbage, b"not an image").unwrap();

        let analyzer = Arc::new(QualityAnalyzer::new(Policy::default().quality));
        let reports = analyze_all(analyzer, vec![garbage, dir.path().join("missing.png")])
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert!(!report.passed);
            assert_eq!(report.issues.len(), 1);
            assert_eq!(report.issues[0].kind, IssueKind::WrongFormat);
        }
    }
}
