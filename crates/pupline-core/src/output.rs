//! Output formatting: JSON/JSONL writers and the human-readable quality
//! report.

use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};

use crate::types::{QualityReport, Severity};

/// Machine-readable report formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item followed by a newline.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == ReportFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple items: a JSON array, or one line per item for JSONL.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += items.len();
            }
            ReportFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    pub fn items_written(&self) -> usize {
        self.items_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Render a quality report for terminal output.
pub fn render_quality_report(report: &QualityReport) -> String {
    let stats = &report.metadata;
    let mut out = String::new();

    let verdict = if report.passed { "PASS" } else { "FAIL" };
    let _ = writeln!(out, "{} [{}]", report.source_path.display(), verdict);
    let _ = writeln!(out, "  Resolution: {}x{}", stats.width, stats.height);
    let _ = writeln!(out, "  Size:       {:.1} KB", stats.byte_size as f64 / 1024.0);
    let format = if stats.format.is_empty() { "unknown" } else { &stats.format };
    let _ = writeln!(out, "  Format:     {format}");
    match stats.brightness {
        Some(b) => {
            let _ = writeln!(out, "  Brightness: {b:.1}/255");
        }
        None => {
            let _ = writeln!(out, "  Brightness: n/a");
        }
    }
    match stats.sharpness {
        Some(s) => {
            let _ = writeln!(out, "  Sharpness:  {s:.1}");
        }
        None => {
            let _ = writeln!(out, "  Sharpness:  n/a");
        }
    }

    if report.issues.is_empty() {
        let _ = writeln!(out, "  No issues");
    }
    for issue in &report.issues {
        let marker = match issue.severity {
            Severity::Error => "✗",
            Severity::Warning => "!",
            Severity::Info => "i",
        };
        let _ = writeln!(out, "  {marker} {}", issue.message);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ImageStats, IssueKind, QualityIssue};
    use serde::Serialize;
    use std::path::Path;

    #[derive(Serialize)]
    struct TestItem {
        name: String,
        value: i32,
    }

    fn items() -> Vec<TestItem> {
        vec![
            TestItem {
                name: "a".to_string(),
                value: 1,
            },
            TestItem {
                name: "b".to_string(),
                value: 2,
            },
        ]
    }

    #[test]
    fn test_write_json() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, ReportFormat::Json, false);
        writer.write(&items()[0]).unwrap();
        assert_eq!(writer.items_written(), 1);

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("\"name\":\"a\""));
        assert!(output.contains("\"value\":1"));
    }

    #[test]
    fn test_write_all_jsonl() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, ReportFormat::JsonLines, true);
        writer.write_all(&items()).unwrap();
        assert_eq!(writer.items_written(), 2);

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.trim().split('\n').collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_write_all_json_array() {
        let mut buffer = Vec::new();
        let mut writer = OutputWriter::new(&mut buffer, ReportFormat::Json, false);
        writer.write_all(&items()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.starts_with('['));
        assert!(output.trim().ends_with(']'));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ReportFormat::parse("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::parse("JSONL"), Some(ReportFormat::JsonLines));
        assert_eq!(ReportFormat::parse("invalid"), None);
    }

    #[test]
    fn test_render_quality_report() {
        let report = QualityReport::from_issues(
            Path::new("raw/spitz/1.jpg"),
            vec![
                QualityIssue::error(IssueKind::LowResolution, "Resolution 300x300 below 500x500"),
                QualityIssue::warning(IssueKind::Blur, "Image may be blurry"),
            ],
            ImageStats {
                width: 300,
                height: 300,
                format: "jpeg".into(),
                byte_size: 2048,
                brightness: Some(128.25),
                sharpness: None,
            },
        );
        let text = render_quality_report(&report);
        assert!(text.starts_with("raw/spitz/1.jpg [FAIL]"));
        assert!(text.contains("Resolution: 300x300"));
        assert!(text.contains("Size:       2.0 KB"));
        assert!(text.contains("Brightness: 128.2/255") || text.contains("Brightness: 128.3/255"));
        assert!(text.contains("Sharpness:  n/a"));
        assert!(text.contains("✗ Resolution 300x300 below 500x500"));
        assert!(text.contains("! Image may be blurry"));
    }

    #[test]
    fn test_render_clean_report() {
        let report = QualityReport::from_issues(
            Path::new("a.png"),
            Vec::new(),
            ImageStats {
                format: "png".into(),
                ..ImageStats::default()
            },
        );
        let text = render_quality_report(&report);
        assert!(text.contains("[PASS]"));
        assert!(text.contains("No issues"));
    }
}
