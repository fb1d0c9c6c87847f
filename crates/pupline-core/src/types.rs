//! Core data types for the Pupline image pipeline.
//!
//! These types describe what goes into a run (item identity) and what comes
//! out of it (quality reports, derivatives, process results).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Named output size. The set is closed so every preset can be matched
/// exhaustively and no free-form strings leak into file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeName {
    Thumbnail,
    Card,
    Hero,
}

impl SizeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeName::Thumbnail => "thumbnail",
            SizeName::Card => "card",
            SizeName::Hero => "hero",
        }
    }
}

impl fmt::Display for SizeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded output format of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    WebP,
    Jpeg,
}

impl OutputFormat {
    /// Every size is rendered in these formats, in this order.
    pub const ALL: [OutputFormat; 2] = [OutputFormat::WebP, OutputFormat::Jpeg];

    /// File extension used on disk and in storage keys.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::WebP => f.write_str("webp"),
            OutputFormat::Jpeg => f.write_str("jpeg"),
        }
    }
}

/// Sex of the listed animal. `Unspecified` is left out of file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Sex {
    /// Parse a folder-name token. Accepts the Portuguese tokens used by the
    /// photo intake folders as well as the English tags.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "macho" | "male" => Sex::Male,
            "femea" | "fêmea" | "female" => Sex::Female,
            _ => Sex::Unspecified,
        }
    }

    /// Tag used in file names, `None` when unspecified.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Sex::Male => Some("male"),
            Sex::Female => Some("female"),
            Sex::Unspecified => None,
        }
    }
}

/// Identity of the item a source image belongs to.
///
/// The slug determines the output directory and file name prefix, so it is
/// validated on construction and cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemIdentity {
    slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    sex: Sex,
}

impl ItemIdentity {
    /// Create an identity from a URL-safe slug (`[a-z0-9]` runs joined by
    /// single hyphens).
    pub fn new(slug: impl Into<String>) -> Result<Self, PipelineError> {
        let slug = slug.into();
        validate_slug(&slug)?;
        Ok(Self {
            slug,
            color: None,
            sex: Sex::Unspecified,
        })
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        let color = color.into();
        self.color = if color.trim().is_empty() {
            None
        } else {
            Some(color)
        };
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), PipelineError> {
    let invalid = |reason: &str| PipelineError::InvalidSlug {
        slug: slug.to_string(),
        reason: reason.to_string(),
    };

    if slug.is_empty() {
        return Err(invalid("slug is empty"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(invalid("only a-z, 0-9 and '-' are allowed"));
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err(invalid("hyphens must separate non-empty segments"));
    }
    Ok(())
}

/// Severity of a quality finding. Only `Error` fails a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Kind of quality finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    LowResolution,
    Blur,
    Underexposed,
    Overexposed,
    LargeFile,
    WrongFormat,
}

/// A single finding from the quality analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
}

impl QualityIssue {
    pub fn error(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    pub fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }

    pub fn info(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            kind,
            message: message.into(),
        }
    }
}

/// Measurements taken from a source image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStats {
    pub width: u32,
    pub height: u32,

    /// Detected container format ("jpeg", "png", "webp", ...)
    pub format: String,

    /// File size in bytes
    pub byte_size: u64,

    /// Mean brightness on a 0-255 scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,

    /// Laplacian sharpness score (higher is sharper)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<f64>,
}

/// Verdict of the quality analyzer for one source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub source_path: PathBuf,
    pub passed: bool,
    pub issues: Vec<QualityIssue>,
    pub metadata: ImageStats,
}

impl QualityReport {
    /// Build a report, deriving `passed` from the issue list.
    pub fn from_issues(source_path: &Path, issues: Vec<QualityIssue>, metadata: ImageStats) -> Self {
        let passed = !issues.iter().any(|i| i.severity == Severity::Error);
        Self {
            source_path: source_path.to_path_buf(),
            passed,
            issues,
            metadata,
        }
    }

    /// Report for a file that could not be read or decoded.
    pub fn unreadable(source_path: &Path, reason: &str) -> Self {
        Self::from_issues(
            source_path,
            vec![QualityIssue::error(
                IssueKind::WrongFormat,
                format!("Could not analyze image: {reason}"),
            )],
            ImageStats::default(),
        )
    }

    pub fn issues_with(&self, severity: Severity) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }
}

/// One encoded output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derivative {
    pub size: SizeName,
    pub format: OutputFormat,
    pub file_path: PathBuf,
    pub public_url: String,
    pub width: u32,
    pub height: u32,
    pub byte_size: u64,
}

/// Outcome of processing one source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub source_path: PathBuf,
    pub success: bool,
    pub derivatives: Vec<Derivative>,
    pub errors: Vec<String>,
}

impl ProcessResult {
    /// A run that failed before any derivative could be attempted.
    pub fn fatal(source_path: &Path, error: String) -> Self {
        Self {
            source_path: source_path.to_path_buf(),
            success: false,
            derivatives: Vec::new(),
            errors: vec![error],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_validation() {
        assert!(ItemIdentity::new("spitz-01").is_ok());
        assert!(ItemIdentity::new("lulu").is_ok());
        assert!(ItemIdentity::new("").is_err());
        assert!(ItemIdentity::new("Spitz").is_err());
        assert!(ItemIdentity::new("-spitz").is_err());
        assert!(ItemIdentity::new("spitz-").is_err());
        assert!(ItemIdentity::new("spitz--01").is_err());
        assert!(ItemIdentity::new("spitz/01").is_err());
    }

    #[test]
    fn test_blank_color_is_dropped() {
        let id = ItemIdentity::new("spitz").unwrap().with_color("  ");
        assert_eq!(id.color(), None);
        let id = ItemIdentity::new("spitz").unwrap().with_color("branco");
        assert_eq!(id.color(), Some("branco"));
    }

    #[test]
    fn test_sex_tokens() {
        assert_eq!(Sex::from_token("macho"), Sex::Male);
        assert_eq!(Sex::from_token("Femea"), Sex::Female);
        assert_eq!(Sex::from_token("fêmea"), Sex::Female);
        assert_eq!(Sex::from_token("filhote"), Sex::Unspecified);
        assert_eq!(Sex::Unspecified.tag(), None);
        assert_eq!(Sex::Female.tag(), Some("female"));
    }

    #[test]
    fn test_output_format_naming() {
        assert_eq!(OutputFormat::WebP.extension(), "webp");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Jpeg.to_string(), "jpeg");
    }

    #[test]
    fn test_report_passed_tracks_error_severity() {
        let path = Path::new("a.jpg");
        let warn_only = QualityReport::from_issues(
            path,
            vec![QualityIssue::warning(IssueKind::Blur, "soft")],
            ImageStats::default(),
        );
        assert!(warn_only.passed);

        let with_error = QualityReport::from_issues(
            path,
            vec![
                QualityIssue::info(IssueKind::Blur, "n/a"),
                QualityIssue::error(IssueKind::LowResolution, "small"),
            ],
            ImageStats::default(),
        );
        assert!(!with_error.passed);
        assert_eq!(with_error.issues_with(Severity::Error).count(), 1);
    }

    #[test]
    fn test_unreadable_report_shape() {
        let report = QualityReport::unreadable(Path::new("x.jpg"), "bad bytes");
        assert!(!report.passed);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::WrongFormat);
        assert_eq!(report.metadata.width, 0);
        assert_eq!(report.metadata.byte_size, 0);
    }

    #[test]
    fn test_issue_kind_serializes_snake_case() {
        let json = serde_json::to_string(&IssueKind::LowResolution).unwrap();
        assert_eq!(json, "\"low_resolution\"");
    }
}
