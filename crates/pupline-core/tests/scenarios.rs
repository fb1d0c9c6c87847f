//! End-to-end checks of the analyzer and processor on synthesized photos.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use pupline_core::pipeline::{ArtifactSink, FsSink};
use pupline_core::{
    IssueKind, ItemIdentity, OutputFormat, Policy, Processor, QualityAnalyzer, Severity, Sex,
    SizeName,
};

fn policy_in(dir: &Path) -> Arc<Policy> {
    let mut policy = Policy::default();
    policy.paths.output_root = dir.join("public").join("puppies");
    Arc::new(policy)
}

/// Blocks alternating between two gray levels.
fn blocks(width: u32, height: u32, block: u32, dark: u8, light: u8) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let v = if ((x / block) + (y / block)) % 2 == 0 { dark } else { light };
        Rgb([v, v, v])
    })
}

fn spitz() -> ItemIdentity {
    ItemIdentity::new("spitz-01")
        .unwrap()
        .with_color("branco")
        .with_sex(Sex::Male)
}

fn is_hex_suffix(s: &str) -> bool {
    s.len() == 8 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

#[test]
fn well_lit_sharp_photo_passes_without_issues() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hero.jpg");
    blocks(1920, 1080, 32, 170, 230).save(&path).unwrap();

    let analyzer = QualityAnalyzer::new(Policy::default().quality);
    let report = analyzer.analyze(&path);

    assert!(report.passed);
    assert!(report.issues.is_empty(), "unexpected issues: {:?}", report.issues);
    assert_eq!((report.metadata.width, report.metadata.height), (1920, 1080));
    assert_eq!(report.metadata.format, "jpeg");
    let brightness = report.metadata.brightness.unwrap();
    assert!((190.0..=210.0).contains(&brightness), "brightness {brightness}");
}

#[test]
fn small_photo_has_exactly_one_resolution_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.png");
    blocks(300, 300, 8, 100, 160).save(&path).unwrap();

    let report = QualityAnalyzer::new(Policy::default().quality).analyze(&path);

    assert!(!report.passed);
    assert_eq!(report.issues.len(), 1, "issues: {:?}", report.issues);
    assert_eq!(report.issues[0].severity, Severity::Error);
    assert_eq!(report.issues[0].kind, IssueKind::LowResolution);
}

#[test]
fn card_webp_is_named_and_sized_by_policy() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.jpg");
    blocks(1600, 1200, 40, 90, 200).save(&source).unwrap();
    let policy = policy_in(dir.path());

    let result = Processor::new(policy.clone()).process(&source, &spitz());
    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.derivatives.len(), 2 * policy.sizes.len());

    let card = result
        .derivatives
        .iter()
        .find(|d| d.size == SizeName::Card && d.format == OutputFormat::WebP)
        .unwrap();
    assert_eq!(card.file_path.parent().unwrap(), policy.item_dir("spitz-01"));

    let name = card.file_path.file_name().unwrap().to_str().unwrap();
    let suffix = name
        .strip_prefix("spitz-01-branco-male-card-")
        .and_then(|rest| rest.strip_suffix(".webp"))
        .unwrap();
    assert!(is_hex_suffix(suffix), "bad suffix in {name}");

    assert_eq!(image::image_dimensions(&card.file_path).unwrap(), (600, 600));
    assert_eq!(card.public_url, format!("/puppies/spitz-01/{name}"));

    for (derivative, preset) in result.derivatives.chunks(2).zip(&policy.sizes) {
        for d in derivative {
            assert_eq!((d.width, d.height), (preset.width, preset.height));
        }
    }
}

#[test]
fn separate_runs_never_share_a_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.png");
    blocks(800, 600, 16, 60, 190).save(&source).unwrap();
    let processor = Processor::new(policy_in(dir.path()));

    let first = processor.process(&source, &spitz());
    let second = processor.process(&source, &spitz());

    let names: HashSet<PathBuf> = first
        .derivatives
        .iter()
        .chain(&second.derivatives)
        .map(|d| d.file_path.clone())
        .collect();
    assert_eq!(names.len(), first.derivatives.len() + second.derivatives.len());
}

/// Filesystem sink that refuses to persist the card JPEG.
struct CardJpegFails;

impl ArtifactSink for CardJpegFails {
    fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        FsSink.ensure_dir(dir)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.contains("-card-") && name.ends_with(".jpg") {
            return Err(io::Error::other("disk full"));
        }
        FsSink.write(path, bytes)
    }
}

#[test]
fn one_failed_pair_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.png");
    blocks(1400, 1000, 20, 80, 180).save(&source).unwrap();
    let policy = policy_in(dir.path());

    let processor = Processor::with_sink(policy.clone(), Arc::new(CardJpegFails));
    let result = processor.process(&source, &spitz());

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("disk full"));
    assert_eq!(result.derivatives.len(), 2 * policy.sizes.len() - 1);
    assert!(!result
        .derivatives
        .iter()
        .any(|d| d.size == SizeName::Card && d.format == OutputFormat::Jpeg));
    for d in &result.derivatives {
        assert!(d.file_path.exists());
    }
}
