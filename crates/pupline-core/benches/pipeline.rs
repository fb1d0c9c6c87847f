//! Benchmarks for the Pupline analyzer and renderer.
//!
//! Run with: cargo bench -p pupline-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use pupline_core::config::{CodecConfig, ColorConfig, CropAnchor, CropStrategy};
use pupline_core::pipeline::{adjust, analyze, crop, encode};
use pupline_core::OutputFormat;

/// A 1920x1080 photo-like frame: gradient background with a bright subject.
fn sample_photo() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(1920, 1080, |x, y| {
        let in_subject = (1200..1600).contains(&x) && (300..800).contains(&y);
        if in_subject {
            let v = if ((x / 6) + (y / 6)) % 2 == 0 { 240 } else { 150 };
            Rgb([v, (v as f32 * 0.8) as u8, 90])
        } else {
            Rgb([(x / 16) as u8, (y / 12) as u8, 110])
        }
    }))
}

fn benchmark_sharpness(c: &mut Criterion) {
    let img = sample_photo();

    c.bench_function("sharpness_score_1080p", |b| {
        b.iter(|| analyze::sharpness_score(black_box(&img)))
    });
}

fn benchmark_brightness(c: &mut Criterion) {
    let img = sample_photo();

    c.bench_function("mean_brightness_1080p", |b| {
        b.iter(|| analyze::mean_brightness(black_box(&img)))
    });
}

fn benchmark_crop(c: &mut Criterion) {
    let img = sample_photo();
    let mut group = c.benchmark_group("cover_600x600");
    for strategy in [CropStrategy::Attention, CropStrategy::Entropy, CropStrategy::Centered] {
        group.bench_function(format!("{strategy:?}"), |b| {
            b.iter(|| crop::cover(black_box(&img), 600, 600, strategy, CropAnchor::Center))
        });
    }
    group.finish();
}

fn benchmark_render_and_encode(c: &mut Criterion) {
    let img = sample_photo();
    let fitted = crop::cover(&img, 600, 600, CropStrategy::Centered, CropAnchor::Center);
    let rendered = adjust::apply(&fitted, &ColorConfig::default());
    let codec = CodecConfig::default();

    c.bench_function("adjust_600x600", |b| {
        b.iter(|| adjust::apply(black_box(&fitted), &ColorConfig::default()))
    });
    c.bench_function("encode_webp_600x600", |b| {
        b.iter(|| encode::encode(black_box(&rendered), OutputFormat::WebP, 80, &codec))
    });
    c.bench_function("encode_jpeg_600x600", |b| {
        b.iter(|| encode::encode(black_box(&rendered), OutputFormat::Jpeg, 80, &codec))
    });
}

criterion_group!(
    benches,
    benchmark_sharpness,
    benchmark_brightness,
    benchmark_crop,
    benchmark_render_and_encode,
);
criterion_main!(benches);
