//! Cover-fit resizing with content-aware crop window selection.
//!
//! The source is cropped to the target aspect ratio first and then resampled
//! to the exact target size. Only one axis ever has slack, so choosing the
//! window is a 1-D search along that axis, done on a small analysis copy.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use crate::config::{CropAnchor, CropStrategy};

/// Longest edge of the copy used to score crop windows.
const ANALYSIS_EDGE: u32 = 256;

/// Luma histogram bins for the entropy strategy.
const ENTROPY_BINS: usize = 32;

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Resize `image` to exactly `width` x `height`, cropping the excess.
pub fn cover(
    image: &DynamicImage,
    width: u32,
    height: u32,
    strategy: CropStrategy,
    anchor: CropAnchor,
) -> DynamicImage {
    let window = choose_window(image, width, height, strategy, anchor);
    image
        .crop_imm(window.x, window.y, window.width, window.height)
        .resize_exact(width, height, FilterType::Lanczos3)
}

/// Largest window of the target aspect ratio that fits in the source.
pub fn window_size(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = source;
    let (tw, th) = target;
    let src_aspect = sw as f64 / sh as f64;
    let tgt_aspect = tw as f64 / th as f64;

    if src_aspect > tgt_aspect {
        // Wider than the target: keep full height
        let w = ((sh as f64 * tgt_aspect).round() as u32).clamp(1, sw);
        (w, sh)
    } else {
        let h = ((sw as f64 / tgt_aspect).round() as u32).clamp(1, sh);
        (sw, h)
    }
}

/// Pick the crop window for the given strategy.
pub fn choose_window(
    image: &DynamicImage,
    width: u32,
    height: u32,
    strategy: CropStrategy,
    anchor: CropAnchor,
) -> CropWindow {
    let (sw, sh) = (image.width(), image.height());
    let (cw, ch) = window_size((sw, sh), (width, height));
    let horizontal = cw < sw;
    let slack = if horizontal { sw - cw } else { sh - ch };

    let offset = if slack == 0 {
        0
    } else {
        match strategy {
            CropStrategy::Centered => anchored_offset(slack, horizontal, anchor),
            CropStrategy::Attention | CropStrategy::Entropy => {
                scored_offset(image, (cw, ch), horizontal, strategy)
            }
        }
    };

    if horizontal {
        CropWindow {
            x: offset.min(slack),
            y: 0,
            width: cw,
            height: ch,
        }
    } else {
        CropWindow {
            x: 0,
            y: offset.min(slack),
            width: cw,
            height: ch,
        }
    }
}

fn anchored_offset(slack: u32, horizontal: bool, anchor: CropAnchor) -> u32 {
    match (anchor, horizontal) {
        (CropAnchor::Left, true) | (CropAnchor::Top, false) => 0,
        (CropAnchor::Right, true) | (CropAnchor::Bottom, false) => slack,
        _ => slack / 2,
    }
}

/// Score every window position on a downscaled copy and map the best one
/// back to source coordinates.
fn scored_offset(
    image: &DynamicImage,
    window: (u32, u32),
    horizontal: bool,
    strategy: CropStrategy,
) -> u32 {
    let small = image.thumbnail(ANALYSIS_EDGE, ANALYSIS_EDGE).to_rgb8();
    let (src_len, win_len) = if horizontal {
        (image.width(), window.0)
    } else {
        (image.height(), window.1)
    };
    let small_len = if horizontal {
        small.width()
    } else {
        small.height()
    };

    let factor = small_len as f64 / src_len as f64;
    let small_win = ((win_len as f64 * factor).round() as usize).clamp(1, small_len as usize);
    let slack = src_len - win_len;
    if small_win >= small_len as usize {
        // Slack vanishes at analysis scale
        return slack / 2;
    }

    let best = match strategy {
        CropStrategy::Entropy => best_entropy_offset(&small, horizontal, small_win),
        _ => best_window(&saliency_profile(&small, horizontal), small_win),
    };

    ((best as f64 / factor).round() as u32).min(slack)
}

/// Per-line saliency along the slack axis: edge energy plus color
/// saturation, with a bonus for skin-like tones.
fn saliency_profile(img: &RgbImage, horizontal: bool) -> Vec<f64> {
    let (w, h) = img.dimensions();
    let len = if horizontal { w as usize } else { h as usize };
    let mut profile = vec![0.0f64; len];

    for y in 0..h {
        for x in 0..w {
            let px = img.get_pixel(x, y);
            let luma = luma_of(px.0);
            let right = if x + 1 < w {
                luma_of(img.get_pixel(x + 1, y).0)
            } else {
                luma
            };
            let below = if y + 1 < h {
                luma_of(img.get_pixel(x, y + 1).0)
            } else {
                luma
            };
            let edge = (luma - right).abs() + (luma - below).abs();

            let [r, g, b] = px.0;
            let max = r.max(g).max(b) as f64;
            let min = r.min(g).min(b) as f64;
            let saturation = max - min;

            let skin = if is_skin_tone(r, g, b) { 64.0 } else { 0.0 };

            let idx = if horizontal { x as usize } else { y as usize };
            profile[idx] += edge + 0.5 * saturation + skin;
        }
    }
    profile
}

fn luma_of([r, g, b]: [u8; 3]) -> f64 {
    0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64
}

fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    r > 95 && g > 40 && b > 20 && r > g && r > b && (r - g.min(b)) > 15 && (r - g).abs() > 15
}

/// Offset of the window of length `win` with the highest summed score.
/// Ties go to the position closest to the center.
fn best_window(profile: &[f64], win: usize) -> usize {
    let len = profile.len();
    if win >= len {
        return 0;
    }

    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0.0);
    for v in profile {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }

    let center = (len - win) as f64 / 2.0;
    let mut best = 0usize;
    let mut best_score = f64::MIN;
    for start in 0..=(len - win) {
        let score = prefix[start + win] - prefix[start];
        let closer = (start as f64 - center).abs() < (best as f64 - center).abs();
        if score > best_score + 1e-9 || ((score - best_score).abs() <= 1e-9 && closer) {
            best = start;
            best_score = score;
        }
    }
    best
}

/// Offset of the window whose luma histogram has the highest entropy.
fn best_entropy_offset(img: &RgbImage, horizontal: bool, win: usize) -> usize {
    let (w, h) = img.dimensions();
    let len = if horizontal { w as usize } else { h as usize };
    if win >= len {
        return 0;
    }

    // One histogram per line along the slack axis
    let mut lines = vec![[0u32; ENTROPY_BINS]; len];
    for (x, y, px) in img.enumerate_pixels() {
        let bin = (luma_of(px.0) as usize * ENTROPY_BINS / 256).min(ENTROPY_BINS - 1);
        let idx = if horizontal { x as usize } else { y as usize };
        lines[idx][bin] += 1;
    }

    let mut window = [0u32; ENTROPY_BINS];
    for line in &lines[..win] {
        add_hist(&mut window, line);
    }

    let center = (len - win) as f64 / 2.0;
    let mut best = 0usize;
    let mut best_score = entropy(&window);
    for start in 1..=(len - win) {
        sub_hist(&mut window, &lines[start - 1]);
        add_hist(&mut window, &lines[start + win - 1]);
        let score = entropy(&window);
        let closer = (start as f64 - center).abs() < (best as f64 - center).abs();
        if score > best_score + 1e-9 || ((score - best_score).abs() <= 1e-9 && closer) {
            best = start;
            best_score = score;
        }
    }
    best
}

fn add_hist(acc: &mut [u32; ENTROPY_BINS], line: &[u32; ENTROPY_BINS]) {
    for (a, l) in acc.iter_mut().zip(line) {
        *a += l;
    }
}

fn sub_hist(acc: &mut [u32; ENTROPY_BINS], line: &[u32; ENTROPY_BINS]) {
    for (a, l) in acc.iter_mut().zip(line) {
        *a -= l;
    }
}

/// Shannon entropy in bits.
fn entropy(hist: &[u32; ENTROPY_BINS]) -> f64 {
    let total: u32 = hist.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    hist.iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
