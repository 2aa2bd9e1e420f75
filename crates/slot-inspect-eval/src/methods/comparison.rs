//! Structural comparison against a template resized to the region size.

use super::{clamp01, MethodScore};
use slot_inspect_core::{resize_gray, GrayImageView};

pub const SSIM_WINDOW: usize = 7;
const C1: f64 = (0.01 * 255.0) * (0.01 * 255.0);
const C2: f64 = (0.03 * 255.0) * (0.03 * 255.0);

/// Mean SSIM over all 7×7 windows. `None` if either side is smaller than a
/// window or the sizes differ.
pub fn ssim(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> Option<f32> {
    let (w, h) = (a.width, a.height);
    if (w, h) != (b.width, b.height) || w < SSIM_WINDOW || h < SSIM_WINDOW {
        return None;
    }
    // five summed-area tables: a, b, a², b², ab
    let stride = w + 1;
    let mut tables = vec![[0f64; 5]; stride * (h + 1)];
    for y in 0..h {
        let mut row = [0f64; 5];
        for x in 0..w {
            let va = a.data[y * w + x] as f64;
            let vb = b.data[y * w + x] as f64;
            let v = [va, vb, va * va, vb * vb, va * vb];
            for k in 0..5 {
                row[k] += v[k];
                tables[(y + 1) * stride + x + 1][k] = tables[y * stride + x + 1][k] + row[k];
            }
        }
    }

    let n = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let mut total = 0.0;
    let mut count = 0usize;
    for y in 0..=h - SSIM_WINDOW {
        for x in 0..=w - SSIM_WINDOW {
            let (x1, y1) = (x + SSIM_WINDOW, y + SSIM_WINDOW);
            let mut s = [0f64; 5];
            for (k, sk) in s.iter_mut().enumerate() {
                *sk = tables[y1 * stride + x1][k] - tables[y * stride + x1][k]
                    - tables[y1 * stride + x][k]
                    + tables[y * stride + x][k];
            }
            let (ma, mb) = (s[0] / n, s[1] / n);
            let va = (s[2] / n - ma * ma).max(0.0);
            let vb = (s[3] / n - mb * mb).max(0.0);
            let cov = s[4] / n - ma * mb;
            total += ((2.0 * ma * mb + C1) * (2.0 * cov + C2))
                / ((ma * ma + mb * mb + C1) * (va + vb + C2));
            count += 1;
        }
    }
    Some((total / count as f64) as f32)
}

pub fn mean_abs_diff(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> f32 {
    if a.data.is_empty() {
        return 0.0;
    }
    let sum: u64 = a
        .data
        .iter()
        .zip(b.data)
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    sum as f32 / a.data.len() as f32
}

pub fn mean_sq_error(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> f32 {
    if a.data.is_empty() {
        return 0.0;
    }
    let sum: u64 = a
        .data
        .iter()
        .zip(b.data)
        .map(|(&x, &y)| (x.abs_diff(y) as u64).pow(2))
        .sum();
    sum as f32 / a.data.len() as f32
}

/// Pearson correlation of the 256-bin intensity histograms, in `[-1, 1]`.
/// Two constant histograms correlate as 1 when identical.
pub fn histogram_correlation(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> f32 {
    let hist = |img: &GrayImageView<'_>| {
        let mut h = [0f64; 256];
        img.data.iter().for_each(|&v| h[v as usize] += 1.0);
        h
    };
    let (ha, hb) = (hist(a), hist(b));
    let ma = ha.iter().sum::<f64>() / 256.0;
    let mb = hb.iter().sum::<f64>() / 256.0;
    let (mut num, mut da, mut db) = (0.0, 0.0, 0.0);
    for (x, y) in ha.iter().zip(hb.iter()) {
        num += (x - ma) * (y - mb);
        da += (x - ma).powi(2);
        db += (y - mb).powi(2);
    }
    let den = (da * db).sqrt();
    if den <= f64::EPSILON {
        return if ha == hb { 1.0 } else { 0.0 };
    }
    (num / den) as f32
}

/// `0.5·SSIM + 0.3·(1 − MAD/255) + 0.2·max(0, hist_corr)`. SSIM falls back
/// to `1 − MSE/255²` when the region is smaller than a window.
pub fn score(roi: &GrayImageView<'_>, templ: &GrayImageView<'_>) -> MethodScore {
    let resized = resize_gray(templ, roi.width, roi.height);
    let t = resized.view();

    let (structural, label) = match ssim(roi, &t) {
        Some(v) => (v, "ssim"),
        None => (1.0 - mean_sq_error(roi, &t) / (255.0 * 255.0), "mse"),
    };
    let structural = clamp01(structural);
    let mad = clamp01(1.0 - mean_abs_diff(roi, &t) / 255.0);
    let corr = clamp01(histogram_correlation(roi, &t));

    MethodScore::new(0.5 * structural + 0.3 * mad + 0.2 * corr).note(format!(
        "{label} {structural:.3}, 1-mad {mad:.3}, hist corr {corr:.3}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use slot_inspect_core::GrayImage;

    fn noise(w: usize, h: usize, seed: u32) -> GrayImage {
        let mut s = seed;
        let data = (0..w * h)
            .map(|_| {
                s = s.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (s >> 16) as u8
            })
            .collect();
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn identical_images_score_one() {
        let img = noise(20, 16, 1);
        assert_relative_eq!(ssim(&img.view(), &img.view()).expect("ssim"), 1.0, epsilon = 1e-6);
        let s = score(&img.view(), &img.view());
        assert_relative_eq!(s.score, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn small_region_uses_mse_fallback() {
        let a = GrayImage {
            width: 4,
            height: 4,
            data: vec![100; 16],
        };
        assert!(ssim(&a.view(), &a.view()).is_none());
        let s = score(&a.view(), &a.view());
        assert!(s.notes[0].starts_with("mse 1.000"), "{:?}", s.notes);
        assert_relative_eq!(s.score, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn different_images_score_lower_but_in_range() {
        let a = noise(24, 24, 3);
        let b = noise(24, 24, 99);
        let s = score(&a.view(), &b.view()).score;
        assert!((0.0..0.9).contains(&s), "{s}");
    }

    #[test]
    fn histogram_correlation_of_constant_images() {
        let a = GrayImage {
            width: 2,
            height: 2,
            data: vec![7; 4],
        };
        let b = GrayImage {
            width: 2,
            height: 2,
            data: vec![9; 4],
        };
        // both histograms are single spikes, correlation defined on bins
        assert_relative_eq!(histogram_correlation(&a.view(), &a.view()), 1.0, epsilon = 1e-6);
        assert!(histogram_correlation(&a.view(), &b.view()) < 0.1);
    }
}
