//! Hue–saturation histogram composite.
//!
//! The score mixes normalized Shannon entropy, normalized standard deviation
//! of the bin probabilities and the peak probability:
//! `0.5·entropy + 0.3·std + 0.2·peak`.

use super::{clamp01, MethodScore};
use slot_inspect_core::ColorImageView;

pub const HUE_BINS: usize = 50;
pub const SAT_BINS: usize = 60;

/// 8-bit HSV in the usual 8-bit convention: hue in `[0, 180)`, saturation
/// and value in `[0, 255]`.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let v = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = v - min;
    let s = if v > 0.0 { 255.0 * diff / v } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if v == rf {
        60.0 * (gf - bf) / diff
    } else if v == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    (h / 2.0, s, v)
}

/// Normalized 50×60 hue–saturation histogram (sums to 1 for non-empty input).
pub fn hs_histogram(img: &ColorImageView<'_>) -> Vec<f32> {
    let mut hist = vec![0f32; HUE_BINS * SAT_BINS];
    let n = img.width * img.height;
    if n == 0 {
        return hist;
    }
    for px in img.data.chunks_exact(3) {
        let (h, s, _) = rgb_to_hsv(px[0], px[1], px[2]);
        let hb = ((h * HUE_BINS as f32 / 180.0) as usize).min(HUE_BINS - 1);
        let sb = ((s * SAT_BINS as f32 / 256.0) as usize).min(SAT_BINS - 1);
        hist[hb * SAT_BINS + sb] += 1.0;
    }
    let inv = 1.0 / n as f32;
    hist.iter_mut().for_each(|v| *v *= inv);
    hist
}

/// The three normalized histogram statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistogramStats {
    pub entropy: f32,
    pub std: f32,
    pub peak: f32,
}

pub fn histogram_stats(prob: &[f32]) -> HistogramStats {
    let n = prob.len();
    if n < 2 {
        return HistogramStats {
            entropy: 0.0,
            std: 0.0,
            peak: prob.first().copied().unwrap_or(0.0),
        };
    }
    let entropy: f64 = prob
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| -(p as f64) * (p as f64).log2())
        .sum();
    let mean = 1.0 / n as f64;
    let var = prob
        .iter()
        .map(|&p| (p as f64 - mean).powi(2))
        .sum::<f64>()
        / n as f64;
    let std_max = ((n - 1) as f64).sqrt() / n as f64;
    let peak = prob.iter().copied().fold(0.0f32, f32::max);

    HistogramStats {
        entropy: clamp01((entropy / (n as f64).log2()) as f32),
        std: clamp01((var.sqrt() / std_max) as f32),
        peak: clamp01(peak),
    }
}

pub fn score(roi: &ColorImageView<'_>) -> MethodScore {
    let stats = histogram_stats(&hs_histogram(roi));
    let s = 0.5 * stats.entropy + 0.3 * stats.std + 0.2 * stats.peak;
    MethodScore::new(s).note(format!(
        "histogram entropy {:.3}, std {:.3}, peak {:.3}",
        stats.entropy, stats.std, stats.peak
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use slot_inspect_core::ColorImage;

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0.0, 255.0, 255.0));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60.0, 255.0, 255.0));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120.0, 255.0, 255.0));
        assert_eq!(rgb_to_hsv(90, 90, 90), (0.0, 0.0, 90.0));
    }

    #[test]
    fn uniform_color_scores_half() {
        let img = ColorImage {
            width: 8,
            height: 8,
            data: [10u8, 200, 30].repeat(64),
        };
        let stats = histogram_stats(&hs_histogram(&img.view()));
        assert_relative_eq!(stats.entropy, 0.0);
        assert_relative_eq!(stats.std, 1.0, epsilon = 1e-5);
        assert_relative_eq!(stats.peak, 1.0);
        assert_relative_eq!(score(&img.view()).score, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn two_colors_split_mass() {
        let mut data = [255u8, 0, 0].repeat(50);
        data.extend([0u8, 0, 255].repeat(50));
        let img = ColorImage {
            width: 10,
            height: 10,
            data,
        };
        let stats = histogram_stats(&hs_histogram(&img.view()));
        assert_relative_eq!(stats.peak, 0.5);
        assert_relative_eq!(stats.entropy, 1.0 / (3000f32).log2(), epsilon = 1e-5);
        let s = score(&img.view()).score;
        assert!(s > 0.0 && s < 1.0);
    }
}
