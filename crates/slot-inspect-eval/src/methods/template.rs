//! Multi-scale sliding-window template matching.

use super::{clamp01, MethodScore};
use crate::{MatchMetric, MethodError};
use slot_inspect_core::{resize_gray, GrayImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

const FLAT_EPS: f64 = 1e-6;

/// Template scales tried for a given tolerance: `[1 - tol, 1, 1 + tol]`,
/// or just `[1]` when the tolerance is zero.
pub fn candidate_scales(tolerance: f32) -> Vec<f32> {
    if tolerance > 0.0 {
        vec![1.0 - tolerance, 1.0, 1.0 + tolerance]
    } else {
        vec![1.0]
    }
}

/// Summed-area tables of intensity and squared intensity.
struct Integral {
    stride: usize,
    sum: Vec<f64>,
    sq: Vec<f64>,
}

impl Integral {
    fn new(img: &GrayImageView<'_>) -> Self {
        let stride = img.width + 1;
        let mut sum = vec![0.0; stride * (img.height + 1)];
        let mut sq = vec![0.0; stride * (img.height + 1)];
        for y in 0..img.height {
            let mut rs = 0.0;
            let mut rq = 0.0;
            for x in 0..img.width {
                let v = img.data[y * img.width + x] as f64;
                rs += v;
                rq += v * v;
                sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + rs;
                sq[(y + 1) * stride + x + 1] = sq[y * stride + x + 1] + rq;
            }
        }
        Self { stride, sum, sq }
    }

    #[inline]
    fn window(&self, table: &[f64], x: usize, y: usize, w: usize, h: usize) -> f64 {
        let s = self.stride;
        table[(y + h) * s + x + w] - table[y * s + x + w] - table[(y + h) * s + x] + table[y * s + x]
    }
}

/// Best similarity of `templ` over all placements inside `img`, with the
/// position of the best placement. `None` if the template does not fit.
pub fn match_template(
    img: &GrayImageView<'_>,
    templ: &GrayImageView<'_>,
    metric: MatchMetric,
) -> Option<(f32, (usize, usize))> {
    let (tw, th) = (templ.width, templ.height);
    if tw == 0 || th == 0 || tw > img.width || th > img.height {
        return None;
    }
    let n = (tw * th) as f64;
    let t_sum: f64 = templ.data.iter().map(|&v| v as f64).sum();
    let t_sq: f64 = templ.data.iter().map(|&v| (v as f64) * (v as f64)).sum();
    let t_var = t_sq - t_sum * t_sum / n;
    let integral = Integral::new(img);

    let mut best: Option<(f32, (usize, usize))> = None;
    for y in 0..=img.height - th {
        for x in 0..=img.width - tw {
            let mut cross = 0.0f64;
            for ty in 0..th {
                let row = &img.data[(y + ty) * img.width + x..(y + ty) * img.width + x + tw];
                let trow = &templ.data[ty * tw..(ty + 1) * tw];
                cross += row
                    .iter()
                    .zip(trow)
                    .map(|(&a, &b)| a as u32 * b as u32)
                    .sum::<u32>() as f64;
            }
            let i_sum = integral.window(&integral.sum, x, y, tw, th);
            let i_sq = integral.window(&integral.sq, x, y, tw, th);

            let score = match metric {
                MatchMetric::CcoeffNormed => {
                    let i_var = i_sq - i_sum * i_sum / n;
                    let flat_i = i_var <= FLAT_EPS * n;
                    let flat_t = t_var <= FLAT_EPS * n;
                    match (flat_i, flat_t) {
                        (true, true) => 1.0,
                        (true, false) | (false, true) => 0.0,
                        _ => (cross - i_sum * t_sum / n) / (i_var * t_var).sqrt(),
                    }
                }
                MatchMetric::CcorrNormed => {
                    let den = (i_sq * t_sq).sqrt();
                    if den <= FLAT_EPS {
                        if i_sq <= FLAT_EPS && t_sq <= FLAT_EPS {
                            1.0
                        } else {
                            0.0
                        }
                    } else {
                        cross / den
                    }
                }
                MatchMetric::SqdiffNormed => {
                    let den = (i_sq * t_sq).sqrt();
                    let d = if den <= FLAT_EPS {
                        if i_sq <= FLAT_EPS && t_sq <= FLAT_EPS {
                            0.0
                        } else {
                            1.0
                        }
                    } else {
                        (i_sq - 2.0 * cross + t_sq) / den
                    };
                    1.0 - d
                }
            } as f32;

            if !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(b, _)| score > b) {
                best = Some((score, (x, y)));
            }
        }
    }
    best
}

/// Try every candidate scale of `templ` against `roi` and keep the best.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "trace", skip(roi, templ), fields(roi_w = roi.width, roi_h = roi.height))
)]
pub fn score(
    roi: &GrayImageView<'_>,
    templ: &GrayImageView<'_>,
    scale_tolerance: f32,
    metric: MatchMetric,
) -> Result<MethodScore, MethodError> {
    let mut best: Option<(f32, f32)> = None;
    let mut tried = 0usize;
    for s in candidate_scales(scale_tolerance) {
        let w = (templ.width as f32 * s).round() as usize;
        let h = (templ.height as f32 * s).round() as usize;
        if w < 1 || h < 1 || w > roi.width || h > roi.height {
            log::trace!("template scale {s:.3} ({w}x{h}) skipped");
            continue;
        }
        tried += 1;
        let scaled = resize_gray(templ, w, h);
        if let Some((v, _)) = match_template(roi, &scaled.view(), metric) {
            if best.map_or(true, |(b, _)| v > b) {
                best = Some((v, s));
            }
        }
    }

    let (value, scale) = best.ok_or(MethodError::NoValidScale {
        roi_w: roi.width,
        roi_h: roi.height,
    })?;
    let mut out = MethodScore::new(clamp01(value))
        .note(format!("template match {value:.3} at scale {scale:.2} ({tried} scales)"));
    out.scale = Some(scale);
    Ok(out)
}
