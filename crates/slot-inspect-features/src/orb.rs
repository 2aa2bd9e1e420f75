//! Oriented FAST + steered BRIEF features over a scale pyramid.

use crate::descriptor::{Descriptor, FeatureSet, Keypoint};
use crate::fast::{detect_fast, suppress_non_maxima};
use crate::pyramid::build_pyramid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use slot_inspect_core::{gaussian_blur_5x5, Budget, BudgetExceeded, GrayImageView};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Radius of the intensity-centroid disc used for orientation.
const HALF_PATCH: i32 = 15;
/// Maximum |offset| of a BRIEF test point before steering.
const PATTERN_RADIUS: i32 = 13;
/// Keypoints closer than this to a level border are dropped; covers both the
/// orientation disc and any rotation of the pattern.
pub const EDGE_BORDER: usize = 19;
const PATTERN_SEED: u64 = 0x0b5e_55ed;

/// Extraction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbParams {
    /// Total keypoint budget over all pyramid levels.
    pub n_features: usize,
    /// Downscale ratio between consecutive levels (> 1).
    pub scale_factor: f32,
    /// Number of pyramid levels including the full-resolution one.
    pub n_levels: usize,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            n_features: 5000,
            scale_factor: 1.2,
            n_levels: 8,
            fast_threshold: 20,
        }
    }
}

/// ORB-style extractor. Stateless apart from the fixed sampling pattern.
#[derive(Clone, Debug)]
pub struct OrbExtractor {
    params: OrbParams,
    pattern: Vec<[(i8, i8); 2]>,
}

impl OrbExtractor {
    pub fn new(params: OrbParams) -> Self {
        Self {
            params,
            pattern: brief_pattern(),
        }
    }

    #[inline]
    pub fn params(&self) -> &OrbParams {
        &self.params
    }

    /// Extract keypoints and descriptors in full-resolution coordinates.
    ///
    /// The budget is polled once per pyramid level.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, img, budget), fields(w = img.width, h = img.height))
    )]
    pub fn extract(
        &self,
        img: &GrayImageView<'_>,
        budget: &Budget,
    ) -> Result<FeatureSet, BudgetExceeded> {
        let p = &self.params;
        let mut set = FeatureSet::default();
        if img.is_empty() || p.n_features == 0 || p.n_levels == 0 {
            return Ok(set);
        }

        let levels = build_pyramid(img, p.n_levels, p.scale_factor, 2 * EDGE_BORDER + 1);
        let quotas = level_quotas(p.n_features, levels.len(), p.scale_factor);

        for (octave, (level, quota)) in levels.iter().zip(quotas).enumerate() {
            budget.check()?;
            if quota == 0 {
                continue;
            }
            let view = level.image.view();
            let corners = detect_fast(&view, p.fast_threshold, EDGE_BORDER);
            let mut corners = suppress_non_maxima(corners, 3);
            corners.truncate(quota);

            let smooth = gaussian_blur_5x5(&view);
            let smooth = smooth.view();
            for c in corners {
                let angle = intensity_centroid_angle(&view, c.x, c.y);
                let descriptor = self.describe(&smooth, c.x, c.y, angle);
                set.keypoints.push(Keypoint {
                    x: (c.x as f32 + 0.5) * level.scale_x - 0.5,
                    y: (c.y as f32 + 0.5) * level.scale_y - 0.5,
                    angle,
                    octave: octave as u8,
                    response: c.score,
                });
                set.descriptors.push(descriptor);
            }
        }

        log::debug!(
            "extracted {} features over {} levels ({}x{})",
            set.len(),
            levels.len(),
            img.width,
            img.height
        );
        Ok(set)
    }

    fn describe(&self, img: &GrayImageView<'_>, x: usize, y: usize, angle: f32) -> Descriptor {
        let (s, c) = angle.sin_cos();
        let at = |dx: i8, dy: i8| {
            let (dx, dy) = (dx as f32, dy as f32);
            let rx = (c * dx - s * dy).round() as isize;
            let ry = (s * dx + c * dy).round() as isize;
            let px = (x as isize + rx) as usize;
            let py = (y as isize + ry) as usize;
            img.data[py * img.width + px]
        };

        let mut words = [0u64; 4];
        for (bit, &[(x1, y1), (x2, y2)]) in self.pattern.iter().enumerate() {
            if at(x1, y1) < at(x2, y2) {
                words[bit / 64] |= 1 << (bit % 64);
            }
        }
        Descriptor(words)
    }
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self::new(OrbParams::default())
    }
}

/// Per-level keypoint quotas, decaying geometrically with level area.
fn level_quotas(total: usize, levels: usize, scale_factor: f32) -> Vec<usize> {
    if levels == 0 {
        return Vec::new();
    }
    let f = 1.0 / (scale_factor.max(1.0001) as f64 * scale_factor.max(1.0001) as f64);
    let first = total as f64 * (1.0 - f) / (1.0 - f.powi(levels as i32));
    let mut out: Vec<usize> = (0..levels)
        .map(|i| (first * f.powi(i as i32)).round() as usize)
        .collect();
    let assigned: usize = out[1..].iter().sum();
    out[0] = total.saturating_sub(assigned);
    out
}

/// Orientation of the intensity centroid in a disc around `(x, y)`.
fn intensity_centroid_angle(img: &GrayImageView<'_>, x: usize, y: usize) -> f32 {
    let mut m01 = 0i64;
    let mut m10 = 0i64;
    let r2 = HALF_PATCH * HALF_PATCH;
    for dy in -HALF_PATCH..=HALF_PATCH {
        let row = (y as i32 + dy) as usize * img.width;
        for dx in -HALF_PATCH..=HALF_PATCH {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let v = img.data[row + (x as i32 + dx) as usize] as i64;
            m10 += dx as i64 * v;
            m01 += dy as i64 * v;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

/// 256 point-pair tests, isotropic Gaussian around the patch center.
fn brief_pattern() -> Vec<[(i8, i8); 2]> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let sigma = PATTERN_RADIUS as f32 / 2.5;
    let mut point = || -> (i8, i8) {
        loop {
            // Box–Muller
            let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
            let u2: f32 = rng.gen_range(0.0..1.0);
            let r = (-2.0 * u1.ln()).sqrt() * sigma;
            let t = std::f32::consts::TAU * u2;
            let x = (r * t.cos()).round() as i32;
            let y = (r * t.sin()).round() as i32;
            if x * x + y * y <= PATTERN_RADIUS * PATTERN_RADIUS {
                return (x as i8, y as i8);
            }
        }
    };
    let mut pattern = Vec::with_capacity(256);
    while pattern.len() < 256 {
        let a = point();
        let b = point();
        if a != b {
            pattern.push([a, b]);
        }
    }
    pattern
}
