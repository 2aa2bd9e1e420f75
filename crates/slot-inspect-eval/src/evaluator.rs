//! Per-slot evaluation: project the slot, crop, score, decide.
//!
//! Every failure is folded into the returned [`InspectionResult`] as
//! `passed = false`, `score = 0` plus a diagnostic line.

use crate::methods::{self, MethodScore};
use crate::{
    DetectionMethod, EvalError, GeometryError, InspectionResult, Predictor, Slot, TemplateAsset,
};
use serde::{Deserialize, Serialize};
use slot_inspect_core::{transform_corners, transform_rect, ColorImage, ColorImageView, Homography, Rect};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Evaluation parameters shared by all slots.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalParams {
    /// Regions with fewer pixels are rejected.
    pub min_pixel_count: usize,
    /// Reported when a slot has no `correlation_threshold`.
    pub default_correlation_threshold: f32,
    /// Contour count that saturates the contour-count term.
    pub max_contours: usize,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            min_pixel_count: 100,
            default_correlation_threshold: 0.8,
            max_contours: 10,
        }
    }
}

/// `score >= ok_threshold / 100`, with the score clamped to `[0, 1]`.
#[inline]
pub fn decide(score: f32, ok_threshold_percent: f32) -> bool {
    methods::clamp01(score) >= ok_threshold_percent / 100.0
}

#[derive(Clone, Debug, Default)]
pub struct SlotEvaluator {
    params: EvalParams,
}

impl SlotEvaluator {
    pub fn new(params: EvalParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &EvalParams {
        &self.params
    }

    /// Evaluate `slot` in `test`. `homography` maps reference to test
    /// coordinates; without it the slot rectangle is used as-is.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(slot = slot.id, method = %slot.effective_method()))
    )]
    pub fn evaluate(
        &self,
        test: &ColorImageView<'_>,
        slot: &Slot,
        homography: Option<&Homography>,
        predictor: Option<&dyn Predictor>,
    ) -> InspectionResult {
        let mut result = InspectionResult::failed(slot);
        result.diagnostics.push(format!(
            "thresholds: ok {:.1}%, detection {:.2}, correlation {:.2}",
            slot.ok_threshold,
            slot.detection_threshold,
            slot.correlation_threshold
                .unwrap_or(self.params.default_correlation_threshold)
        ));
        if !slot.exclusion_areas.is_empty() {
            result.diagnostics.push(format!(
                "{} exclusion areas (advisory, not masked)",
                slot.exclusion_areas.len()
            ));
        }

        match self.try_evaluate(&mut result, test, slot, homography, predictor) {
            Ok(ms) => {
                result.score = methods::clamp01(ms.score);
                result.passed = decide(result.score, slot.ok_threshold);
                result.scale = ms.scale;
                result.diagnostics.extend(ms.notes);
                log::debug!(
                    "slot {} [{}]: score {:.3} -> {}",
                    slot.id,
                    result.method,
                    result.score,
                    if result.passed { "pass" } else { "fail" }
                );
            }
            Err(e) => {
                log::warn!("slot {} failed: {e}", slot.id);
                result.score = 0.0;
                result.passed = false;
                result.diagnostics.push(e.to_string());
            }
        }
        result
    }

    fn try_evaluate(
        &self,
        result: &mut InspectionResult,
        test: &ColorImageView<'_>,
        slot: &Slot,
        homography: Option<&Homography>,
        predictor: Option<&dyn Predictor>,
    ) -> Result<MethodScore, EvalError> {
        let (w, h) = (test.width, test.height);
        let out_of_bounds = |rect: Rect| GeometryError::OutOfBounds {
            rect,
            width: w,
            height: h,
        };

        let region = match homography {
            Some(hm) => {
                result.corners = transform_corners(&slot.rect, hm).map(|p| [p.x, p.y]);
                transform_rect(&slot.rect, hm, (w, h)).ok_or(out_of_bounds(slot.rect))?
            }
            None => {
                result.degraded = true;
                result
                    .diagnostics
                    .push("degraded: no homography, using reference coordinates".to_string());
                if !slot.rect.is_within(w, h) {
                    return Err(out_of_bounds(slot.rect).into());
                }
                slot.rect
            }
        };
        result.bbox = Some(region);

        let pixels = region.area().max(0) as usize;
        result.pixel_count = pixels;
        if pixels < self.params.min_pixel_count {
            return Err(GeometryError::TooSmall {
                pixels,
                min: self.params.min_pixel_count,
            }
            .into());
        }
        let roi = test.crop(region).ok_or(out_of_bounds(region))?;

        match slot.effective_method() {
            DetectionMethod::TemplateMatching => template_matching(&roi, slot),
            DetectionMethod::HistogramAnalysis => Ok(methods::histogram::score(&roi.view())),
            DetectionMethod::ContourAnalysis => {
                let gray = roi.view().to_gray();
                Ok(methods::contour::score(&gray.view(), self.params.max_contours))
            }
            DetectionMethod::ImageComparison => {
                let templ = load_template(slot)?.view().to_gray();
                let gray = roi.view().to_gray();
                Ok(methods::comparison::score(&gray.view(), &templ.view()))
            }
            DetectionMethod::ExternalClassifier => {
                match methods::classifier::score(slot.id, predictor, &roi.view()) {
                    Ok(ms) => Ok(ms),
                    Err(e) => {
                        log::warn!("slot {}: classifier failed ({e}), using template matching", slot.id);
                        result.diagnostics.push(format!(
                            "classifier failed: {e}; falling back to template matching"
                        ));
                        result.method = DetectionMethod::TemplateMatching;
                        template_matching(&roi, slot)
                    }
                }
            }
        }
    }
}

fn load_template(slot: &Slot) -> Result<ColorImage, EvalError> {
    let asset: &TemplateAsset = slot
        .template
        .as_ref()
        .ok_or(crate::AssetError::NotConfigured)?;
    Ok(asset.load()?)
}

fn template_matching(roi: &ColorImage, slot: &Slot) -> Result<MethodScore, EvalError> {
    let templ = load_template(slot)?.view().to_gray();
    let gray = roi.view().to_gray();
    Ok(methods::template::score(
        &gray.view(),
        &templ.view(),
        slot.scale_tolerance,
        slot.match_metric,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_is_inclusive_at_threshold() {
        assert!(decide(0.7, 70.0));
        assert!(!decide(0.69, 70.0));
        assert!(decide(1.5, 100.0));
        assert!(!decide(f32::NAN, 0.1));
        assert!(decide(0.0, 0.0));
    }
}
