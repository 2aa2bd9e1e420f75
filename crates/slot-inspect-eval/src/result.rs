use crate::{DetectionMethod, Slot};
use serde::{Deserialize, Serialize};
use slot_inspect_core::Rect;

/// Outcome of evaluating one slot against a test image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectionResult {
    pub slot_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub passed: bool,
    /// Similarity in `[0, 1]`; 0 on any failure.
    pub score: f32,
    /// Pixels in the evaluated region.
    pub pixel_count: usize,
    /// Slot corners in test-image coordinates (TL, TR, BR, BL).
    pub corners: [[f32; 2]; 4],
    /// Clipped region actually evaluated.
    pub bbox: Option<Rect>,
    /// Method that produced the score (after any fallback).
    pub method: DetectionMethod,
    /// Best template scale, template matching only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// Evaluated without a homography.
    pub degraded: bool,
    pub diagnostics: Vec<String>,
}

impl InspectionResult {
    /// A failed result for `slot`, to be filled in by the evaluator.
    pub fn failed(slot: &Slot) -> Self {
        Self {
            slot_id: slot.id,
            name: slot.name.clone(),
            passed: false,
            score: 0.0,
            pixel_count: 0,
            corners: slot.rect.corners().map(|p| [p.x, p.y]),
            bbox: None,
            method: slot.effective_method(),
            scale: None,
            degraded: false,
            diagnostics: Vec::new(),
        }
    }
}
