use crate::ClassifierError;
use serde::{Deserialize, Serialize};
use slot_inspect_core::ColorImageView;
use std::path::Path;

/// Label reported by a predictor for an acceptable region.
pub const LABEL_OK: i32 = 1;

/// Classifier output for one region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: i32,
    /// Confidence of `label`, expected in `[0, 1]`.
    pub confidence: f32,
}

impl Prediction {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.label == LABEL_OK
    }
}

/// An external region classifier.
///
/// The engine never depends on a concrete model format; callers register an
/// implementation per slot.
pub trait Predictor: Send + Sync {
    /// Load model weights from `path`.
    fn load(&mut self, path: &Path) -> Result<(), ClassifierError>;

    /// Classify an RGB region.
    fn predict(&self, roi: &ColorImageView<'_>) -> Result<Prediction, ClassifierError>;
}
