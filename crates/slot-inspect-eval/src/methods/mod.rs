//! Scoring strategies. Each returns a score in `[0, 1]` plus notes for the
//! slot diagnostics.

pub mod classifier;
pub mod comparison;
pub mod contour;
pub mod histogram;
pub mod template;

/// Output of one scoring method.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MethodScore {
    pub score: f32,
    /// Best template scale, template matching only.
    pub scale: Option<f32>,
    pub notes: Vec<String>,
}

impl MethodScore {
    pub(crate) fn new(score: f32) -> Self {
        Self {
            score: clamp01(score),
            scale: None,
            notes: Vec::new(),
        }
    }

    pub(crate) fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
#[inline]
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
