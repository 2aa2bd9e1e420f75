//! Slot definitions: an inspection region plus how to score it.

use crate::{SlotError, TemplateAsset};
use serde::{Deserialize, Serialize};
use slot_inspect_core::Rect;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Scoring strategy for a slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    #[default]
    TemplateMatching,
    HistogramAnalysis,
    ContourAnalysis,
    ImageComparison,
    ExternalClassifier,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectionMethod::TemplateMatching => "template_matching",
            DetectionMethod::HistogramAnalysis => "histogram_analysis",
            DetectionMethod::ContourAnalysis => "contour_analysis",
            DetectionMethod::ImageComparison => "image_comparison",
            DetectionMethod::ExternalClassifier => "external_classifier",
        })
    }
}

/// Sliding-window similarity used by template matching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMetric {
    /// Zero-mean normalized cross-correlation.
    #[default]
    CcoeffNormed,
    /// Normalized cross-correlation without mean removal.
    CcorrNormed,
    /// Normalized squared difference, reported as `1 - d`.
    SqdiffNormed,
}

/// Reference to an external classifier model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRef {
    pub model_path: PathBuf,
}

/// One inspection region of a model, in reference-image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slot {
    pub id: u32,
    pub name: Option<String>,
    pub rect: Rect,
    pub detection_method: DetectionMethod,
    /// Fraction in `[0, 1]`; reported only.
    pub detection_threshold: f32,
    /// Pass threshold as a percentage in `[0, 100]`.
    pub ok_threshold: f32,
    /// Fraction in `[0, 1]`; reported only.
    pub correlation_threshold: Option<f32>,
    pub template: Option<TemplateAsset>,
    /// Relative scale search range for template matching, in `[0, 1)`.
    pub scale_tolerance: f32,
    pub match_metric: MatchMetric,
    /// Sub-regions to ignore. Carried and reported, not masked.
    pub exclusion_areas: Vec<Rect>,
    pub use_ml: bool,
    pub classifier: Option<ClassifierRef>,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            id: 0,
            name: None,
            rect: Rect::new(0, 0, 0, 0),
            detection_method: DetectionMethod::TemplateMatching,
            detection_threshold: 0.5,
            ok_threshold: 70.0,
            correlation_threshold: None,
            template: None,
            scale_tolerance: 0.0,
            match_metric: MatchMetric::CcoeffNormed,
            exclusion_areas: Vec::new(),
            use_ml: false,
            classifier: None,
        }
    }
}

impl Slot {
    pub fn new(id: u32, rect: Rect) -> Self {
        Self {
            id,
            rect,
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: DetectionMethod) -> Self {
        self.detection_method = method;
        self
    }

    pub fn with_template(mut self, template: TemplateAsset) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_ok_threshold(mut self, percent: f32) -> Self {
        self.ok_threshold = percent;
        self
    }

    pub fn with_scale_tolerance(mut self, tol: f32) -> Self {
        self.scale_tolerance = tol;
        self
    }

    pub fn with_metric(mut self, metric: MatchMetric) -> Self {
        self.match_metric = metric;
        self
    }

    pub fn with_classifier(mut self, model_path: impl Into<PathBuf>) -> Self {
        self.use_ml = true;
        self.classifier = Some(ClassifierRef {
            model_path: model_path.into(),
        });
        self
    }

    /// Method actually dispatched: `use_ml` routes to the classifier.
    pub fn effective_method(&self) -> DetectionMethod {
        if self.use_ml {
            DetectionMethod::ExternalClassifier
        } else {
            self.detection_method
        }
    }

    /// Check thresholds and, when the reference size is known, that the
    /// rectangle lies inside it.
    pub fn validate(&self, reference_size: Option<(usize, usize)>) -> Result<(), SlotError> {
        let id = self.id;
        if self.rect.w <= 0 || self.rect.h <= 0 {
            return Err(SlotError::EmptyRect {
                id,
                rect: self.rect,
            });
        }
        if let Some((width, height)) = reference_size {
            if !self.rect.is_within(width, height) {
                return Err(SlotError::OutsideReference {
                    id,
                    rect: self.rect,
                    width,
                    height,
                });
            }
        }

        let range = |field: &'static str, value: f32, min: f32, max: f32| {
            if value.is_finite() && value >= min && value <= max {
                Ok(())
            } else {
                Err(SlotError::OutOfRange {
                    id,
                    field,
                    value,
                    min,
                    max,
                })
            }
        };
        range("ok_threshold", self.ok_threshold, 0.0, 100.0)?;
        range("detection_threshold", self.detection_threshold, 0.0, 1.0)?;
        if let Some(c) = self.correlation_threshold {
            range("correlation_threshold", c, 0.0, 1.0)?;
        }
        range("scale_tolerance", self.scale_tolerance, 0.0, 0.99)?;
        Ok(())
    }
}

/// Validate every slot and reject duplicate ids.
pub fn validate_slots(slots: &[Slot], reference_size: Option<(usize, usize)>) -> Result<(), SlotError> {
    let mut seen = HashSet::with_capacity(slots.len());
    for slot in slots {
        if !seen.insert(slot.id) {
            return Err(SlotError::DuplicateId { id: slot.id });
        }
        slot.validate(reference_size)?;
    }
    Ok(())
}
