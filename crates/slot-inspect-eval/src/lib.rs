//! Per-slot verification for assembly inspection.
//!
//! A [`Slot`] names a rectangle in reference coordinates and a
//! [`DetectionMethod`]. [`SlotEvaluator::evaluate`] projects the rectangle
//! into the test image through an optional homography, crops the region,
//! scores it and applies the pass rule `score >= ok_threshold / 100`.
//!
//! Methods:
//! - template matching over up to three template scales,
//! - hue–saturation histogram composite,
//! - Canny contour composite,
//! - SSIM / MAD / histogram-correlation comparison,
//! - an injected [`Predictor`], falling back to template matching.

mod asset;
mod edges;
mod error;
mod evaluator;
pub mod methods;
mod predictor;
mod result;
mod slot;

pub use asset::TemplateAsset;
pub use edges::{canny, edge_contours, external_contours, sobel, Contour, Gradients};
pub use error::{AssetError, ClassifierError, EvalError, GeometryError, MethodError, SlotError};
pub use evaluator::{decide, EvalParams, SlotEvaluator};
pub use methods::MethodScore;
pub use predictor::{Prediction, Predictor, LABEL_OK};
pub use result::InspectionResult;
pub use slot::{validate_slots, ClassifierRef, DetectionMethod, MatchMetric, Slot};
