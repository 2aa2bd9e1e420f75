use slot_inspect_core::Rect;
use std::path::PathBuf;

/// The slot region cannot be evaluated in the test image.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum GeometryError {
    #[error("region {rect:?} lies outside the {width}x{height} test image")]
    OutOfBounds {
        rect: Rect,
        width: usize,
        height: usize,
    },
    #[error("region has {pixels} pixels, fewer than the minimum {min}")]
    TooSmall { pixels: usize, min: usize },
}

/// A template asset could not be produced.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum AssetError {
    #[error("slot has no template configured")]
    NotConfigured,
    #[error("template file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read template {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    #[error("failed to decode template: {0}")]
    Decode(String),
    #[error("template pixel buffer is {got} bytes, expected {expected}")]
    InvalidPixels { expected: usize, got: usize },
    #[error("template is empty")]
    Empty,
}

/// Failure of an injected predictor. Always recovered by falling back to
/// template matching.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ClassifierError {
    #[error("no predictor registered for slot {slot_id}")]
    NotRegistered { slot_id: u32 },
    #[error("failed to load classifier model: {0}")]
    Load(String),
    #[error("prediction failed: {0}")]
    Predict(String),
    #[error("predictor returned non-finite confidence")]
    NonFiniteConfidence,
}

/// A scoring method could not produce a number.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum MethodError {
    #[error("no candidate scale fits the {roi_w}x{roi_h} region")]
    NoValidScale { roi_w: usize, roi_h: usize },
    #[error("non-finite score")]
    NonFinite,
}

/// Slot definition rejected at model construction time.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum SlotError {
    #[error("slot {id}: duplicate id")]
    DuplicateId { id: u32 },
    #[error("slot {id}: rectangle {rect:?} has non-positive extent")]
    EmptyRect { id: u32, rect: Rect },
    #[error("slot {id}: rectangle {rect:?} exceeds the {width}x{height} reference image")]
    OutsideReference {
        id: u32,
        rect: Rect,
        width: usize,
        height: usize,
    },
    #[error("slot {id}: {field} = {value} outside [{min}, {max}]")]
    OutOfRange {
        id: u32,
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}

/// Any per-slot failure; rendered into the slot's diagnostics.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum EvalError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Method(#[from] MethodError),
}
