//! High-level facade for the `slot-inspect-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates (`core`, `features`, `eval`),
//! - the [`Engine`]: registration of a test image onto the reference, then
//!   per-slot evaluation and aggregation into an [`InspectionReport`],
//! - JSON model/config/report files and `image` crate helpers ([`io`]).
//!
//! ## Quickstart
//!
//! ```no_run
//! use slot_inspect::{io, Engine, EngineConfig, ModelConfig};
//! use slot_inspect::core::Budget;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = ModelConfig::load_json("model.json")?.load_model()?;
//! let test = io::load_color_image("test.png")?;
//! let engine = Engine::new(EngineConfig::default())?;
//! let report = engine.inspect_model(&model, &test.view(), &Budget::unlimited())?;
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `slot_inspect::core`: image buffers, rectangles, homographies, budget.
//! - `slot_inspect::features`: ORB features, matching, registration, cache.
//! - `slot_inspect::eval`: slots, scoring methods, predictor trait.

pub use slot_inspect_core as core;
pub use slot_inspect_eval as eval;
pub use slot_inspect_features as features;

pub use slot_inspect_core::{Budget, CancelToken, Homography, Rect};
pub use slot_inspect_eval::{
    DetectionMethod, InspectionResult, MatchMetric, Prediction, Predictor, Slot, TemplateAsset,
};
pub use slot_inspect_features::{AlignmentError, Registration};

mod aggregate;
mod config;
mod engine;
pub mod io;
mod model;

pub use aggregate::{aggregate, Summary};
pub use config::{ConfigError, EngineConfig};
pub use engine::{inspect, Engine, InspectError, InspectionReport};
pub use io::{IoError, ModelConfig};
pub use model::{InspectionModel, ReferenceImage};
