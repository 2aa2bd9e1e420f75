//! The inspection engine: registration once, then every slot.

use crate::{aggregate, ConfigError, EngineConfig, InspectionModel, ReferenceImage, Summary};
use serde::{Deserialize, Serialize};
use slot_inspect_core::{Budget, ColorImageView};
use slot_inspect_eval::{
    validate_slots, ClassifierError, InspectionResult, Predictor, Slot, SlotEvaluator,
};
use slot_inspect_features::{CacheStats, Registrar, Registration};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors reported before any slot is evaluated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InspectError {
    #[error("reference image is empty")]
    EmptyReference,
    #[error("test image is empty")]
    EmptyTest,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Full outcome of one inspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub registration: Registration,
    pub results: Vec<InspectionResult>,
    pub summary: Summary,
    pub elapsed_ms: f64,
}

impl InspectionReport {
    #[inline]
    pub fn passed(&self) -> bool {
        self.summary.passed
    }

    pub fn result(&self, slot_id: u32) -> Option<&InspectionResult> {
        self.results.iter().find(|r| r.slot_id == slot_id)
    }
}

/// Owns the configuration, the registrar (and with it the reference
/// feature cache), the slot evaluator and the registered predictors.
pub struct Engine {
    config: EngineConfig,
    registrar: Registrar,
    evaluator: SlotEvaluator,
    predictors: HashMap<u32, Box<dyn Predictor>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<_> = self.predictors.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registrar", &self.registrar)
            .field("predictors", &ids)
            .finish()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            registrar: Registrar::new(config.registration_params(), config.cache_capacity),
            evaluator: SlotEvaluator::new(config.eval_params()),
            predictors: HashMap::new(),
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.registrar.cache().stats()
    }

    /// Register the classifier used by slot `slot_id`, loading weights from
    /// `model_path` when given. Replaces any previous predictor for the slot.
    pub fn register_predictor(
        &mut self,
        slot_id: u32,
        mut predictor: Box<dyn Predictor>,
        model_path: Option<&Path>,
    ) -> Result<(), ClassifierError> {
        if let Some(path) = model_path {
            predictor.load(path)?;
        }
        log::debug!("predictor registered for slot {slot_id}");
        self.predictors.insert(slot_id, predictor);
        Ok(())
    }

    pub fn remove_predictor(&mut self, slot_id: u32) -> bool {
        self.predictors.remove(&slot_id).is_some()
    }

    /// Register `test` onto `reference`, reusing cached reference features.
    pub fn align(
        &self,
        reference: &ReferenceImage,
        test: &ColorImageView<'_>,
        budget: &Budget,
    ) -> Registration {
        let test_gray = test.to_gray();
        self.registrar.align_keyed(
            reference.fingerprint(),
            &reference.gray(),
            &test_gray.view(),
            budget,
        )
    }

    pub fn inspect(
        &self,
        reference: &ReferenceImage,
        slots: &[Slot],
        test: &ColorImageView<'_>,
    ) -> Result<InspectionReport, InspectError> {
        self.inspect_with_budget(reference, slots, test, &Budget::unlimited())
    }

    pub fn inspect_model(
        &self,
        model: &InspectionModel,
        test: &ColorImageView<'_>,
        budget: &Budget,
    ) -> Result<InspectionReport, InspectError> {
        self.inspect_with_budget(model.reference(), model.slots(), test, budget)
    }

    /// Inspect every slot of `test`. Slots are validated against the
    /// reference first. An exhausted budget fails registration only; slots
    /// are then evaluated in reference coordinates.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "info",
            skip_all,
            fields(slots = slots.len(), width = test.width, height = test.height)
        )
    )]
    pub fn inspect_with_budget(
        &self,
        reference: &ReferenceImage,
        slots: &[Slot],
        test: &ColorImageView<'_>,
        budget: &Budget,
    ) -> Result<InspectionReport, InspectError> {
        if reference.is_empty() {
            return Err(InspectError::EmptyReference);
        }
        if test.is_empty() {
            return Err(InspectError::EmptyTest);
        }
        validate_slots(slots, Some((reference.width(), reference.height())))
            .map_err(ConfigError::from)?;
        let started = Instant::now();

        let registration = self.align(reference, test, budget);
        let homography = registration.homography.as_ref();
        let results: Vec<InspectionResult> = slots
            .iter()
            .map(|slot| {
                let predictor = self.predictors.get(&slot.id).map(|p| &**p);
                self.evaluator.evaluate(test, slot, homography, predictor)
            })
            .collect();
        let summary = aggregate(&results);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        log::info!("inspection {summary} in {elapsed_ms:.1} ms");

        Ok(InspectionReport {
            registration,
            results,
            summary,
            elapsed_ms,
        })
    }
}

/// One-shot inspection with a fresh engine.
pub fn inspect(
    reference: &ReferenceImage,
    slots: &[Slot],
    test: &ColorImageView<'_>,
    config: EngineConfig,
) -> Result<InspectionReport, InspectError> {
    Engine::new(config)?.inspect(reference, slots, test)
}
